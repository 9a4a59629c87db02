use std::sync::Arc;

use crate::analysis::{HttpAnalyzer, TextAnalyzer};
use crate::config::{Config, StoreBackend};
use crate::errors::Result;
use crate::identity::{IdentityProvider, local::LocalIdentity};
use crate::session::SessionBridge;
use crate::store::{AccountStore, InvitationStore, SeedStore, memory::MemoryStore,
    surreal::SurrealStore};

/// Explicitly constructed collaborator handles, passed into every
/// operation. Tests swap any of them for fakes.
#[derive(Clone)]
pub struct AppState {
    pub accounts: Arc<dyn AccountStore>,
    pub invitations: Arc<dyn InvitationStore>,
    pub seeds: Arc<dyn SeedStore>,
    pub identity: Arc<dyn IdentityProvider>,
    pub analyzer: Arc<dyn TextAnalyzer>,
    pub sessions: Arc<SessionBridge>,
}

impl AppState {
    pub async fn init(config: &Config) -> Result<Self> {
        let identity: Arc<dyn IdentityProvider> =
            Arc::new(LocalIdentity::new(config.jwt_secret.clone()));
        let analyzer: Arc<dyn TextAnalyzer> = Arc::new(
            HttpAnalyzer::new(&config.analyzer)
                .map_err(crate::errors::Error::Analyzer)?,
        );

        let state = match &config.store {
            StoreBackend::Memory => {
                let store = Arc::new(MemoryStore::new());
                Self::with_backends(store.clone(), store.clone(), store, identity, analyzer)
            }
            StoreBackend::Surreal(surreal) => {
                let store = Arc::new(SurrealStore::connect(surreal).await?);
                Self::with_backends(store.clone(), store.clone(), store, identity, analyzer)
            }
        };
        Ok(state)
    }

    pub fn with_backends(
        accounts: Arc<dyn AccountStore>,
        invitations: Arc<dyn InvitationStore>,
        seeds: Arc<dyn SeedStore>,
        identity: Arc<dyn IdentityProvider>,
        analyzer: Arc<dyn TextAnalyzer>,
    ) -> Self {
        let sessions = Arc::new(SessionBridge::new(identity.clone(), accounts.clone()));
        Self {
            accounts,
            invitations,
            seeds,
            identity,
            analyzer,
            sessions,
        }
    }
}
