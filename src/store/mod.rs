use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::watch;

use crate::models::{
    account::{Account, AccountPatch},
    invitation::Invitation,
    seed::{Category, Color},
};

pub mod memory;
pub mod surreal;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("no pending invitation for {0}")]
    NoInvitation(String),
    #[error("{0} collection is not empty")]
    NotEmpty(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Account records keyed by the identity-provider id. Point lookups,
/// equality-predicate queries, partial-merge updates, and a per-record
/// live snapshot feed.
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn get(&self, id: &str) -> StoreResult<Option<Account>>;
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Account>>;
    async fn children_of(&self, parent_id: &str) -> StoreResult<Vec<Account>>;
    async fn list_all(&self) -> StoreResult<Vec<Account>>;
    async fn create(&self, account: Account) -> StoreResult<Account>;
    async fn patch(&self, id: &str, patch: AccountPatch) -> StoreResult<()>;
    async fn delete(&self, id: &str) -> StoreResult<()>;
    /// Live feed of full snapshots for one account record. Each push
    /// replaces the previous value entirely; `None` means the record was
    /// deleted.
    async fn subscribe(&self, id: &str) -> StoreResult<watch::Receiver<Option<Account>>>;
}

#[async_trait]
pub trait InvitationStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Invitation>>;
    async fn create(&self, invitation: Invitation) -> StoreResult<()>;
    /// Create the account from the pending invitation and delete the
    /// invitation as one atomic unit. Under concurrent registrations for
    /// the same email at most one caller wins; the rest get
    /// [`StoreError::NoInvitation`].
    async fn consume(&self, email: &str, account_id: &str) -> StoreResult<Account>;
}

/// Static reference collections, written once via a batched insert that
/// aborts when the collection already holds data.
#[async_trait]
pub trait SeedStore: Send + Sync {
    async fn seed_colors(&self, colors: &[Color]) -> StoreResult<usize>;
    async fn seed_categories(&self, categories: &[Category]) -> StoreResult<usize>;
}
