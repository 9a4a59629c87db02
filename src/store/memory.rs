//! In-memory store backend.
//!
//! Backs local development and the test suite with `HashMap`s behind
//! `tokio::sync::RwLock`. State is lost on restart. Atomicity of the
//! invitation consume is provided by holding both write locks across the
//! check-and-create, which is the in-process equivalent of the document
//! store's batched transaction.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::{RwLock, watch};

use crate::models::{
    account::{Account, AccountPatch},
    invitation::Invitation,
    seed::{Category, Color},
};
use crate::store::{AccountStore, InvitationStore, SeedStore, StoreError, StoreResult};
use crate::utils::time::time_now;

#[derive(Default)]
pub struct MemoryStore {
    accounts: RwLock<HashMap<String, Account>>,
    invitations: RwLock<HashMap<String, Invitation>>, // keyed by email
    colors: RwLock<Vec<Color>>,
    categories: RwLock<Vec<Category>>,
    feeds: RwLock<HashMap<String, watch::Sender<Option<Account>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push the latest snapshot to any live subscription for this record.
    async fn publish(&self, id: &str, snapshot: Option<Account>) {
        let feeds = self.feeds.read().await;
        if let Some(sender) = feeds.get(id) {
            let _ = sender.send(snapshot);
        }
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn get(&self, id: &str) -> StoreResult<Option<Account>> {
        Ok(self.accounts.read().await.get(id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Account>> {
        Ok(self
            .accounts
            .read()
            .await
            .values()
            .find(|a| a.email == email)
            .cloned())
    }

    async fn children_of(&self, parent_id: &str) -> StoreResult<Vec<Account>> {
        Ok(self
            .accounts
            .read()
            .await
            .values()
            .filter(|a| a.parent_id.as_deref() == Some(parent_id))
            .cloned()
            .collect())
    }

    async fn list_all(&self) -> StoreResult<Vec<Account>> {
        Ok(self.accounts.read().await.values().cloned().collect())
    }

    async fn create(&self, account: Account) -> StoreResult<Account> {
        self.accounts
            .write()
            .await
            .insert(account.id.clone(), account.clone());
        self.publish(&account.id, Some(account.clone())).await;
        Ok(account)
    }

    async fn patch(&self, id: &str, patch: AccountPatch) -> StoreResult<()> {
        let updated = {
            let mut accounts = self.accounts.write().await;
            let account = accounts
                .get_mut(id)
                .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
            if let Some(display_name) = patch.display_name {
                account.display_name = display_name;
            }
            if let Some(role) = patch.role {
                account.role = role;
            }
            if let Some(last_login) = patch.last_login {
                account.last_login = Some(last_login);
            }
            account.clone()
        };
        self.publish(id, Some(updated)).await;
        Ok(())
    }

    async fn delete(&self, id: &str) -> StoreResult<()> {
        self.accounts.write().await.remove(id);
        self.publish(id, None).await;
        Ok(())
    }

    async fn subscribe(&self, id: &str) -> StoreResult<watch::Receiver<Option<Account>>> {
        let current = self.accounts.read().await.get(id).cloned();
        let mut feeds = self.feeds.write().await;
        let sender = feeds
            .entry(id.to_string())
            .or_insert_with(|| watch::channel(current).0);
        Ok(sender.subscribe())
    }
}

#[async_trait]
impl InvitationStore for MemoryStore {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Invitation>> {
        Ok(self.invitations.read().await.get(email).cloned())
    }

    async fn create(&self, invitation: Invitation) -> StoreResult<()> {
        self.invitations
            .write()
            .await
            .insert(invitation.email.clone(), invitation);
        Ok(())
    }

    async fn consume(&self, email: &str, account_id: &str) -> StoreResult<Account> {
        // Lock order: invitations before accounts, everywhere.
        let mut invitations = self.invitations.write().await;
        let mut accounts = self.accounts.write().await;

        let invitation = invitations
            .remove(email)
            .ok_or_else(|| StoreError::NoInvitation(email.to_string()))?;

        let account = Account {
            id: account_id.to_string(),
            email: invitation.email,
            display_name: invitation.display_name,
            role: invitation.role,
            parent_id: Some(invitation.parent_id),
            created_at: time_now(),
            last_login: None,
        };
        accounts.insert(account.id.clone(), account.clone());
        drop(accounts);
        drop(invitations);

        self.publish(account_id, Some(account.clone())).await;
        Ok(account)
    }
}

#[async_trait]
impl SeedStore for MemoryStore {
    async fn seed_colors(&self, colors: &[Color]) -> StoreResult<usize> {
        let mut stored = self.colors.write().await;
        if !stored.is_empty() {
            return Err(StoreError::NotEmpty("colors".to_string()));
        }
        stored.extend_from_slice(colors);
        Ok(stored.len())
    }

    async fn seed_categories(&self, categories: &[Category]) -> StoreResult<usize> {
        let mut stored = self.categories.write().await;
        if !stored.is_empty() {
            return Err(StoreError::NotEmpty("categories".to_string()));
        }
        stored.extend_from_slice(categories);
        Ok(stored.len())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::models::account::Role;

    fn invitation(email: &str) -> Invitation {
        Invitation {
            email: email.to_string(),
            display_name: "Sander".to_string(),
            role: Role::User,
            parent_id: "inviter".to_string(),
            created_at: time_now(),
        }
    }

    #[tokio::test]
    async fn consume_creates_account_and_deletes_invitation() {
        let store = MemoryStore::new();
        InvitationStore::create(&store, invitation("e@x.com"))
            .await
            .unwrap();

        let account = store.consume("e@x.com", "uid-1").await.unwrap();
        assert_eq!(account.id, "uid-1");
        assert_eq!(account.role, Role::User);
        assert_eq!(account.parent_id.as_deref(), Some("inviter"));

        assert!(
            InvitationStore::find_by_email(&store, "e@x.com")
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn double_consume_leaves_exactly_one_account() {
        let store = Arc::new(MemoryStore::new());
        InvitationStore::create(store.as_ref(), invitation("e@x.com"))
            .await
            .unwrap();

        let (a, b) = tokio::join!(
            store.consume("e@x.com", "uid-a"),
            store.consume("e@x.com", "uid-b"),
        );
        let wins = [a.is_ok(), b.is_ok()].iter().filter(|w| **w).count();
        assert_eq!(wins, 1);
        assert_eq!(store.list_all().await.unwrap().len(), 1);

        let loser = if a.is_ok() { b } else { a };
        assert!(matches!(loser, Err(StoreError::NoInvitation(_))));
    }

    #[tokio::test]
    async fn subscription_sees_latest_snapshot() {
        let store = MemoryStore::new();
        let account = Account {
            id: "uid-1".to_string(),
            email: "e@x.com".to_string(),
            display_name: "Sander".to_string(),
            role: Role::User,
            parent_id: None,
            created_at: time_now(),
            last_login: None,
        };
        AccountStore::create(&store, account).await.unwrap();

        let mut feed = store.subscribe("uid-1").await.unwrap();
        for name in ["First", "Second"] {
            store
                .patch(
                    "uid-1",
                    AccountPatch {
                        display_name: Some(name.to_string()),
                        ..Default::default()
                    },
                )
                .await
                .unwrap();
        }

        feed.changed().await.unwrap();
        let latest = feed.borrow_and_update().clone().unwrap();
        assert_eq!(latest.display_name, "Second");
    }

    #[tokio::test]
    async fn subscription_reports_deletion() {
        let store = MemoryStore::new();
        let account = Account {
            id: "uid-1".to_string(),
            email: "e@x.com".to_string(),
            display_name: "Sander".to_string(),
            role: Role::User,
            parent_id: None,
            created_at: time_now(),
            last_login: None,
        };
        AccountStore::create(&store, account).await.unwrap();

        let mut feed = store.subscribe("uid-1").await.unwrap();
        store.delete("uid-1").await.unwrap();

        feed.changed().await.unwrap();
        assert!(feed.borrow_and_update().is_none());
    }

    #[tokio::test]
    async fn seeding_aborts_on_non_empty_collection() {
        let store = MemoryStore::new();
        let colors = crate::models::seed::default_colors();

        assert_eq!(store.seed_colors(&colors).await.unwrap(), colors.len());
        assert!(matches!(
            store.seed_colors(&colors).await,
            Err(StoreError::NotEmpty(_))
        ));
    }
}
