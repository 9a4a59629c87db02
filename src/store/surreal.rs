//! SurrealDB store backend.
//!
//! Accounts and invitations live in plain document tables and are addressed
//! by their application-level fields (`uid`, `email`), never by the record
//! id. The invitation consume runs as a single transaction so concurrent
//! registrations cannot both win. Subscriptions are LIVE SELECT streams
//! forwarded into a `watch` channel, keeping the latest-wins contract.

use async_trait::async_trait;
use futures::StreamExt;
use surrealdb::{
    Action, Surreal,
    engine::remote::ws::{Client, Ws},
    opt::auth::Root,
};
use tokio::sync::watch;
use tracing::warn;

use crate::config::SurrealConfig;
use crate::consts::store_const::{CATEGORY_TABLE, COLOR_TABLE, INVITATION_TABLE, USER_TABLE};
use crate::models::{
    account::{Account, AccountPatch},
    invitation::Invitation,
    seed::{Category, Color},
};
use crate::store::{AccountStore, InvitationStore, SeedStore, StoreError, StoreResult};
use crate::utils::time::time_now;

pub struct SurrealStore {
    sdb: Surreal<Client>,
}

impl SurrealStore {
    pub async fn connect(config: &SurrealConfig) -> StoreResult<Self> {
        let sdb = Surreal::new::<Ws>(config.endpoint.as_str())
            .await
            .map_err(unavailable)?;
        sdb.signin(Root {
            username: &config.username,
            password: &config.password,
        })
        .await
        .map_err(unavailable)?;
        sdb.use_ns(&config.namespace)
            .use_db(&config.database)
            .await
            .map_err(unavailable)?;

        Ok(Self { sdb })
    }
}

fn unavailable(err: surrealdb::Error) -> StoreError {
    StoreError::Unavailable(err.to_string())
}

#[async_trait]
impl AccountStore for SurrealStore {
    async fn get(&self, id: &str) -> StoreResult<Option<Account>> {
        let mut res = self
            .sdb
            .query("SELECT * FROM type::table($table) WHERE uid = $uid;")
            .bind(("table", USER_TABLE))
            .bind(("uid", id.to_string()))
            .await
            .map_err(unavailable)?;
        let accounts: Vec<Account> = res.take(0).map_err(unavailable)?;
        Ok(accounts.into_iter().next())
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Account>> {
        let mut res = self
            .sdb
            .query("SELECT * FROM type::table($table) WHERE email = $email;")
            .bind(("table", USER_TABLE))
            .bind(("email", email.to_string()))
            .await
            .map_err(unavailable)?;
        let accounts: Vec<Account> = res.take(0).map_err(unavailable)?;
        Ok(accounts.into_iter().next())
    }

    async fn children_of(&self, parent_id: &str) -> StoreResult<Vec<Account>> {
        let mut res = self
            .sdb
            .query("SELECT * FROM type::table($table) WHERE parent_id = $parent_id;")
            .bind(("table", USER_TABLE))
            .bind(("parent_id", parent_id.to_string()))
            .await
            .map_err(unavailable)?;
        res.take(0).map_err(unavailable)
    }

    async fn list_all(&self) -> StoreResult<Vec<Account>> {
        let mut res = self
            .sdb
            .query("SELECT * FROM type::table($table);")
            .bind(("table", USER_TABLE))
            .await
            .map_err(unavailable)?;
        res.take(0).map_err(unavailable)
    }

    async fn create(&self, account: Account) -> StoreResult<Account> {
        let created: Option<Account> = self
            .sdb
            .create(USER_TABLE)
            .content(account)
            .await
            .map_err(unavailable)?;
        created.ok_or_else(|| StoreError::Unavailable("create returned no record".to_string()))
    }

    async fn patch(&self, id: &str, patch: AccountPatch) -> StoreResult<()> {
        let mut res = self
            .sdb
            .query("UPDATE type::table($table) MERGE $patch WHERE uid = $uid;")
            .bind(("table", USER_TABLE))
            .bind(("patch", patch))
            .bind(("uid", id.to_string()))
            .await
            .map_err(unavailable)?;
        let updated: Vec<Account> = res.take(0).map_err(unavailable)?;
        if updated.is_empty() {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn delete(&self, id: &str) -> StoreResult<()> {
        self.sdb
            .query("DELETE FROM type::table($table) WHERE uid = $uid;")
            .bind(("table", USER_TABLE))
            .bind(("uid", id.to_string()))
            .await
            .map_err(unavailable)?;
        Ok(())
    }

    async fn subscribe(&self, id: &str) -> StoreResult<watch::Receiver<Option<Account>>> {
        let current = self.get(id).await?;
        let (tx, rx) = watch::channel(current);

        let mut stream = self
            .sdb
            .select::<Vec<Account>>(USER_TABLE)
            .live()
            .await
            .map_err(unavailable)?;

        let id = id.to_string();
        tokio::spawn(async move {
            while let Some(notification) = stream.next().await {
                let notification = match notification {
                    Ok(n) => n,
                    Err(err) => {
                        warn!("live account feed error: {err}");
                        continue;
                    }
                };
                if notification.data.id != id {
                    continue;
                }
                let snapshot = match notification.action {
                    Action::Delete => None,
                    _ => Some(notification.data),
                };
                if tx.send(snapshot).is_err() {
                    break; // subscriber went away
                }
            }
        });

        Ok(rx)
    }
}

#[async_trait]
impl InvitationStore for SurrealStore {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Invitation>> {
        let mut res = self
            .sdb
            .query("SELECT * FROM type::table($table) WHERE email = $email;")
            .bind(("table", INVITATION_TABLE))
            .bind(("email", email.to_string()))
            .await
            .map_err(unavailable)?;
        let invitations: Vec<Invitation> = res.take(0).map_err(unavailable)?;
        Ok(invitations.into_iter().next())
    }

    async fn create(&self, invitation: Invitation) -> StoreResult<()> {
        let _: Option<Invitation> = self
            .sdb
            .create(INVITATION_TABLE)
            .content(invitation)
            .await
            .map_err(unavailable)?;
        Ok(())
    }

    async fn consume(&self, email: &str, account_id: &str) -> StoreResult<Account> {
        // One transaction: delete the invitation and create the account, or
        // neither. A second caller finds nothing to delete and aborts.
        let res = self
            .sdb
            .query(
                "BEGIN TRANSACTION;
                 LET $inv = (DELETE FROM type::table($inv_table) WHERE email = $email RETURN BEFORE);
                 IF array::len($inv) == 0 { THROW 'no_invitation'; };
                 CREATE type::table($user_table) CONTENT {
                     uid: $uid,
                     email: $email,
                     display_name: $inv[0].display_name,
                     role: $inv[0].role,
                     parent_id: $inv[0].parent_id,
                     created_at: $created_at,
                     last_login: NONE
                 };
                 COMMIT TRANSACTION;",
            )
            .bind(("inv_table", INVITATION_TABLE))
            .bind(("user_table", USER_TABLE))
            .bind(("email", email.to_string()))
            .bind(("uid", account_id.to_string()))
            .bind(("created_at", time_now()))
            .await
            .map_err(unavailable)?;

        let mut res = res.check().map_err(|err| {
            if err.to_string().contains("no_invitation") {
                StoreError::NoInvitation(email.to_string())
            } else {
                unavailable(err)
            }
        })?;

        let created: Vec<Account> = res.take(2).map_err(unavailable)?;
        created
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::NoInvitation(email.to_string()))
    }
}

#[async_trait]
impl SeedStore for SurrealStore {
    async fn seed_colors(&self, colors: &[Color]) -> StoreResult<usize> {
        let mut res = self
            .sdb
            .query("SELECT * FROM type::table($table);")
            .bind(("table", COLOR_TABLE))
            .await
            .map_err(unavailable)?;
        let existing: Vec<Color> = res.take(0).map_err(unavailable)?;
        if !existing.is_empty() {
            return Err(StoreError::NotEmpty("colors".to_string()));
        }

        self.sdb
            .query("FOR $color IN $colors { CREATE type::table($table) CONTENT $color; };")
            .bind(("table", COLOR_TABLE))
            .bind(("colors", colors.to_vec()))
            .await
            .map_err(unavailable)?
            .check()
            .map_err(unavailable)?;
        Ok(colors.len())
    }

    async fn seed_categories(&self, categories: &[Category]) -> StoreResult<usize> {
        let mut res = self
            .sdb
            .query("SELECT * FROM type::table($table);")
            .bind(("table", CATEGORY_TABLE))
            .await
            .map_err(unavailable)?;
        let existing: Vec<Category> = res.take(0).map_err(unavailable)?;
        if !existing.is_empty() {
            return Err(StoreError::NotEmpty("categories".to_string()));
        }

        self.sdb
            .query("FOR $category IN $categories { CREATE type::table($table) CONTENT $category; };")
            .bind(("table", CATEGORY_TABLE))
            .bind(("categories", categories.to_vec()))
            .await
            .map_err(unavailable)?
            .check()
            .map_err(unavailable)?;
        Ok(categories.len())
    }
}
