//! Session/Profile Bridge.
//!
//! Joins identity-provider session state with the stored account record
//! into one `Actor` value, the sole input for every authorization decision.
//! Resolution fails closed: a bad token, a missing record, or an
//! unreachable store all come out as "no actor". A signed-in identity
//! without an account record stays absent until the record exists, so the
//! registration race never hands out default privileges.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, warn};

use crate::identity::{AuthEvent, IdentityProvider};
use crate::models::account::Actor;
use crate::store::AccountStore;
use crate::utils::time::time_now;

pub struct SessionBridge {
    identity: Arc<dyn IdentityProvider>,
    accounts: Arc<dyn AccountStore>,
}

impl SessionBridge {
    pub fn new(identity: Arc<dyn IdentityProvider>, accounts: Arc<dyn AccountStore>) -> Self {
        Self { identity, accounts }
    }

    /// Resolve a bearer token to the merged actor, or `None`.
    pub async fn resolve(&self, token: &str) -> Option<Actor> {
        let user = match self.identity.verify(token).await {
            Ok(user) => user,
            Err(err) => {
                debug!("token verification failed: {err}");
                return None;
            }
        };

        match self.accounts.get(&user.id).await {
            Ok(Some(account)) => Some(Actor::from_parts(user.email, account)),
            Ok(None) => None, // registration race: absent until the record exists
            Err(err) => {
                warn!("account lookup failed for {}: {err}", user.id);
                None
            }
        }
    }

    /// Stamp `last_login`. Best-effort: during registration the record may
    /// not exist yet, and that is fine; the stamp lands on the next login.
    pub async fn touch_last_login(&self, user_id: &str) {
        let patch = crate::models::account::AccountPatch {
            last_login: Some(time_now()),
            ..Default::default()
        };
        if let Err(err) = self.accounts.patch(user_id, patch).await {
            debug!("last_login update skipped for {user_id}: {err}");
        }
    }

    /// Live actor view for a session. Each account snapshot replaces the
    /// previous actor wholesale (latest wins); a sign-out event for this
    /// user ends the feed with `None`.
    pub async fn watch(&self, token: &str) -> Option<watch::Receiver<Option<Actor>>> {
        let user = match self.identity.verify(token).await {
            Ok(user) => user,
            Err(err) => {
                debug!("token verification failed: {err}");
                return None;
            }
        };

        let mut snapshots = match self.accounts.subscribe(&user.id).await {
            Ok(rx) => rx,
            Err(err) => {
                warn!("account subscription failed for {}: {err}", user.id);
                return None;
            }
        };
        let mut auth_events = self.identity.auth_events();

        let initial = snapshots
            .borrow()
            .clone()
            .map(|account| Actor::from_parts(user.email.clone(), account));
        let (tx, rx) = watch::channel(initial);

        let email = user.email;
        let user_id = user.id;
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    changed = snapshots.changed() => {
                        if changed.is_err() {
                            break; // store side hung up; keep the last value
                        }
                        let actor = snapshots
                            .borrow_and_update()
                            .clone()
                            .map(|account| Actor::from_parts(email.clone(), account));
                        if tx.send(actor).is_err() {
                            break;
                        }
                    }
                    event = auth_events.recv() => {
                        match event {
                            Ok(AuthEvent::SignedOut { user_id: signed_out })
                                if signed_out == user_id =>
                            {
                                let _ = tx.send(None);
                                break;
                            }
                            Ok(_) => {}
                            Err(_) => break,
                        }
                    }
                }
            }
        });

        Some(rx)
    }
}
