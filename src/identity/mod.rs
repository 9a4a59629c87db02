use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::broadcast;

pub mod local;

/// The identity provider's view of a party: the opaque id every account
/// record is keyed by, plus the verified email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityUser {
    pub id: String,
    pub email: String,
}

#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub user: IdentityUser,
}

/// Auth-state transitions, pushed to subscribers. The session bridge uses
/// these to drop the current actor on sign-out.
#[derive(Debug, Clone)]
pub enum AuthEvent {
    SignedIn { user: IdentityUser },
    SignedOut { user_id: String },
}

/// The known provider error codes. Anything a backend cannot express with
/// the first four collapses into `Provider`, which is never shown to users.
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("invalid credential")]
    InvalidCredential,
    #[error("email already in use")]
    EmailAlreadyInUse,
    #[error("weak password")]
    WeakPassword,
    #[error("invalid email")]
    InvalidEmail,
    #[error("identity provider failure: {0}")]
    Provider(String),
}

pub type IdentityResult<T> = Result<T, IdentityError>;

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Register credentials and mint the opaque account id.
    async fn create_user(&self, email: &str, password: &str) -> IdentityResult<IdentityUser>;

    async fn sign_in(&self, email: &str, password: &str) -> IdentityResult<Session>;

    /// Resolve a session token back to its identity. Fails on revoked,
    /// expired or malformed tokens and on deleted users.
    async fn verify(&self, token: &str) -> IdentityResult<IdentityUser>;

    async fn sign_out(&self, token: &str) -> IdentityResult<()>;

    /// Always succeeds from the caller's point of view, whether or not the
    /// email is registered. Account enumeration prevention.
    async fn send_password_reset(&self, email: &str) -> IdentityResult<()>;

    fn auth_events(&self) -> broadcast::Receiver<AuthEvent>;
}
