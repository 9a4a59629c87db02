//! Credential backend holding its own records: Argon2 password hashes,
//! JWT session tokens, and an in-process auth-event feed.

use std::collections::{HashMap, HashSet};

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::{Rng, distr::Alphanumeric};
use sha2::{Digest, Sha256};
use tokio::sync::{RwLock, broadcast};
use tracing::info;

use async_trait::async_trait;

use crate::identity::{
    AuthEvent, IdentityError, IdentityProvider, IdentityResult, IdentityUser, Session,
};

const TOKEN_TTL_SECS: u64 = 60 * 60 * 24;
const ISSUER: &str = "motive-mapper";

#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct Claims {
    id: String,
    exp: usize,
    iat: usize,
    iss: String,
}

#[derive(Debug, Clone)]
struct Credential {
    id: String,
    email: String,
    password_hash: String,
}

pub struct LocalIdentity {
    credentials: RwLock<HashMap<String, Credential>>, // keyed by email
    revoked: RwLock<HashSet<String>>,                 // sha256 of revoked tokens
    events: broadcast::Sender<AuthEvent>,
    jwt_secret: String,
}

impl LocalIdentity {
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            credentials: RwLock::new(HashMap::new()),
            revoked: RwLock::new(HashSet::new()),
            events,
            jwt_secret: jwt_secret.into(),
        }
    }

    fn encode_token(&self, user_id: &str) -> IdentityResult<String> {
        let iat = now_secs();
        let claims = Claims {
            id: user_id.to_string(),
            exp: (iat + TOKEN_TTL_SECS) as usize,
            iat: iat as usize,
            iss: ISSUER.to_string(),
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )
        .map_err(|e| IdentityError::Provider(e.to_string()))
    }

    fn decode_token(&self, token: &str) -> IdentityResult<Claims> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|_| IdentityError::InvalidCredential)
    }
}

fn now_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

fn hash_password(password: &[u8]) -> IdentityResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    argon2
        .hash_password(password, &salt)
        .map(|h| h.to_string())
        .map_err(|e| IdentityError::Provider(e.to_string()))
}

fn validate_password(password: &[u8], hash: &str) -> IdentityResult<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| IdentityError::Provider(e.to_string()))?;
    let argon2 = Argon2::default();

    match argon2.verify_password(password, &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(IdentityError::Provider(e.to_string())),
    }
}

fn random_id() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(28)
        .map(char::from)
        .collect()
}

fn token_fingerprint(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[async_trait]
impl IdentityProvider for LocalIdentity {
    async fn create_user(&self, email: &str, password: &str) -> IdentityResult<IdentityUser> {
        if !email.contains('@') {
            return Err(IdentityError::InvalidEmail);
        }
        if password.len() < 6 {
            return Err(IdentityError::WeakPassword);
        }

        let mut credentials = self.credentials.write().await;
        if credentials.contains_key(email) {
            return Err(IdentityError::EmailAlreadyInUse);
        }

        let credential = Credential {
            id: random_id(),
            email: email.to_string(),
            password_hash: hash_password(password.as_bytes())?,
        };
        let user = IdentityUser {
            id: credential.id.clone(),
            email: credential.email.clone(),
        };
        credentials.insert(email.to_string(), credential);
        Ok(user)
    }

    async fn sign_in(&self, email: &str, password: &str) -> IdentityResult<Session> {
        let credential = {
            let credentials = self.credentials.read().await;
            credentials
                .get(email)
                .cloned()
                .ok_or(IdentityError::InvalidCredential)?
        };

        if !validate_password(password.as_bytes(), &credential.password_hash)? {
            return Err(IdentityError::InvalidCredential);
        }

        let token = self.encode_token(&credential.id)?;
        let user = IdentityUser {
            id: credential.id,
            email: credential.email,
        };
        let _ = self.events.send(AuthEvent::SignedIn { user: user.clone() });
        Ok(Session { token, user })
    }

    async fn verify(&self, token: &str) -> IdentityResult<IdentityUser> {
        if self.revoked.read().await.contains(&token_fingerprint(token)) {
            return Err(IdentityError::InvalidCredential);
        }
        let claims = self.decode_token(token)?;

        let credentials = self.credentials.read().await;
        credentials
            .values()
            .find(|c| c.id == claims.id)
            .map(|c| IdentityUser {
                id: c.id.clone(),
                email: c.email.clone(),
            })
            .ok_or(IdentityError::InvalidCredential)
    }

    async fn sign_out(&self, token: &str) -> IdentityResult<()> {
        self.revoked.write().await.insert(token_fingerprint(token));
        if let Ok(claims) = self.decode_token(token) {
            let _ = self.events.send(AuthEvent::SignedOut { user_id: claims.id });
        }
        Ok(())
    }

    async fn send_password_reset(&self, email: &str) -> IdentityResult<()> {
        let known = self.credentials.read().await.contains_key(email);
        if known {
            // No mail transport here; the token is surfaced through the log
            // the way an operator would wire it up for local runs.
            let token = random_id();
            info!("Password reset token for {email} = {token}");
        }
        // Identical outcome either way, so callers cannot probe for emails.
        Ok(())
    }

    fn auth_events(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}
