use std::env;
use std::net::SocketAddr;

use tracing::warn;

use crate::errors::{Error, Result};

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    pub store: StoreBackend,
    pub analyzer: AnalyzerConfig,
}

#[derive(Debug, Clone)]
pub enum StoreBackend {
    Memory,
    Surreal(SurrealConfig),
}

#[derive(Debug, Clone)]
pub struct SurrealConfig {
    pub endpoint: String,
    pub username: String,
    pub password: String,
    pub namespace: String,
    pub database: String,
}

#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    pub endpoint: String,
    pub token: Option<String>,
}

fn var_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let bind_addr = var_or("MM_BIND", "127.0.0.1:3587")
            .parse()
            .map_err(|_| Error::Config("MM_BIND is not a socket address".to_string()))?;

        let jwt_secret = var_or("MM_JWT_SECRET", "");
        let jwt_secret = if jwt_secret.is_empty() {
            warn!("MM_JWT_SECRET not set, using a development secret");
            "development-secret".to_string()
        } else {
            jwt_secret
        };

        let store = match var_or("MM_STORE", "memory").as_str() {
            "memory" => StoreBackend::Memory,
            "surreal" => StoreBackend::Surreal(SurrealConfig {
                endpoint: var_or("MM_SURREAL_ENDPOINT", "localhost:8050"),
                username: var_or("MM_SURREAL_USER", "root"),
                password: var_or("MM_SURREAL_PASS", "secret"),
                namespace: var_or("MM_SURREAL_NS", "motive_mapper"),
                database: var_or("MM_SURREAL_DB", "motive_mapper"),
            }),
            other => {
                return Err(Error::Config(format!("unknown MM_STORE backend: {other}")));
            }
        };

        let analyzer = AnalyzerConfig {
            endpoint: var_or("MM_ANALYZER_URL", "http://localhost:3400/analyze"),
            token: env::var("MM_ANALYZER_TOKEN").ok(),
        };

        Ok(Self {
            bind_addr,
            jwt_secret,
            store,
            analyzer,
        })
    }
}
