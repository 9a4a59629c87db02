//! Text-analysis boundary.
//!
//! The analysis itself lives behind a managed generative endpoint; this
//! side only ships text over and takes a `DriverReport` back. Everything
//! that can go wrong over there collapses into one opaque failure for
//! callers.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::config::AnalyzerConfig;
use crate::models::analysis::DriverReport;

#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error("analyzer request failed: {0}")]
    Request(String),
    #[error("analyzer returned a malformed report")]
    Malformed,
}

#[async_trait]
pub trait TextAnalyzer: Send + Sync {
    async fn analyze(&self, text: &str) -> Result<DriverReport, AnalyzerError>;
}

#[derive(Serialize)]
struct AnalyzeRequest<'a> {
    text: &'a str,
}

pub struct HttpAnalyzer {
    client: reqwest::Client,
    endpoint: String,
    token: Option<String>,
}

impl HttpAnalyzer {
    pub fn new(config: &AnalyzerConfig) -> Result<Self, AnalyzerError> {
        // A hung analyzer must not stall requests forever.
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AnalyzerError::Request(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            token: config.token.clone(),
        })
    }
}

#[async_trait]
impl TextAnalyzer for HttpAnalyzer {
    async fn analyze(&self, text: &str) -> Result<DriverReport, AnalyzerError> {
        let mut request = self.client.post(&self.endpoint).json(&AnalyzeRequest { text });
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AnalyzerError::Request(e.to_string()))?;
        if !response.status().is_success() {
            return Err(AnalyzerError::Request(format!(
                "analyzer responded with {}",
                response.status()
            )));
        }

        response
            .json::<DriverReport>()
            .await
            .map_err(|_| AnalyzerError::Malformed)
    }
}
