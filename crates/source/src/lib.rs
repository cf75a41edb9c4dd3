//! Upstream status collaborator.
//!
//! One GET per call against the configured endpoint, no caching. The
//! payload comes back as raw JSON; making sense of its shape is the
//! normalizer's job, not the transport's.

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("status request to {url} failed: {reason}")]
    Transport { url: String, reason: String },
    #[error("status endpoint {url} answered {status}")]
    Status { url: String, status: u16 },
    #[error("status endpoint {url} returned an unreadable body: {reason}")]
    Body { url: String, reason: String },
}

/// Anything that can produce a raw status payload on demand.
#[async_trait]
pub trait StatusSource: Send + Sync {
    async fn fetch(&self) -> Result<Value, FetchError>;
}

/// HTTP JSON status source.
pub struct HttpStatusSource {
    client: reqwest::Client,
    url: String,
}

impl HttpStatusSource {
    /// Default per-request timeout; the only time bound a poll cycle has.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    pub fn new(url: impl Into<String>) -> Self {
        Self::with_timeout(url, Self::DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            client,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl StatusSource for HttpStatusSource {
    async fn fetch(&self) -> Result<Value, FetchError> {
        tracing::debug!(url = %self.url, "fetching server status");

        let response = self
            .client
            .get(&self.url)
            .header(reqwest::header::CACHE_CONTROL, "no-cache")
            .send()
            .await
            .map_err(|e| FetchError::Transport {
                url: self.url.clone(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: self.url.clone(),
                status: status.as_u16(),
            });
        }

        response.json::<Value>().await.map_err(|e| FetchError::Body {
            url: self.url.clone(),
            reason: e.to_string(),
        })
    }
}
