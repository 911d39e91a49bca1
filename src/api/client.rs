//! # Upstream HTTP Client
//!
//! A single bounded-timeout GET against a third-party endpoint. Non-2xx
//! responses are surfaced as [`TaskError::Upstream`] carrying the status and
//! whatever body text was readable; network failures (timeout, DNS,
//! connection refused) collapse into the same error kind. Retry policy lives
//! in the executor/broker layer, never here.
//!
//! The [`UpstreamClient`] trait is the seam tests use to substitute a stub
//! upstream without a live network.

use async_trait::async_trait;
use std::time::Duration;

use crate::errors::{TaskError, TaskResult};

/// Bound on every outbound API call
pub const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(30);

/// Outbound fetch seam
///
/// Implementations perform one HTTP GET and return the parsed JSON body.
#[async_trait]
pub trait UpstreamClient: Send + Sync {
    async fn fetch(
        &self,
        endpoint: &str,
        query: &[(String, String)],
    ) -> TaskResult<serde_json::Value>;
}

/// reqwest-backed implementation with a shared connection pool
#[derive(Debug, Clone)]
pub struct HttpUpstreamClient {
    client: reqwest::Client,
}

impl Default for HttpUpstreamClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpUpstreamClient {
    pub fn new() -> Self {
        // Client construction only fails on TLS backend misconfiguration;
        // fall back to default settings rather than propagating at this point.
        let client = reqwest::Client::builder()
            .timeout(UPSTREAM_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self { client }
    }
}

#[async_trait]
impl UpstreamClient for HttpUpstreamClient {
    async fn fetch(
        &self,
        endpoint: &str,
        query: &[(String, String)],
    ) -> TaskResult<serde_json::Value> {
        let response = self.client.get(endpoint).query(query).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TaskError::upstream_status(status.as_u16(), body));
        }

        let data = response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| TaskError::upstream(format!("Invalid JSON body: {e}")))?;

        Ok(data)
    }
}
