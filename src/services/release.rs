//! Release metadata and artifact download.

use crate::error::{SyncError, SyncResult};
use crate::models::EngineConfig;
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReleaseAsset {
    pub name: String,
    pub browser_download_url: String,
}

/// The subset of a GitHub release the manager uses.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Release {
    pub tag_name: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
}

impl Release {
    pub fn asset(&self, name: &str) -> Option<&ReleaseAsset> {
        self.assets.iter().find(|a| a.name == name)
    }
}

/// Where loader releases come from.
#[async_trait]
pub trait ReleaseSource: Send + Sync {
    async fn latest_release(&self) -> SyncResult<Release>;
    async fn fetch_text(&self, url: &str) -> SyncResult<String>;
    async fn fetch_bytes(&self, url: &str) -> SyncResult<Vec<u8>>;
}

/// GitHub releases API over reqwest.
///
/// Every request has a timeout. Timeouts, connection failures, HTTP 429 and
/// 5xx are retried up to `max_retries` times, waiting `n * backoff` before
/// attempt `n + 1`.
#[derive(Debug, Clone)]
pub struct GithubReleaseSource {
    client: Client,
    release_url: String,
    max_retries: u32,
    backoff: Duration,
}

impl GithubReleaseSource {
    pub fn new(config: &EngineConfig) -> SyncResult<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.network_timeout())
            .build()
            .map_err(|e| SyncError::network(&config.release_url, e.to_string(), false))?;

        Ok(Self {
            client,
            release_url: config.release_url.clone(),
            max_retries: config.max_retries,
            backoff: config.retry_backoff(),
        })
    }

    async fn get(&self, url: &str) -> SyncResult<Response> {
        let mut attempt: u32 = 0;
        loop {
            let err = match self.client.get(url).send().await {
                Ok(response) if response.status().is_success() => return Ok(response),
                Ok(response) => {
                    let status = response.status();
                    SyncError::network(url, format!("HTTP {}", status), is_retryable_status(status))
                }
                Err(e) => SyncError::network(url, e.to_string(), e.is_timeout() || e.is_connect()),
            };

            if !err.is_retryable() || attempt >= self.max_retries {
                tracing::error!("GET {} failed after {} attempt(s): {}", url, attempt + 1, err);
                return Err(err);
            }

            attempt += 1;
            let delay = self.backoff * attempt;
            tracing::warn!("GET {} failed ({}), retrying in {:?}", url, err, delay);
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl ReleaseSource for GithubReleaseSource {
    async fn latest_release(&self) -> SyncResult<Release> {
        let response = self.get(&self.release_url).await?;
        let release: Release = response
            .json()
            .await
            .map_err(|e| SyncError::network(&self.release_url, e.to_string(), e.is_timeout()))?;
        tracing::debug!("Latest release is {} with {} asset(s)", release.tag_name, release.assets.len());
        Ok(release)
    }

    async fn fetch_text(&self, url: &str) -> SyncResult<String> {
        self.get(url)
            .await?
            .text()
            .await
            .map_err(|e| SyncError::network(url, e.to_string(), e.is_timeout()))
    }

    async fn fetch_bytes(&self, url: &str) -> SyncResult<Vec<u8>> {
        let bytes = self
            .get(url)
            .await?
            .bytes()
            .await
            .map_err(|e| SyncError::network(url, e.to_string(), e.is_timeout()))?;
        tracing::debug!("Downloaded {} byte(s) from {}", bytes.len(), url);
        Ok(bytes.to_vec())
    }
}

fn is_retryable_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}
