//! Third-party catalog connector.
//!
//! Fetches the upstream product feed — a single JSON array of camelCase
//! records — over HTTP. The fetch is the only place in the system that
//! retries: up to `fetch_max_retries` attempts with exponential backoff
//! starting at `fetch_initial_backoff_ms` and doubling per attempt, each
//! attempt bounded by `fetch_timeout_secs`.
//!
//! Retry strategy:
//! - HTTP 429 or 5xx → retry with backoff
//! - HTTP 4xx (not 429) → fail immediately
//! - Network error / timeout → retry
//!
//! An empty array is a valid response; tolerating a failed fetch entirely
//! is the ingestion orchestrator's call, not the connector's.

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::time::Duration;

use crate::config::CatalogConfig;
use crate::models::CatalogRecord;

/// A source of catalog records. The HTTP feed is the production
/// implementation; tests substitute fixture-backed sources.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Short name for logs and CLI summaries.
    fn name(&self) -> &str;

    async fn fetch(&self) -> Result<Vec<CatalogRecord>>;
}

/// The production source: HTTP GET against the configured feed URL.
pub struct HttpCatalogSource {
    config: CatalogConfig,
}

impl HttpCatalogSource {
    pub fn new(config: CatalogConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl CatalogSource for HttpCatalogSource {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch(&self) -> Result<Vec<CatalogRecord>> {
        fetch_catalog(&self.config).await
    }
}

/// Fetch the feed with retry/backoff per the module docs.
pub async fn fetch_catalog(config: &CatalogConfig) -> Result<Vec<CatalogRecord>> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.fetch_timeout_secs))
        .build()?;

    let mut last_err = None;

    for attempt in 0..config.fetch_max_retries {
        if attempt > 0 {
            // Backoff: 200ms, 400ms, 800ms, ...
            let delay =
                Duration::from_millis(config.fetch_initial_backoff_ms << (attempt - 1).min(16));
            tracing::warn!(
                attempt,
                delay_ms = delay.as_millis() as u64,
                "catalog fetch failed, retrying"
            );
            tokio::time::sleep(delay).await;
        }

        let resp = client
            .get(&config.source_url)
            .header("Accept", "application/json")
            .send()
            .await;

        match resp {
            Ok(response) => {
                let status = response.status();

                if status.is_success() {
                    let records: Vec<CatalogRecord> = response.json().await?;
                    return Ok(records);
                }

                // Rate limited or server error — retry
                if status.as_u16() == 429 || status.is_server_error() {
                    last_err = Some(anyhow::anyhow!("catalog source returned {}", status));
                    continue;
                }

                // Client error (not 429) — don't retry
                bail!("catalog source returned {}", status);
            }
            Err(e) => {
                last_err = Some(e.into());
                continue;
            }
        }
    }

    Err(last_err.unwrap_or_else(|| anyhow::anyhow!("catalog fetch failed after retries")))
}
