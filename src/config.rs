use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    pub catalog: CatalogConfig,
    pub server: ServerConfig,
    #[serde(default)]
    pub pagination: PaginationConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

/// Third-party catalog source settings. The retry/backoff knobs shape the
/// fetch loop in `connector_http`; the core never retries.
#[derive(Debug, Deserialize, Clone)]
pub struct CatalogConfig {
    pub source_url: String,
    #[serde(default = "default_fetch_max_retries")]
    pub fetch_max_retries: u32,
    #[serde(default = "default_fetch_initial_backoff_ms")]
    pub fetch_initial_backoff_ms: u64,
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
}

fn default_fetch_max_retries() -> u32 {
    5
}
fn default_fetch_initial_backoff_ms() -> u64 {
    200
}
fn default_fetch_timeout_secs() -> u64 {
    10
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub bind: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PaginationConfig {
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u32,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
        }
    }
}

fn default_page_size() -> u32 {
    10
}
fn default_max_page_size() -> u32 {
    100
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.catalog.source_url.trim().is_empty() {
        anyhow::bail!("catalog.source_url must not be empty");
    }

    if config.catalog.fetch_max_retries == 0 {
        anyhow::bail!("catalog.fetch_max_retries must be >= 1");
    }

    if config.pagination.default_page_size == 0 {
        anyhow::bail!("pagination.default_page_size must be >= 1");
    }

    if config.pagination.default_page_size > config.pagination.max_page_size {
        anyhow::bail!("pagination.default_page_size must not exceed pagination.max_page_size");
    }

    Ok(config)
}
