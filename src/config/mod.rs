//! Configuration management for bulk operations
//!
//! Process-wide batch defaults are loaded from the environment or a YAML file
//! and turned into [`BatchOptions`] that every run starts from.

pub mod loader;
pub mod validation;

pub use validation::Validate;

use crate::core::batch::{
    BatchOptions, DEFAULT_BATCH_SIZE, DEFAULT_CONCURRENCY, DEFAULT_RETRY_COUNT, MAX_CONCURRENCY,
};
use crate::utils::error::{BulkError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// Upper bound for the configured retry count
pub const MAX_RETRY_COUNT: u32 = 6;
/// Default base retry delay in seconds
pub const DEFAULT_RETRY_DELAY_SECS: f64 = 1.0;

/// Runtime configuration for the bulk service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkConfig {
    /// API token for the task-management service
    #[serde(default)]
    pub api_token: Option<String>,
    /// Team used when a request does not name one
    #[serde(default)]
    pub default_team_id: Option<u64>,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: f64,
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

fn default_retry_count() -> u32 {
    DEFAULT_RETRY_COUNT
}

fn default_retry_delay_secs() -> f64 {
    DEFAULT_RETRY_DELAY_SECS
}

impl Default for BulkConfig {
    fn default() -> Self {
        Self {
            api_token: None,
            default_team_id: None,
            batch_size: DEFAULT_BATCH_SIZE,
            concurrency: DEFAULT_CONCURRENCY,
            retry_count: DEFAULT_RETRY_COUNT,
            retry_delay_secs: DEFAULT_RETRY_DELAY_SECS,
        }
    }
}

impl BulkConfig {
    /// Load configuration from a YAML file
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading configuration from: {:?}", path);

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| BulkError::config(format!("Failed to read config file: {}", e)))?;

        let config: Self = serde_yaml::from_str(&content)
            .map_err(|e| BulkError::config(format!("Failed to parse config: {}", e)))?;

        config.validate()?;

        debug!("Configuration loaded successfully");
        Ok(config)
    }

    /// Process-wide default options for every batch run
    pub fn batch_options(&self) -> BatchOptions {
        BatchOptions::new()
            .with_batch_size(self.batch_size)
            .with_concurrency(self.concurrency.min(MAX_CONCURRENCY))
            .with_retry_count(self.retry_count.min(MAX_RETRY_COUNT))
            .with_retry_delay(
                Duration::try_from_secs_f64(self.retry_delay_secs.max(0.0))
                    .unwrap_or(Duration::ZERO),
            )
    }
}
