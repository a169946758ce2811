//! Configuration validation

use super::{BulkConfig, MAX_RETRY_COUNT};
use crate::core::batch::MAX_CONCURRENCY;
use crate::utils::error::{BulkError, Result};
use tracing::debug;

/// Validate trait for configuration structures
pub trait Validate {
    fn validate(&self) -> Result<()>;
}

impl Validate for BulkConfig {
    fn validate(&self) -> Result<()> {
        debug!("Validating bulk configuration");

        if self.batch_size == 0 {
            return Err(BulkError::config("Batch size must be greater than 0"));
        }

        if self.concurrency == 0 || self.concurrency > MAX_CONCURRENCY {
            return Err(BulkError::config(format!(
                "Concurrency must be between 1 and {}",
                MAX_CONCURRENCY
            )));
        }

        if self.retry_count > MAX_RETRY_COUNT {
            return Err(BulkError::config(format!(
                "Retry count must not exceed {}",
                MAX_RETRY_COUNT
            )));
        }

        if !self.retry_delay_secs.is_finite() || self.retry_delay_secs < 0.0 {
            return Err(BulkError::config("Retry delay must be a non-negative number"));
        }

        if matches!(&self.api_token, Some(token) if token.trim().is_empty()) {
            return Err(BulkError::config("API token cannot be empty"));
        }

        Ok(())
    }
}
