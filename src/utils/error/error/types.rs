//! Error types for bulk operations

use crate::services::bulk::BulkResult;
use serde_json::Value;
use thiserror::Error;

/// Result type alias for bulk operations
pub type Result<T> = std::result::Result<T, BulkError>;

/// Main error type for bulk operations
///
/// Structural and resolution errors are raised before any item is dispatched
/// and are never retried. Per-item remote failures never appear here unless
/// the run was configured to abort, in which case `BatchAborted` carries the
/// partial result.
#[derive(Error, Debug)]
pub enum BulkError {
    /// Malformed or ambiguous request
    #[error("{message}")]
    InvalidParameter { message: String, context: Value },

    /// A named resource could not be located
    #[error("{message}")]
    NotFound { message: String, context: Value },

    /// The remote service signalled rate limiting during resolution
    #[error("{message}")]
    RateLimit { message: String, context: Value },

    /// A run with `continue_on_error = false` stopped after a failure
    #[error("Batch processing halted due to failure.")]
    BatchAborted { partial: Box<BulkResult> },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Unexpected failures inside the service
    #[error("Internal error: {0}")]
    Internal(String),
}
