//! Helper functions for creating and inspecting errors

use super::types::BulkError;
use crate::services::bulk::BulkResult;
use serde_json::{Value, json};

/// Helper functions for creating specific errors
impl BulkError {
    pub fn invalid_parameter<S: Into<String>>(message: S) -> Self {
        Self::InvalidParameter {
            message: message.into(),
            context: Value::Null,
        }
    }

    pub fn invalid_parameter_with<S: Into<String>>(message: S, context: Value) -> Self {
        Self::InvalidParameter {
            message: message.into(),
            context,
        }
    }

    pub fn not_found<S: Into<String>>(message: S) -> Self {
        Self::NotFound {
            message: message.into(),
            context: Value::Null,
        }
    }

    pub fn not_found_with<S: Into<String>>(message: S, context: Value) -> Self {
        Self::NotFound {
            message: message.into(),
            context,
        }
    }

    pub fn rate_limit_with<S: Into<String>>(message: S, context: Value) -> Self {
        Self::RateLimit {
            message: message.into(),
            context,
        }
    }

    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal(message.into())
    }

    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidParameter { .. } => "INVALID_PARAMETER",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::RateLimit { .. } => "RATE_LIMIT",
            Self::BatchAborted { .. } => "BATCH_ABORTED",
            Self::Config(_) => "CONFIG",
            Self::Serialization(_) | Self::Yaml(_) | Self::Io(_) | Self::Internal(_) => "UNKNOWN",
        }
    }

    /// Structured context attached to the error
    ///
    /// For aborted batches this is the partial `successful`/`failed` lists
    /// together with the planned totals.
    pub fn context(&self) -> Value {
        match self {
            Self::InvalidParameter { context, .. }
            | Self::NotFound { context, .. }
            | Self::RateLimit { context, .. } => context.clone(),
            Self::BatchAborted { partial } => json!({
                "successful": partial.successful,
                "failed": partial.failed,
                "totals": partial.totals,
            }),
            _ => Value::Null,
        }
    }

    /// Partial result of an aborted batch
    pub fn partial_result(&self) -> Option<&BulkResult> {
        match self {
            Self::BatchAborted { partial } => Some(partial.as_ref()),
            _ => None,
        }
    }

    /// Whether the error was raised before any item was dispatched
    pub fn is_pre_dispatch(&self) -> bool {
        matches!(
            self,
            Self::InvalidParameter { .. } | Self::NotFound { .. } | Self::RateLimit { .. }
        )
    }
}
