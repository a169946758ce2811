//! Type conversions into BulkError

use super::types::BulkError;
use crate::core::batch::{BatchAborted, BridgeError};
use crate::services::bulk::TaskEntry;
use serde_json::Value;

impl From<BatchAborted<TaskEntry, Value>> for BulkError {
    fn from(aborted: BatchAborted<TaskEntry, Value>) -> Self {
        Self::BatchAborted {
            partial: Box::new(aborted.partial),
        }
    }
}

impl From<BridgeError> for BulkError {
    fn from(err: BridgeError) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<tokio::task::JoinError> for BulkError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Internal(format!("Background task failed: {}", err))
    }
}
