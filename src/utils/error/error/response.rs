//! Serializable error bodies returned to tool callers

use super::types::BulkError;
use serde::Serialize;
use serde_json::Value;

/// `{message, code, context}` body for a failed bulk call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorResponse {
    pub message: String,
    pub code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
}

impl BulkError {
    /// Render the error for a tool response
    pub fn to_response(&self) -> ErrorResponse {
        let context = match self.context() {
            Value::Null => None,
            Value::Object(map) if map.is_empty() => None,
            context => Some(context),
        };

        ErrorResponse {
            message: self.to_string(),
            code: self.code(),
            context,
        }
    }
}

impl From<&BulkError> for ErrorResponse {
    fn from(err: &BulkError) -> Self {
        err.to_response()
    }
}
