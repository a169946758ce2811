//! Error handling for bulk operations
//!
//! This module defines all error types surfaced by the bulk service.

#![allow(missing_docs)]

mod conversions;
mod helpers;
mod response;
mod types;

// Re-export all public types
pub use response::ErrorResponse;
pub use types::{BulkError, Result};
