//! Error handling utilities
//!
//! This module defines the error taxonomy surfaced to bulk-operation callers.

pub mod error;

// Re-export commonly used types
pub use error::*;
