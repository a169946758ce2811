//! Utility modules
//!
//! - **error**: error types and tool-facing error bodies
//! - **logging**: tracing subscriber setup

pub mod error;
pub mod logging;
