//! Logging utilities
//!
//! Library code logs through `tracing` macros with structured fields. This
//! module installs a subscriber for binaries and tests that want output.

pub mod types;

pub use types::{LogFormat, LogLevel};

use crate::utils::error::{BulkError, Result};
use tracing_subscriber::EnvFilter;

/// Install a global `tracing` subscriber
///
/// `RUST_LOG` takes precedence over `level` when set. Installing a second
/// subscriber returns a configuration error instead of panicking.
pub fn init_tracing(level: LogLevel, format: LogFormat) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_directive()));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false);

    let installed = match format {
        LogFormat::Pretty => builder.try_init(),
        LogFormat::Json => builder.json().flatten_event(true).try_init(),
    };

    installed.map_err(|e| BulkError::config(format!("Failed to install tracing subscriber: {}", e)))
}
