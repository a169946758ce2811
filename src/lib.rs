//! # clickup-bulk
//!
//! Concurrent bulk task operations for the ClickUp API.
//!
//! ## Features
//!
//! - **Batch engine**: fixed-size chunking with a run-wide concurrency cap
//! - **Retries**: per-item exponential backoff with jitter
//! - **Partial failure**: failed items are reported with their original entry and index
//! - **Halt on error**: optionally stop dispatching after the first exhausted item
//! - **Sync callers**: blocking entry points that work inside or outside a runtime
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use clickup_bulk::{BatchOptions, process_batch};
//!
//! #[tokio::main]
//! async fn main() {
//!     let options = BatchOptions::new().with_concurrency(2).with_batch_size(5);
//!     let result = process_batch(
//!         vec!["a", "b", "c"],
//!         |name| async move { Ok::<_, String>(name.to_uppercase()) },
//!         options,
//!     )
//!     .await
//!     .unwrap();
//!
//!     assert_eq!(result.totals.success, 3);
//! }
//! ```
//!
//! ## Bulk Service
//!
//! ```rust,ignore
//! use clickup_bulk::{BatchOverrides, BulkConfig, BulkService, ListSelector};
//!
//! let config = BulkConfig::from_env()?;
//! let service = BulkService::from_config(client, &config);
//! let result = service.create_bulk_tasks(
//!     tasks,
//!     ListSelector::name("Backlog"),
//!     config.default_team_id,
//!     &BatchOverrides::default(),
//! )?;
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_inception)]

pub mod config;
pub mod core;
pub mod services;
pub mod utils;

// Re-export main types
pub use config::{BulkConfig, Validate};
pub use core::batch::{
    BatchAborted, BatchExecutor, BatchOptions, BatchOverrides, BatchResult, BatchTotals,
    FailureRecord, ProgressSink, ProgressSnapshot, SchedulerContext, process_batch, progress_fn,
    run_blocking,
};
pub use services::bulk::{
    ApiRequest, BulkOperation, BulkRequest, BulkResult, BulkService, ClientError, HttpMethod,
    IdentifierResolver, ListSelector, ResolveContext, ResourceKind, TaskClient, TaskEntry,
};
pub use utils::error::{BulkError, ErrorResponse, Result};
pub use utils::logging::{LogFormat, LogLevel, init_tracing};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
