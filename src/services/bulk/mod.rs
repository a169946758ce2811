//! Bulk task operations
//!
//! Turns high-level requests such as "create these N tasks" into per-item
//! requests fed to the batch engine. Identifier resolution and payload
//! validation happen before dispatch, so structural problems surface as a
//! single error and are never retried.

mod client;
mod lookup;
mod payload;
mod service;


use crate::core::batch::BatchResult;
use serde_json::{Map, Value};

pub use client::{
    ApiRequest, ClientError, HttpMethod, IdentifierResolver, ResolveContext, ResourceKind,
    TaskClient,
};
pub use lookup::{TaskLookup, is_standard_task_id};
pub use payload::{build_create_payload, build_task_query, build_update_payload};
pub use service::{BulkOperation, BulkRequest, BulkService, ListSelector, PreparedTask};

/// One caller-supplied task entry, a JSON object
pub type TaskEntry = Map<String, Value>;

/// Result of a bulk call: API responses for successes, original entries for failures
pub type BulkResult = BatchResult<TaskEntry, Value>;
