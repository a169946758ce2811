//! Bulk batch execution engine
//!
//! This module applies one operation to many independent items against a
//! remote service with finite capacity: fixed-size chunking, a run-wide
//! capacity gate, per-item retries with exponential backoff and jitter, and
//! partial-failure aggregation.

mod bridge;
mod chunk;
mod coordinator;
mod progress;
mod retry;
mod types;


// Re-export all public types
pub use bridge::{BridgeError, SchedulerContext, run_blocking};
pub use chunk::{IndexedChunks, chunks, indexed_chunks};
pub use coordinator::{BatchAborted, BatchExecutor, process_batch};
pub use progress::{AsyncFnProgress, FnProgress, ProgressSink, progress_async_fn, progress_fn};
pub use retry::{JITTER_FACTOR, backoff_delay, jitter_bound, with_jitter};
pub use types::{
    BatchItem, BatchOptions, BatchOverrides, BatchResult, BatchTotals, DEFAULT_BATCH_SIZE,
    DEFAULT_CONCURRENCY, DEFAULT_RETRY_COUNT, DEFAULT_RETRY_DELAY, FailureRecord, MAX_CONCURRENCY,
    ProgressSnapshot,
};
