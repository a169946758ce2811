//! Batch execution types
//!
//! Options, per-item outcomes, aggregate results and progress snapshots shared by
//! the retry executor and the batch coordinator.

use super::progress::ProgressSink;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Default number of items per chunk
pub const DEFAULT_BATCH_SIZE: usize = 10;
/// Default number of simultaneously in-flight processor calls
pub const DEFAULT_CONCURRENCY: usize = 3;
/// Default number of retries after the first attempt
pub const DEFAULT_RETRY_COUNT: u32 = 3;
/// Default base delay between retries
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);
/// Upper bound applied to any concurrency override
pub const MAX_CONCURRENCY: usize = 10;

/// Runtime options controlling batch execution
///
/// Options are immutable once a run starts. Derive per-call options from
/// process-wide defaults with [`BatchOptions::with_overrides`].
#[derive(Clone)]
pub struct BatchOptions {
    /// Items per chunk (>= 1)
    pub batch_size: usize,
    /// Maximum in-flight processor invocations across the whole run (>= 1)
    pub concurrency: usize,
    /// Retries after the first failed attempt
    pub retry_count: u32,
    /// Base delay before a retry
    pub retry_delay: Duration,
    /// Double the delay on every subsequent retry
    pub exponential_backoff: bool,
    /// Keep attempting remaining items after a failure
    pub continue_on_error: bool,
    /// Invoked after every terminal item outcome
    pub progress: Option<Arc<dyn ProgressSink>>,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            concurrency: DEFAULT_CONCURRENCY,
            retry_count: DEFAULT_RETRY_COUNT,
            retry_delay: DEFAULT_RETRY_DELAY,
            exponential_backoff: true,
            continue_on_error: true,
            progress: None,
        }
    }
}

impl fmt::Debug for BatchOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchOptions")
            .field("batch_size", &self.batch_size)
            .field("concurrency", &self.concurrency)
            .field("retry_count", &self.retry_count)
            .field("retry_delay", &self.retry_delay)
            .field("exponential_backoff", &self.exponential_backoff)
            .field("continue_on_error", &self.continue_on_error)
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

impl BatchOptions {
    /// Create options with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set chunk size
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Set concurrency limit
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.clamp(1, MAX_CONCURRENCY);
        self
    }

    /// Set retry count
    pub fn with_retry_count(mut self, retry_count: u32) -> Self {
        self.retry_count = retry_count;
        self
    }

    /// Set base retry delay
    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    /// Enable or disable exponential backoff
    pub fn with_exponential_backoff(mut self, exponential_backoff: bool) -> Self {
        self.exponential_backoff = exponential_backoff;
        self
    }

    /// Set whether to continue on individual errors
    pub fn with_continue_on_error(mut self, continue_on_error: bool) -> Self {
        self.continue_on_error = continue_on_error;
        self
    }

    /// Attach a progress sink
    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Overlay caller overrides onto these options
    ///
    /// A present override always wins and an absent one falls back to `self`.
    /// Numeric overrides are floored to their minimum and concurrency is capped
    /// at [`MAX_CONCURRENCY`].
    pub fn with_overrides(&self, overrides: &BatchOverrides) -> Self {
        let retry_delay = match overrides.retry_delay {
            Some(secs) if secs.is_finite() && secs > 0.0 => {
                Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
            }
            Some(_) => Duration::ZERO,
            None => self.retry_delay,
        };

        Self {
            batch_size: overrides.batch_size.unwrap_or(self.batch_size).max(1),
            concurrency: overrides
                .concurrency
                .unwrap_or(self.concurrency)
                .clamp(1, MAX_CONCURRENCY),
            retry_count: overrides.retry_count.unwrap_or(self.retry_count),
            retry_delay,
            exponential_backoff: overrides
                .exponential_backoff
                .unwrap_or(self.exponential_backoff),
            continue_on_error: overrides.continue_on_error.unwrap_or(self.continue_on_error),
            progress: overrides.progress.clone().or_else(|| self.progress.clone()),
        }
    }
}

/// Caller-supplied overrides for [`BatchOptions`]
///
/// Deserializes from a tool's `options` object; `retry_delay` is in seconds.
#[derive(Clone, Default, Deserialize)]
pub struct BatchOverrides {
    #[serde(default)]
    pub batch_size: Option<usize>,
    #[serde(default)]
    pub concurrency: Option<usize>,
    #[serde(default)]
    pub retry_count: Option<u32>,
    #[serde(default)]
    pub retry_delay: Option<f64>,
    #[serde(default)]
    pub exponential_backoff: Option<bool>,
    #[serde(default)]
    pub continue_on_error: Option<bool>,
    #[serde(skip)]
    pub progress: Option<Arc<dyn ProgressSink>>,
}

impl fmt::Debug for BatchOverrides {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchOverrides")
            .field("batch_size", &self.batch_size)
            .field("concurrency", &self.concurrency)
            .field("retry_count", &self.retry_count)
            .field("retry_delay", &self.retry_delay)
            .field("exponential_backoff", &self.exponential_backoff)
            .field("continue_on_error", &self.continue_on_error)
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

/// An item paired with its position in the input sequence
#[derive(Debug, Clone, PartialEq)]
pub struct BatchItem<I> {
    pub index: usize,
    pub item: I,
}

/// Transient per-item attempt state
#[derive(Debug)]
pub(crate) struct Attempt<'a, I> {
    pub attempt_number: u32,
    pub item: &'a I,
    pub index: usize,
}

/// An item whose retries were exhausted
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailureRecord<I> {
    pub item: I,
    pub error: String,
    pub index: usize,
}

/// Success, failure and planned counts for a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchTotals {
    pub success: usize,
    pub failure: usize,
    pub total: usize,
}

/// Aggregate result of a batch run
///
/// Entries in `successful` and `failed` are in completion order. `totals.total`
/// is the planned item count, which exceeds the attempted count when a run is
/// halted early.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchResult<I, O> {
    pub successful: Vec<O>,
    pub failed: Vec<FailureRecord<I>>,
    pub totals: BatchTotals,
}

impl<I, O> Default for BatchResult<I, O> {
    fn default() -> Self {
        Self {
            successful: Vec::new(),
            failed: Vec::new(),
            totals: BatchTotals::default(),
        }
    }
}

impl<I, O> BatchResult<I, O> {
    /// Empty result planned for `total` items
    pub fn planned(total: usize) -> Self {
        Self {
            totals: BatchTotals {
                total,
                ..BatchTotals::default()
            },
            ..Self::default()
        }
    }

    /// Number of items that reached a terminal outcome
    pub fn attempted(&self) -> usize {
        self.totals.success + self.totals.failure
    }

    /// Planned items that were never dispatched
    pub fn skipped(&self) -> usize {
        self.totals.total.saturating_sub(self.attempted())
    }

    pub(crate) fn record_success(&mut self, output: O) {
        self.successful.push(output);
        self.totals.success += 1;
    }

    pub(crate) fn record_failure(&mut self, failure: FailureRecord<I>) {
        self.failed.push(failure);
        self.totals.failure += 1;
    }

    pub(crate) fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            completed: self.attempted(),
            success: self.totals.success,
            failure: self.totals.failure,
            total: self.totals.total,
        }
    }

    /// Replace the item type carried by failure records
    pub fn map_failed_items<J>(self, mut f: impl FnMut(I) -> J) -> BatchResult<J, O> {
        BatchResult {
            successful: self.successful,
            failed: self
                .failed
                .into_iter()
                .map(|record| FailureRecord {
                    item: f(record.item),
                    error: record.error,
                    index: record.index,
                })
                .collect(),
            totals: self.totals,
        }
    }
}

/// Progress emitted after every terminal item outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProgressSnapshot {
    pub completed: usize,
    pub success: usize,
    pub failure: usize,
    pub total: usize,
}

/// Terminal outcome of one item
#[derive(Debug)]
pub(crate) enum ItemOutcome<I, O> {
    Succeeded(O),
    Failed(FailureRecord<I>),
    /// The run halted before the item was dispatched
    Skipped,
}
