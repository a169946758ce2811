//! Batch coordinator
//!
//! Drives chunking and per-item retries across a whole input, aggregates
//! results in completion order, emits progress and enforces halt-on-error.

use super::chunk::indexed_chunks;
use super::progress::emit_progress;
use super::retry::{RunState, run_item};
use super::types::{BatchItem, BatchOptions, BatchResult, ItemOutcome, MAX_CONCURRENCY};
use futures::stream::{FuturesUnordered, StreamExt};
use std::fmt::{self, Debug, Display};
use std::future::Future;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

/// Returned when `continue_on_error` is false and an item failed
///
/// `partial` holds every outcome folded in before the run stopped;
/// `partial.totals.total` is still the planned input length.
pub struct BatchAborted<I, O> {
    pub partial: BatchResult<I, O>,
}

impl<I, O> Display for BatchAborted<I, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Batch processing halted due to failure.")
    }
}

impl<I: Debug, O: Debug> Debug for BatchAborted<I, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchAborted")
            .field("partial", &self.partial)
            .finish()
    }
}

impl<I: Debug, O: Debug> std::error::Error for BatchAborted<I, O> {}

/// Executes batches with a fixed set of options
pub struct BatchExecutor {
    options: BatchOptions,
}

impl BatchExecutor {
    /// Create a new batch executor
    pub fn new(options: BatchOptions) -> Self {
        Self { options }
    }

    /// Get current options
    pub fn options(&self) -> &BatchOptions {
        &self.options
    }

    /// Apply `processor` to every item
    ///
    /// Chunks are dispatched in order; items within a chunk run concurrently,
    /// bounded by a capacity gate shared across the whole run. Processor errors
    /// are retried per the options and then recorded in `failed`; they are only
    /// surfaced as an error when `continue_on_error` is false.
    ///
    /// # Example
    /// ```rust,ignore
    /// let executor = BatchExecutor::new(BatchOptions::new().with_concurrency(2));
    /// let result = executor
    ///     .run(vec!["a", "b"], |name| async move { client.create(name).await })
    ///     .await?;
    /// ```
    pub async fn run<I, O, E, F, Fut>(
        &self,
        items: Vec<I>,
        processor: F,
    ) -> Result<BatchResult<I, O>, BatchAborted<I, O>>
    where
        I: Clone,
        F: Fn(I) -> Fut,
        Fut: Future<Output = Result<O, E>>,
        E: Display,
    {
        let options = &self.options;
        let mut result = BatchResult::planned(items.len());
        if items.is_empty() {
            return Ok(result);
        }

        let gate = Semaphore::new(options.concurrency.clamp(1, MAX_CONCURRENCY));
        let state = RunState::new(options.continue_on_error);
        let mut halt_logged = false;

        for (chunk_number, (offset, chunk)) in
            indexed_chunks(&items, options.batch_size).enumerate()
        {
            if state.is_halted() {
                break;
            }
            debug!(chunk = chunk_number + 1, size = chunk.len(), offset, "Dispatching chunk");

            let mut in_flight: FuturesUnordered<_> = chunk
                .iter()
                .enumerate()
                .map(|(position, item)| BatchItem {
                    index: offset + position,
                    item,
                })
                .map(|entry| run_item(entry.index, entry.item, &processor, &gate, options, &state))
                .collect();

            while let Some(outcome) = in_flight.next().await {
                match outcome {
                    ItemOutcome::Succeeded(output) => result.record_success(output),
                    ItemOutcome::Failed(failure) => {
                        result.record_failure(failure);
                        state.halt();
                        if !options.continue_on_error && !halt_logged {
                            halt_logged = true;
                            warn!(
                                completed = result.attempted(),
                                total = result.totals.total,
                                "Halting batch after item failure"
                            );
                        }
                    }
                    ItemOutcome::Skipped => continue,
                }
                emit_progress(options.progress.as_ref(), result.snapshot()).await;
            }
        }

        if state.is_halted() {
            return Err(BatchAborted { partial: result });
        }
        Ok(result)
    }
}

impl Default for BatchExecutor {
    fn default() -> Self {
        Self::new(BatchOptions::default())
    }
}

/// Convenience function for running a batch without creating an executor
pub async fn process_batch<I, O, E, F, Fut>(
    items: Vec<I>,
    processor: F,
    options: BatchOptions,
) -> Result<BatchResult<I, O>, BatchAborted<I, O>>
where
    I: Clone,
    F: Fn(I) -> Fut,
    Fut: Future<Output = Result<O, E>>,
    E: Display,
{
    BatchExecutor::new(options).run(items, processor).await
}
