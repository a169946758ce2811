//! Per-item execution with a shared capacity gate and exponential backoff

use super::types::{Attempt, BatchOptions, FailureRecord, ItemOutcome};
use rand::Rng;
use std::fmt::Display;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::{AcquireError, Notify, Semaphore, SemaphorePermit};
use tracing::debug;

/// Fraction of the base wait used as the upper bound for jitter
pub const JITTER_FACTOR: f64 = 0.25;

/// Base wait before retry number `attempt` (1-based), without jitter
///
/// With exponential backoff the wait is `retry_delay * 2^(attempt - 1)`.
pub fn backoff_delay(retry_delay: Duration, exponential: bool, attempt: u32) -> Duration {
    if retry_delay.is_zero() || !exponential {
        return retry_delay;
    }
    let exponent = attempt.saturating_sub(1).min(31);
    retry_delay.saturating_mul(1u32 << exponent)
}

/// Upper bound of the jitter added to `wait`
pub fn jitter_bound(wait: Duration) -> Duration {
    Duration::try_from_secs_f64(wait.as_secs_f64() * JITTER_FACTOR).unwrap_or(Duration::ZERO)
}

/// `wait` plus uniform jitter in `[0, wait * JITTER_FACTOR]`
pub fn with_jitter(wait: Duration) -> Duration {
    if wait.is_zero() {
        return wait;
    }
    let bound = jitter_bound(wait).as_secs_f64();
    let jitter = rand::thread_rng().gen_range(0.0..=bound);
    wait.saturating_add(Duration::try_from_secs_f64(jitter).unwrap_or(Duration::ZERO))
}

/// Run-wide halt bookkeeping shared by every item of one run
///
/// When halting on error is enabled, an item whose attempt failed but still
/// has retries left counts as a pending retry. First attempts of other items
/// wait until no retries are pending, so nothing new is dispatched ahead of a
/// failure that may still halt the run.
pub(crate) struct RunState {
    guarded: bool,
    halted: AtomicBool,
    retrying: AtomicUsize,
    settled: Notify,
}

impl RunState {
    pub(crate) fn new(continue_on_error: bool) -> Self {
        Self {
            guarded: !continue_on_error,
            halted: AtomicBool::new(false),
            retrying: AtomicUsize::new(0),
            settled: Notify::new(),
        }
    }

    pub(crate) fn is_halted(&self) -> bool {
        self.halted.load(Ordering::Acquire)
    }

    /// Stop dispatching; only has an effect when halting on error
    pub(crate) fn halt(&self) {
        if self.guarded {
            self.halted.store(true, Ordering::Release);
        }
    }

    fn retry_started(&self) {
        self.retrying.fetch_add(1, Ordering::AcqRel);
    }

    fn retry_finished(&self) {
        if self.retrying.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.settled.notify_waiters();
        }
    }

    fn has_pending_retries(&self) -> bool {
        self.retrying.load(Ordering::Acquire) > 0
    }

    async fn wait_for_retries(&self) {
        loop {
            let notified = self.settled.notified();
            if !self.has_pending_retries() {
                return;
            }
            notified.await;
        }
    }

    /// Permit for an item's first attempt, or `None` once the run has halted
    async fn admit<'g>(
        &self,
        gate: &'g Semaphore,
    ) -> Result<Option<SemaphorePermit<'g>>, AcquireError> {
        loop {
            self.wait_for_retries().await;
            let permit = gate.acquire().await?;
            if self.is_halted() {
                return Ok(None);
            }
            if !self.has_pending_retries() {
                return Ok(Some(permit));
            }
            // a retry became pending while queued on the gate
            drop(permit);
        }
    }
}

/// Run one item to a terminal outcome
///
/// Each attempt holds one permit of `gate`; backoff sleeps do not. An item that
/// obtains its first permit after the run halted is never dispatched.
pub(crate) async fn run_item<I, O, E, F, Fut>(
    index: usize,
    item: &I,
    processor: &F,
    gate: &Semaphore,
    options: &BatchOptions,
    state: &RunState,
) -> ItemOutcome<I, O>
where
    I: Clone,
    F: Fn(I) -> Fut,
    Fut: Future<Output = Result<O, E>>,
    E: Display,
{
    let mut attempt = Attempt {
        attempt_number: 0,
        item,
        index,
    };
    let mut pending_retry = false;

    loop {
        let acquired = if attempt.attempt_number == 0 {
            state.admit(gate).await
        } else {
            gate.acquire().await.map(Some)
        };
        let permit = match acquired {
            Ok(Some(permit)) => permit,
            Ok(None) => return ItemOutcome::Skipped,
            Err(_) => {
                if pending_retry {
                    state.retry_finished();
                }
                return ItemOutcome::Failed(FailureRecord {
                    item: attempt.item.clone(),
                    error: "capacity gate closed".to_string(),
                    index,
                });
            }
        };

        let error = match processor(attempt.item.clone()).await {
            Ok(output) => {
                if attempt.attempt_number > 0 {
                    debug!(index, attempt = attempt.attempt_number + 1, "Retry succeeded");
                }
                if pending_retry {
                    state.retry_finished();
                }
                return ItemOutcome::Succeeded(output);
            }
            Err(error) => error,
        };

        attempt.attempt_number += 1;
        if attempt.attempt_number > options.retry_count {
            debug!(
                index = attempt.index,
                attempts = attempt.attempt_number,
                error = %error,
                "Item failed after exhausting retries"
            );
            // halt before waking items held back by this retry
            state.halt();
            if pending_retry {
                state.retry_finished();
            }
            return ItemOutcome::Failed(FailureRecord {
                item: attempt.item.clone(),
                error: error.to_string(),
                index: attempt.index,
            });
        }

        if state.guarded && !pending_retry {
            state.retry_started();
            pending_retry = true;
        }
        drop(permit);

        let wait = with_jitter(backoff_delay(
            options.retry_delay,
            options.exponential_backoff,
            attempt.attempt_number,
        ));
        debug!(
            index = attempt.index,
            attempt = attempt.attempt_number,
            wait = ?wait,
            error = %error,
            "Item attempt failed, retrying"
        );
        if !wait.is_zero() {
            tokio::time::sleep(wait).await;
        }
    }
}
