//! Blocking entry point for async batch runs
//!
//! A tokio runtime cannot be entered from a thread that is already driving one.
//! [`run_blocking`] therefore takes an explicit [`SchedulerContext`]: detached
//! callers get a fresh runtime on their own thread, callers inside a runtime get
//! a dedicated worker thread with its own runtime.

use std::future::Future;
use std::thread;
use thiserror::Error;
use tracing::debug;

const BRIDGE_THREAD_NAME: &str = "bulk-bridge";

/// Whether the calling thread is already driving an async runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerContext {
    /// Plain blocking call site
    Detached,
    /// Called from code running on a tokio runtime
    InsideRuntime,
}

impl SchedulerContext {
    /// Inspect the current thread
    pub fn detect() -> Self {
        if tokio::runtime::Handle::try_current().is_ok() {
            Self::InsideRuntime
        } else {
            Self::Detached
        }
    }
}

/// Failures of the bridge itself; the future's own output is passed through
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("Failed to build runtime: {0}")]
    Runtime(#[from] std::io::Error),

    #[error("Failed to spawn bridge worker: {0}")]
    Spawn(std::io::Error),
}

/// Run the future produced by `make_future` to completion and return its output
///
/// With [`SchedulerContext::InsideRuntime`] the calling thread blocks until the
/// worker finishes. A panic on the worker is resumed on the caller.
pub fn run_blocking<F, Fut, T>(context: SchedulerContext, make_future: F) -> Result<T, BridgeError>
where
    F: FnOnce() -> Fut + Send,
    Fut: Future<Output = T>,
    T: Send,
{
    match context {
        SchedulerContext::Detached => block_on_fresh_runtime(make_future),
        SchedulerContext::InsideRuntime => {
            debug!("Runtime already active, running batch on a dedicated thread");
            thread::scope(|scope| {
                let worker = thread::Builder::new()
                    .name(BRIDGE_THREAD_NAME.to_string())
                    .spawn_scoped(scope, move || block_on_fresh_runtime(make_future))
                    .map_err(BridgeError::Spawn)?;

                match worker.join() {
                    Ok(output) => output,
                    Err(panic) => std::panic::resume_unwind(panic),
                }
            })
        }
    }
}

fn block_on_fresh_runtime<F, Fut, T>(make_future: F) -> Result<T, BridgeError>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = T>,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    Ok(runtime.block_on(make_future()))
}
