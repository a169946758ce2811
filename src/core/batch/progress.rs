//! Progress reporting for batch runs

use super::types::ProgressSnapshot;
use async_trait::async_trait;
use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::warn;

/// Receives a snapshot after every terminal item outcome
///
/// Errors returned by a sink are logged and never abort the run.
#[async_trait]
pub trait ProgressSink: Send + Sync {
    async fn on_progress(&self, snapshot: ProgressSnapshot) -> anyhow::Result<()>;
}

/// Adapter for synchronous closures
pub struct FnProgress<F>(F);

#[async_trait]
impl<F> ProgressSink for FnProgress<F>
where
    F: Fn(ProgressSnapshot) + Send + Sync,
{
    async fn on_progress(&self, snapshot: ProgressSnapshot) -> anyhow::Result<()> {
        (self.0)(snapshot);
        Ok(())
    }
}

/// Adapter for closures returning a future
pub struct AsyncFnProgress<F>(F);

#[async_trait]
impl<F, Fut> ProgressSink for AsyncFnProgress<F>
where
    F: Fn(ProgressSnapshot) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<()>> + Send,
{
    async fn on_progress(&self, snapshot: ProgressSnapshot) -> anyhow::Result<()> {
        (self.0)(snapshot).await
    }
}

/// Wrap a synchronous closure as a progress sink
pub fn progress_fn<F>(f: F) -> Arc<dyn ProgressSink>
where
    F: Fn(ProgressSnapshot) + Send + Sync + 'static,
{
    Arc::new(FnProgress(f))
}

/// Wrap an async closure as a progress sink
pub fn progress_async_fn<F, Fut>(f: F) -> Arc<dyn ProgressSink>
where
    F: Fn(ProgressSnapshot) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Arc::new(AsyncFnProgress(f))
}

/// Deliver a snapshot, containing sink errors and panics
pub(crate) async fn emit_progress(sink: Option<&Arc<dyn ProgressSink>>, snapshot: ProgressSnapshot) {
    let Some(sink) = sink else {
        return;
    };

    match AssertUnwindSafe(sink.on_progress(snapshot))
        .catch_unwind()
        .await
    {
        Ok(Ok(())) => {}
        Ok(Err(error)) => warn!(
            completed = snapshot.completed,
            total = snapshot.total,
            error = %error,
            "Progress callback failed"
        ),
        Err(_) => warn!(
            completed = snapshot.completed,
            total = snapshot.total,
            "Progress callback panicked"
        ),
    }
}
