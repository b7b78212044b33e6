//! Runtime - timers, local task spawning and graceful shutdown
//!
//! The manager runs on a single-threaded event loop (a browser tab or a tokio
//! `LocalSet`). Everything time-related goes through [`Scheduler`] so tests
//! can drive it with paused time and the browser can use `setTimeout`.

use std::cell::Cell;
use std::future::Future;
use std::rc::Rc;
use std::time::Duration;

use futures::future::{self, AbortHandle, Either, LocalBoxFuture};

use crate::error::{WalletError, WalletResult};

/// Timer and spawner for the current event loop.
pub trait Scheduler {
    /// Resolve after `duration`.
    fn sleep(&self, duration: Duration) -> LocalBoxFuture<'static, ()>;

    /// Run a task on the current thread, detached.
    fn spawn_local(&self, task: LocalBoxFuture<'static, ()>);

    /// Run a task that can be cancelled through the returned handle.
    fn schedule(&self, task: LocalBoxFuture<'static, ()>) -> TaskHandle {
        let (task, abort) = future::abortable(task);
        let finished = Rc::new(Cell::new(false));
        let done = finished.clone();
        self.spawn_local(Box::pin(async move {
            let _ = task.await;
            done.set(true);
        }));
        TaskHandle { abort, finished }
    }
}

/// Handle to a scheduled task. Dropping it cancels the task.
#[derive(Debug)]
pub struct TaskHandle {
    abort: AbortHandle,
    finished: Rc<Cell<bool>>,
}

impl TaskHandle {
    pub fn cancel(&self) {
        self.abort.abort();
    }

    pub fn is_cancelled(&self) -> bool {
        self.abort.is_aborted()
    }

    /// True while the task has neither been cancelled nor completed.
    pub fn is_active(&self) -> bool {
        !self.is_cancelled() && !self.finished.get()
    }
}

impl Drop for TaskHandle {
    fn drop(&mut self) {
        self.abort.abort();
    }
}

/// Race `fut` against a timer. The loser is dropped, so a late result is
/// discarded rather than applied.
pub async fn with_timeout<T, F>(
    scheduler: &dyn Scheduler,
    after: Duration,
    operation: &str,
    fut: F,
) -> WalletResult<T>
where
    F: Future<Output = T>,
{
    let fut = std::pin::pin!(fut);
    match future::select(fut, scheduler.sleep(after)).await {
        Either::Left((value, _)) => Ok(value),
        Either::Right(_) => {
            tracing::debug!(operation, ?after, "operation timed out");
            Err(WalletError::timeout(operation, after))
        }
    }
}

// =============================================================================
// Native: tokio
// =============================================================================

/// Scheduler backed by tokio. Tasks must be spawned inside a `LocalSet`.
#[cfg(feature = "native")]
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioScheduler;

#[cfg(feature = "native")]
impl Scheduler for TokioScheduler {
    fn sleep(&self, duration: Duration) -> LocalBoxFuture<'static, ()> {
        Box::pin(tokio::time::sleep(duration))
    }

    fn spawn_local(&self, task: LocalBoxFuture<'static, ()>) {
        tokio::task::spawn_local(task);
    }
}

/// Resolve on SIGINT or SIGTERM (Ctrl+C elsewhere).
#[cfg(feature = "native")]
pub async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
            (Ok(mut sigterm), Ok(mut sigint)) => {
                tokio::select! {
                    _ = sigterm.recv() => tracing::info!("Received SIGTERM"),
                    _ = sigint.recv() => tracing::info!("Received SIGINT"),
                }
                return;
            }
            (Err(e), _) | (_, Err(e)) => {
                tracing::warn!(error = %e, "signal handlers unavailable, falling back to Ctrl+C");
            }
        }
    }

    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Received Ctrl+C"),
        Err(e) => {
            tracing::warn!(error = %e, "Ctrl+C handler unavailable");
            future::pending::<()>().await;
        }
    }
}
