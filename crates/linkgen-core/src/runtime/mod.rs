//! Process runtime: task lifecycle and graceful shutdown.
//!
//! The scheduler tick loop and the queue consumer loop are both spawned
//! through [`Runtime`], which owns one [`CancellationToken`] shared by
//! every task and drains their `JoinHandle`s with a bounded timeout on
//! shutdown.

use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Fallback drain timeout for a runtime built with [`Runtime::new`], used
/// outside the CLI (e.g. in tests) where no `Config::shutdown_timeout_secs`
/// is available.
const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// Runtime that manages concurrent task lifecycles.
///
/// The runtime owns a `CancellationToken` shared by all spawned tasks,
/// the scheduler tick loop and the draft-generation queue consumer among
/// them, and collects their `JoinHandle`s for graceful shutdown. It does
/// not own specific business dependencies -- those are passed when
/// spawning individual tasks.
pub struct Runtime {
    cancel: CancellationToken,
    handles: Vec<(String, JoinHandle<()>)>,
    shutdown_timeout: Duration,
}

impl Runtime {
    /// Create a new runtime with a fresh cancellation token and the
    /// default drain timeout.
    pub fn new() -> Self {
        Self::with_shutdown_timeout(DEFAULT_SHUTDOWN_TIMEOUT)
    }

    /// Create a new runtime whose shutdown drain is bounded by
    /// `shutdown_timeout`, typically sourced from
    /// `Config::shutdown_timeout_secs` (spec's configurable
    /// `shutdownTimeout`).
    pub fn with_shutdown_timeout(shutdown_timeout: Duration) -> Self {
        Self {
            cancel: CancellationToken::new(),
            handles: Vec::new(),
            shutdown_timeout,
        }
    }

    /// Return a clone of the cancellation token for passing to tasks.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Spawn a task with a descriptive name.
    ///
    /// The task's `JoinHandle` is tracked for shutdown. The task should
    /// observe its `CancellationToken` to exit gracefully when shutdown
    /// is initiated.
    pub fn spawn<F>(&mut self, name: impl Into<String>, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let name = name.into();
        tracing::info!(task = %name, "spawning task");
        let handle = tokio::spawn(future);
        self.handles.push((name, handle));
    }

    /// Return the number of tracked tasks.
    pub fn task_count(&self) -> usize {
        self.handles.len()
    }

    /// Initiate graceful shutdown.
    ///
    /// 1. Cancels the token, signaling all tasks to stop.
    /// 2. Awaits all `JoinHandle`s with a bounded timeout.
    /// 3. If the timeout is exceeded, logs a warning; remaining tasks are
    ///    abandoned (not aborted) and will be reaped when the process exits.
    pub async fn shutdown(&mut self) {
        tracing::info!("initiating graceful shutdown");
        self.cancel.cancel();

        let handles: Vec<_> = self.handles.drain(..).collect();

        let drain = async {
            for (name, handle) in handles {
                match handle.await {
                    Ok(()) => tracing::info!(task = %name, "task completed cleanly"),
                    Err(e) => tracing::warn!(task = %name, error = %e, "task panicked during shutdown"),
                }
            }
        };

        if tokio::time::timeout(self.shutdown_timeout, drain).await.is_err() {
            tracing::warn!(
                timeout_secs = self.shutdown_timeout.as_secs(),
                "shutdown timeout exceeded, some tasks may still be running"
            );
        } else {
            tracing::info!("graceful shutdown complete");
        }
    }

    /// Block until a shutdown signal is received, then gracefully stop all tasks.
    pub async fn run_until_shutdown(mut self) {
        wait_for_shutdown_signal().await;
        self.shutdown().await;
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

/// Wait for an OS shutdown signal (Ctrl+C or SIGTERM).
///
/// On Unix, listens for both Ctrl+C and SIGTERM. On other platforms,
/// listens for Ctrl+C only.
pub async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(error = %e, "failed to register SIGTERM handler, using Ctrl+C only");
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::error!(error = %e, "failed to listen for Ctrl+C");
                } else {
                    tracing::info!("received Ctrl+C");
                }
                return;
            }
        };

        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                if let Err(e) = result {
                    tracing::error!(error = %e, "Ctrl+C handler error");
                }
                tracing::info!("received Ctrl+C");
            }
            _ = sigterm.recv() => {
                tracing::info!("received SIGTERM");
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
        } else {
            tracing::info!("received Ctrl+C");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn spawned_tasks_observe_shared_cancellation_and_drain_on_shutdown() {
        let mut runtime = Runtime::new();
        let counter = Arc::new(AtomicU32::new(0));

        for i in 0..3 {
            let cancel = runtime.cancel_token();
            let counter = counter.clone();
            runtime.spawn(format!("scheduler-or-consumer-{i}"), async move {
                counter.fetch_add(1, Ordering::SeqCst);
                cancel.cancelled().await;
            });
        }
        assert_eq!(runtime.task_count(), 3);

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 3);

        runtime.shutdown().await;
        assert_eq!(runtime.task_count(), 0);
    }

    #[tokio::test]
    async fn shutdown_respects_configured_timeout_not_the_default() {
        let mut runtime = Runtime::with_shutdown_timeout(Duration::from_millis(20));
        let cancel = runtime.cancel_token();

        runtime.spawn("stuck-task", async move {
            cancel.cancelled().await;
            tokio::time::sleep(Duration::from_secs(5)).await;
        });

        let start = tokio::time::Instant::now();
        runtime.shutdown().await;

        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn default_impl_uses_the_default_timeout() {
        let runtime = Runtime::default();
        assert_eq!(runtime.shutdown_timeout, DEFAULT_SHUTDOWN_TIMEOUT);
        assert_eq!(runtime.task_count(), 0);
    }
}
