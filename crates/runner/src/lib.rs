//! Runs the service's long-lived processes side by side and shuts them down together.
//!
//! Every process gets a clone of one [`CancellationToken`]. The token is cancelled when
//! a process fails or the host sends SIGINT/SIGTERM. After all processes stop, the
//! registered closers run concurrently under a timeout.
//!
//! ```no_run
//! use devices_runner::Runner;
//! use std::time::Duration;
//!
//! # async fn demo() -> anyhow::Result<()> {
//! Runner::new()
//!     .with_named_process("worker", |ctx| async move {
//!         ctx.cancelled().await;
//!         Ok(())
//!     })
//!     .with_closer(|| async { Ok(()) })
//!     .with_closer_timeout(Duration::from_secs(5))
//!     .run()
//!     .await
//! # }
//! ```

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

type BoxedResultFuture = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>>;

/// A long-lived process. Must return once the token is cancelled.
pub type AppProcess = Box<dyn FnOnce(CancellationToken) -> BoxedResultFuture + Send>;

/// Cleanup run after every process has stopped
pub type Closer = Box<dyn FnOnce() -> BoxedResultFuture + Send>;

pub struct Runner {
    app_processes: Vec<(String, AppProcess)>,
    closers: Vec<Closer>,
    closer_timeout: Duration,
    cancellation_token: CancellationToken,
}

impl Default for Runner {
    fn default() -> Self {
        Self::new()
    }
}

impl Runner {
    /// Runner with no processes and a 10 second closer timeout
    pub fn new() -> Self {
        Self {
            app_processes: Vec::new(),
            closers: Vec::new(),
            closer_timeout: Duration::from_secs(10),
            cancellation_token: CancellationToken::new(),
        }
    }

    pub fn with_named_process<F, Fut>(mut self, name: impl Into<String>, process: F) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.app_processes
            .push((name.into(), Box::new(|token| Box::pin(process(token)))));
        self
    }

    /// Closers run even when a process failed. A failing closer does not stop the others.
    pub fn with_closer<F, Fut>(mut self, closer: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.closers.push(Box::new(|| Box::pin(closer())));
        self
    }

    pub fn with_closer_timeout(mut self, timeout: Duration) -> Self {
        self.closer_timeout = timeout;
        self
    }

    /// Share a token with code outside the runner, e.g. to trigger shutdown.
    pub fn with_cancellation_token(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = token;
        self
    }

    /// Drive every process to completion, then run the closers.
    ///
    /// Returns the first process error, if any. Errors reported after shutdown began
    /// are logged and otherwise ignored.
    pub async fn run(self) -> anyhow::Result<()> {
        let token = self.cancellation_token;
        let mut join_set = JoinSet::new();

        for (name, process) in self.app_processes {
            let process_token = token.clone();
            debug!(process = %name, "Starting app process");
            join_set.spawn(async move { (name, process(process_token).await) });
        }

        let signal_task = tokio::spawn(wait_for_shutdown_signal(token.clone()));

        let mut first_error = None;
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((name, Ok(()))) => {
                    debug!(process = %name, "App process completed");
                }
                Ok((name, Err(err))) => {
                    if token.is_cancelled() {
                        warn!(process = %name, "App process failed during shutdown: {:#}", err);
                    } else {
                        error!(process = %name, "App process failed: {:#}", err);
                        first_error = Some(err.context(format!("process '{}' failed", name)));
                        token.cancel();
                    }
                }
                Err(join_err) => {
                    error!("App process panicked: {}", join_err);
                    if !token.is_cancelled() {
                        first_error = Some(anyhow::anyhow!("app process panicked: {}", join_err));
                        token.cancel();
                    }
                }
            }
        }

        signal_task.abort();

        if !self.closers.is_empty() {
            info!(timeout = ?self.closer_timeout, "Running closers");
            match tokio::time::timeout(self.closer_timeout, run_closers(self.closers)).await {
                Ok(()) => info!("All closers completed"),
                Err(_) => error!(timeout = ?self.closer_timeout, "Closers timed out"),
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => {
                info!("All app processes stopped");
                Ok(())
            }
        }
    }
}

async fn wait_for_shutdown_signal(token: CancellationToken) {
    tokio::select! {
        _ = token.cancelled() => {}
        _ = ctrl_c() => {
            info!("Received SIGINT");
            token.cancel();
        }
        _ = sigterm() => {
            info!("Received SIGTERM");
            token.cancel();
        }
    }
}

async fn ctrl_c() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for SIGINT: {}", err);
        std::future::pending::<()>().await;
    }
}

#[cfg(unix)]
async fn sigterm() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut stream) => {
            stream.recv().await;
        }
        Err(err) => {
            error!("Failed to listen for SIGTERM: {}", err);
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn sigterm() {
    std::future::pending::<()>().await;
}

async fn run_closers(closers: Vec<Closer>) {
    let mut closer_set = JoinSet::new();
    for closer in closers {
        closer_set.spawn(closer());
    }

    while let Some(joined) = closer_set.join_next().await {
        match joined {
            Ok(Ok(())) => debug!("Closer completed"),
            Ok(Err(err)) => error!("Closer failed: {:#}", err),
            Err(join_err) => error!("Closer panicked: {}", join_err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_external_cancellation_stops_processes_and_runs_closers() {
        let closer_called = Arc::new(AtomicBool::new(false));
        let flag = closer_called.clone();
        let token = CancellationToken::new();
        let trigger = token.clone();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let result = Runner::new()
            .with_named_process("sleeper", |ctx| async move {
                ctx.cancelled().await;
                Ok(())
            })
            .with_closer(move || async move {
                flag.store(true, Ordering::SeqCst);
                Ok(())
            })
            .with_cancellation_token(token)
            .run()
            .await;

        assert!(result.is_ok());
        assert!(closer_called.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_first_error_cancels_siblings_and_is_returned() {
        let sibling_stopped = Arc::new(AtomicBool::new(false));
        let flag = sibling_stopped.clone();

        let result = Runner::new()
            .with_named_process("failing", |_ctx| async move {
                Err(anyhow::anyhow!("bind failed"))
            })
            .with_named_process("sibling", move |ctx| async move {
                ctx.cancelled().await;
                flag.store(true, Ordering::SeqCst);
                Ok(())
            })
            .run()
            .await;

        let err = result.unwrap_err();
        assert!(format!("{:#}", err).contains("bind failed"));
        assert!(format!("{:#}", err).contains("failing"));
        assert!(sibling_stopped.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_all_closers_run_even_if_one_fails() {
        let count = Arc::new(AtomicUsize::new(0));
        let first = count.clone();
        let second = count.clone();

        let result = Runner::new()
            .with_named_process("done", |_ctx| async move { Ok(()) })
            .with_closer(move || async move {
                first.fetch_add(1, Ordering::SeqCst);
                Err(anyhow::anyhow!("flush failed"))
            })
            .with_closer(move || async move {
                second.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .run()
            .await;

        assert!(result.is_ok());
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_slow_closers_are_abandoned_after_timeout() {
        let started = std::time::Instant::now();

        let result = Runner::new()
            .with_named_process("done", |_ctx| async move { Ok(()) })
            .with_closer(|| async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(())
            })
            .with_closer_timeout(Duration::from_millis(50))
            .run()
            .await;

        assert!(result.is_ok());
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
