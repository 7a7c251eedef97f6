//! Process signal handling.
//!
//! - SIGTERM and SIGINT (Ctrl+C elsewhere): graceful shutdown. The
//!   scheduler is stopped between runs, so an in-flight digest run is never
//!   cut short.
//! - SIGHUP: publish a fresh digest now, outside the regular cadence.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Listens for process signals and fans shutdown out to waiters.
pub struct SignalHandler {
    shutdown_tx: Arc<watch::Sender<bool>>,
    shutdown_rx: watch::Receiver<bool>,
    /// Bumped once per refresh request.
    refresh_tx: Arc<watch::Sender<u64>>,
    refresh_rx: watch::Receiver<u64>,
}

impl Default for SignalHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalHandler {
    /// Creates a new signal handler.
    pub fn new() -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (refresh_tx, refresh_rx) = watch::channel(0);
        Self {
            shutdown_tx: Arc::new(shutdown_tx),
            shutdown_rx,
            refresh_tx: Arc::new(refresh_tx),
            refresh_rx,
        }
    }

    /// Spawns the signal listener task.
    #[cfg(unix)]
    pub fn spawn_listener(&self) {
        use tokio::signal::unix::{SignalKind, signal};

        let shutdown_tx = self.shutdown_tx.clone();
        let refresh_tx = self.refresh_tx.clone();

        tokio::spawn(async move {
            let installed = (
                signal(SignalKind::terminate()),
                signal(SignalKind::interrupt()),
                signal(SignalKind::hangup()),
            );
            let (mut sigterm, mut sigint, mut sighup) = match installed {
                (Ok(sigterm), Ok(sigint), Ok(sighup)) => (sigterm, sigint, sighup),
                (Err(e), _, _) | (_, Err(e), _) | (_, _, Err(e)) => {
                    warn!(error = %e, "Failed to install signal handlers, falling back to Ctrl+C");
                    if tokio::signal::ctrl_c().await.is_ok() {
                        info!("Received Ctrl+C, initiating shutdown");
                        let _ = shutdown_tx.send(true);
                    }
                    return;
                }
            };

            loop {
                tokio::select! {
                    _ = sigterm.recv() => {
                        info!("Received SIGTERM, initiating shutdown");
                        break;
                    }
                    _ = sigint.recv() => {
                        info!("Received SIGINT, initiating shutdown");
                        break;
                    }
                    _ = sighup.recv() => {
                        info!("Received SIGHUP, publishing a fresh digest");
                        refresh_tx.send_modify(|requests| *requests += 1);
                    }
                }
            }
            let _ = shutdown_tx.send(true);
            debug!("Signal listener stopped");
        });
    }

    /// Spawns the signal listener task.
    #[cfg(not(unix))]
    pub fn spawn_listener(&self) {
        let shutdown_tx = self.shutdown_tx.clone();

        tokio::spawn(async move {
            if let Ok(()) = tokio::signal::ctrl_c().await {
                info!("Received Ctrl+C, initiating shutdown");
                let _ = shutdown_tx.send(true);
            }
        });
    }

    /// Returns a future that completes when shutdown is signaled.
    pub fn shutdown(&self) -> ShutdownSignal {
        ShutdownSignal {
            rx: self.shutdown_rx.clone(),
        }
    }

    /// Returns a stream of refresh requests.
    pub fn refresh(&self) -> RefreshSignal {
        RefreshSignal {
            rx: self.refresh_rx.clone(),
        }
    }

    /// Returns true if shutdown has been signaled.
    pub fn is_shutdown(&self) -> bool {
        *self.shutdown_rx.borrow()
    }

    /// Programmatically triggers a shutdown.
    pub fn trigger_shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    /// Programmatically requests a refresh.
    pub fn trigger_refresh(&self) {
        self.refresh_tx.send_modify(|requests| *requests += 1);
    }
}

/// Completes when shutdown is signaled.
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

impl ShutdownSignal {
    /// Waits for the shutdown signal.
    pub async fn wait(mut self) {
        // `wait_for` also returns immediately if shutdown was already sent;
        // a closed channel means no one can signal anymore.
        let _ = self.rx.wait_for(|shutdown| *shutdown).await;
    }
}

/// Yields once per refresh request.
pub struct RefreshSignal {
    rx: watch::Receiver<u64>,
}

impl RefreshSignal {
    /// Waits for the next refresh request.
    ///
    /// Requests that arrive while the caller is busy coalesce into one.
    /// Returns false once the handler is gone.
    pub async fn next(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }
}
