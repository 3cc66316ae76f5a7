//! Graceful shutdown coordination
//!
//! A [`ShutdownCoordinator`] is shared between the signal listener and the
//! running service. Once shutdown is requested the engine stops accepting
//! triggers, in-flight cycles finish, and the instance lock is released.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

/// Shutdown flag observable from async code
#[derive(Clone)]
pub struct ShutdownCoordinator {
    watch_rx: watch::Receiver<bool>,
    watch_tx: Arc<watch::Sender<bool>>,
    is_shutting_down: Arc<AtomicBool>,
}

impl ShutdownCoordinator {
    pub fn new() -> Self {
        let (watch_tx, watch_rx) = watch::channel(false);
        Self {
            watch_rx,
            watch_tx: Arc::new(watch_tx),
            is_shutting_down: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Check if shutdown is in progress
    pub fn is_shutting_down(&self) -> bool {
        self.is_shutting_down.load(Ordering::SeqCst)
    }

    /// Request shutdown. Repeated calls are no-ops.
    pub fn shutdown(&self) {
        if self
            .is_shutting_down
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            info!("Initiating graceful shutdown");
            let _ = self.watch_tx.send(true);
        }
    }

    /// Resolve once shutdown has been requested
    pub async fn wait_for_shutdown(&self) {
        let mut rx = self.watch_rx.clone();
        while !*rx.borrow_and_update() {
            if rx.changed().await.is_err() {
                break;
            }
        }
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

/// Wait for a termination signal, then request shutdown
///
/// Listens for SIGINT and SIGTERM on Unix, Ctrl+C elsewhere. Fails only if
/// the handlers cannot be installed.
#[cfg(unix)]
pub async fn listen_for_signals(coordinator: ShutdownCoordinator) -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    tokio::select! {
        _ = sigterm.recv() => info!("Received SIGTERM"),
        _ = sigint.recv() => info!("Received SIGINT"),
        _ = coordinator.wait_for_shutdown() => return Ok(()),
    }

    coordinator.shutdown();
    Ok(())
}

#[cfg(not(unix))]
pub async fn listen_for_signals(coordinator: ShutdownCoordinator) -> std::io::Result<()> {
    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result?;
            info!("Received Ctrl+C");
        }
        _ = coordinator.wait_for_shutdown() => return Ok(()),
    }

    coordinator.shutdown();
    Ok(())
}
