//! Signal handling for graceful shutdown.
//!
//! A shutdown request is observed by every monitoring task at its next
//! round boundary, so an in-flight probe/notify/persist triple always
//! finishes before the task exits.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::broadcast;
use tracing::info;

/// Broadcast-based shutdown coordinator.
#[derive(Clone)]
pub(crate) struct SignalHandler {
    sender: broadcast::Sender<()>,
    shutdown_requested: Arc<AtomicBool>,
}

impl SignalHandler {
    /// Create a new signal handler.
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(16);
        Self {
            sender,
            shutdown_requested: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Subscribe to shutdown notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.sender.subscribe()
    }

    /// Request shutdown.
    pub fn request_shutdown(&self) {
        self.shutdown_requested.store(true, Ordering::SeqCst);
        let _ = self.sender.send(());
    }

    /// Check if shutdown has been requested.
    pub fn is_shutdown_requested(&self) -> bool {
        self.shutdown_requested.load(Ordering::SeqCst)
    }

    /// Set up OS signal handlers (Unix only).
    #[cfg(unix)]
    pub async fn setup_os_signals(&self) -> anyhow::Result<()> {
        use tokio::signal::unix::{SignalKind, signal};

        let mut sigterm = signal(SignalKind::terminate())?;
        let sigterm_handler = self.clone();
        tokio::spawn(async move {
            while sigterm.recv().await.is_some() {
                info!("Received SIGTERM");
                sigterm_handler.request_shutdown();
            }
        });

        let mut sigint = signal(SignalKind::interrupt())?;
        let sigint_handler = self.clone();
        tokio::spawn(async move {
            while sigint.recv().await.is_some() {
                info!("Received SIGINT");
                sigint_handler.request_shutdown();
            }
        });

        Ok(())
    }

    /// Set up OS signal handlers (non-Unix fallback).
    #[cfg(not(unix))]
    pub async fn setup_os_signals(&self) -> anyhow::Result<()> {
        let handler = self.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Received Ctrl-C");
                handler.request_shutdown();
            }
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_shutdown_reaches_subscribers() {
        let handler = SignalHandler::new();
        let mut rx = handler.subscribe();

        assert!(!handler.is_shutdown_requested());
        handler.request_shutdown();

        assert!(handler.is_shutdown_requested());
        rx.recv().await.unwrap();
    }

    #[tokio::test]
    async fn test_late_subscriber_sees_flag() {
        let handler = SignalHandler::new();
        handler.request_shutdown();

        // The broadcast is gone, but the flag persists.
        assert!(handler.is_shutdown_requested());
    }
}
