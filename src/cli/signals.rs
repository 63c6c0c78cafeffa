//! Ctrl+C handling for the recording session

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;

/// Shutdown signal for a recording session
pub struct ShutdownSignal {
    shutdown: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl ShutdownSignal {
    /// Create a new shutdown signal handler
    pub fn new() -> Self {
        Self {
            shutdown: Arc::new(AtomicBool::new(false)),
            notify: Arc::new(Notify::new()),
        }
    }

    /// Check if shutdown was requested
    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    /// Mark shutdown as requested and wake the waiter
    pub fn trigger(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
        self.notify.notify_one();
    }

    /// Resolve once shutdown was requested
    pub async fn wait(&self) {
        if self.is_shutdown() {
            return;
        }
        self.notify.notified().await;
    }

    /// Setup signal handler
    pub fn setup(&self) {
        let shutdown = Arc::clone(&self.shutdown);
        let notify = Arc::clone(&self.notify);

        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    tracing::debug!("Received Ctrl+C");
                    shutdown.store(true, Ordering::SeqCst);
                    notify.notify_one();
                }
                Err(e) => tracing::warn!("Failed to listen for Ctrl+C: {}", e),
            }
        });
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}
