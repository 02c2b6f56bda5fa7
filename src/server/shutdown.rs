use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Process-wide "shutting down" flag.
///
/// Polled, not awaited: the status reporter checks it once per tick.
#[derive(Debug, Clone, Default)]
pub struct ShutdownFlag(Arc<AtomicBool>);

impl ShutdownFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_triggered(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Wait for Ctrl-C / SIGINT and raise `flag`.
pub async fn listen_for_interrupt(flag: ShutdownFlag) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Interrupt received, shutting down");
            flag.trigger();
        }
        Err(err) => {
            tracing::error!(error = %err, "Failed to listen for interrupt signal");
        }
    }
}
