//! Shutdown coordination for the host.

use tokio_util::sync::CancellationToken;

/// Coordinator for graceful and forced shutdown.
///
/// `graceful` fires on the first termination request; the driver stops
/// waiting for traffic and runs the stop phase. `forced` fires on the
/// second and cancels the stop wait itself.
#[derive(Debug, Clone, Default)]
pub struct Shutdown {
    graceful: CancellationToken,
    forced: CancellationToken,
}

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Token cancelled when graceful shutdown begins.
    pub fn graceful_token(&self) -> CancellationToken {
        self.graceful.clone()
    }

    /// Token cancelled when shutdown is forced.
    pub fn forced_token(&self) -> CancellationToken {
        self.forced.clone()
    }

    /// Trigger the shutdown signal. A second trigger forces shutdown.
    pub fn trigger(&self) {
        if self.graceful.is_cancelled() {
            self.force();
        } else {
            tracing::info!("Graceful shutdown requested");
            self.graceful.cancel();
        }
    }

    /// Force shutdown immediately. Implies graceful.
    pub fn force(&self) {
        tracing::warn!("Forced shutdown requested");
        self.graceful.cancel();
        self.forced.cancel();
    }

    pub fn is_triggered(&self) -> bool {
        self.graceful.is_cancelled()
    }

    pub fn is_forced(&self) -> bool {
        self.forced.is_cancelled()
    }

    /// Wait until graceful shutdown begins.
    pub async fn wait(&self) {
        self.graceful.cancelled().await;
    }
}
