//! OS signal handling.
//!
//! # Responsibilities
//! - Listen for SIGINT (Ctrl+C) and, on unix, SIGTERM
//! - Translate each signal into a [`Shutdown`] trigger
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - The first signal starts graceful shutdown, the second forces it

use std::io;

use crate::lifecycle::shutdown::Shutdown;

/// Spawn a task that feeds termination signals into `shutdown` until
/// shutdown is forced.
pub fn spawn_signal_listener(shutdown: Shutdown) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while !shutdown.is_forced() {
            match wait_for_signal().await {
                Ok(name) => {
                    tracing::info!(signal = name, "Shutdown signal received");
                    shutdown.trigger();
                }
                Err(error) => {
                    tracing::error!(error = %error, "Failed to listen for shutdown signals");
                    return;
                }
            }
        }
    })
}

/// Wait for the next SIGINT or SIGTERM and return its name.
pub async fn wait_for_signal() -> io::Result<&'static str> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = signal(SignalKind::terminate())?;
        tokio::select! {
            result = tokio::signal::ctrl_c() => result.map(|()| "SIGINT"),
            _ = sigterm.recv() => Ok("SIGTERM"),
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await.map(|()| "SIGINT")
    }
}
