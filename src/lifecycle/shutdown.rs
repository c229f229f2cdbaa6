//! Graceful Shutdown Handler
//!
//! Handles OS signals and performs graceful shutdown of the application.

use super::LifecycleManager;
use std::future::Future;
use std::sync::Arc;
use strum_macros::{AsRefStr, Display};
use tokio::signal;

/// The termination signal that ended the wait in [`shutdown_signal`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
pub enum ShutdownSignal {
    /// Ctrl+C / SIGINT
    #[strum(to_string = "SIGINT")]
    Interrupt,
    /// SIGTERM (unix only)
    #[strum(to_string = "SIGTERM")]
    Terminate,
}

/// Handles graceful shutdown of the application
///
/// ShutdownHandler waits for a termination signal and then runs the
/// lifecycle manager's close routine. Because close runs at most once, a
/// handler racing an explicit `Application::close` is harmless.
///
/// # Example
///
/// ```rust,ignore
/// let shutdown_handler = ShutdownHandler::new(Arc::clone(&lifecycle_manager));
///
/// tokio::spawn(async move {
///     shutdown_handler.wait_for_shutdown().await;
/// });
/// ```
pub struct ShutdownHandler {
    lifecycle_manager: Arc<LifecycleManager>,
}

impl ShutdownHandler {
    pub fn new(lifecycle_manager: Arc<LifecycleManager>) -> Self {
        Self { lifecycle_manager }
    }

    /// Wait for SIGINT or SIGTERM, then close the application
    pub async fn wait_for_shutdown(&self) {
        let received = shutdown_signal().await;
        tracing::info!(signal = %received, "Termination signal received");
        self.shutdown().await;
    }

    /// Wait for a caller-supplied signal future, then close the application
    pub async fn wait_for_shutdown_with<F>(&self, signal: F)
    where
        F: Future<Output = ()>,
    {
        signal.await;
        self.shutdown().await;
    }

    async fn shutdown(&self) {
        tracing::info!("Starting graceful shutdown...");

        if let Err(e) = self.lifecycle_manager.close().await {
            tracing::error!(error = %e, "Error during application close");
        }

        tracing::info!("Graceful shutdown complete");
    }
}

/// Create a future that completes when a termination signal is received
///
/// If a signal handler cannot be installed the failure is logged and that
/// signal is never reported.
///
/// # Example
///
/// ```rust,ignore
/// tokio::select! {
///     signal = shutdown_signal() => tracing::info!(%signal, "Stopping"),
///     _ = server => {}
/// }
/// ```
pub async fn shutdown_signal() -> ShutdownSignal {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => ShutdownSignal::Interrupt,
        _ = terminate => ShutdownSignal::Terminate,
    }
}
