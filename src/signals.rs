//! Interrupt handling.
//!
//! [`shutdown_signal`] resolves on SIGINT or SIGTERM (Ctrl+C on Windows).
//! The message loop races it against the next frame.

use tokio::signal;

/// Waits for a termination signal.
///
/// If the platform handler cannot be installed the error is logged and the
/// future never resolves, so the session runs until the server closes it.
pub async fn shutdown_signal() {
    match wait_for_signal().await {
        Ok(()) => tracing::info!("received shutdown signal"),
        Err(err) => {
            tracing::error!(error = %err, "failed to install signal handler");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(unix)]
async fn wait_for_signal() -> std::io::Result<()> {
    use signal::unix::{SignalKind, signal};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;

    tokio::select! {
        _ = sigint.recv() => (),
        _ = sigterm.recv() => (),
    }
    Ok(())
}

#[cfg(not(unix))]
async fn wait_for_signal() -> std::io::Result<()> {
    signal::ctrl_c().await
}
