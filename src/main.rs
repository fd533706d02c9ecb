//! weft-monitor entry point.
//!
//! Runs one monitoring session against the WebSocket URL given on the
//! command line.

use std::io::{self, Write};
use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

use weft_monitor::config::MonitorConfig;
use weft_monitor::signals::shutdown_signal;
use weft_monitor::ws::connection::run_session;

#[tokio::main]
async fn main() -> ExitCode {
    // Optional .env for RUST_LOG
    dotenvy::dotenv().ok();

    // Diagnostics go to stderr; stdout is the rendered console
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let result = match MonitorConfig::from_args() {
        Ok(config) => run_session(&config, io::stdout(), shutdown_signal()).await,
        Err(err) => Err(err),
    };

    match result {
        Ok(end) => {
            tracing::debug!(?end, "exiting");
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!(error = %err, "session failed");
            // stdout may already be gone; the error is logged above.
            let _ = writeln!(io::stdout(), "WebSocket error: {err}");
            ExitCode::FAILURE
        }
    }
}
