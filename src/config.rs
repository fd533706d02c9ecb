//! Monitor configuration from the command line.
//!
//! The only setting is the WebSocket URL, taken from the first positional
//! argument. Query strings such as `?token=dev-token` pass through
//! untouched. Diagnostic log level comes from `RUST_LOG` (optionally set in
//! a `.env` file) and is handled in `main`.

use clap::Parser;

use crate::error::MonitorError;
use crate::ws::subscription::Topic;

/// URL used when none is given on the command line.
pub const DEFAULT_WS_URL: &str = "ws://localhost:3000/api/ws";

/// Command-line arguments.
#[derive(Debug, Parser)]
#[command(
    name = "weft-monitor",
    version,
    about = "Connects to the Weft WebSocket API and monitors work and agent events"
)]
pub struct Cli {
    /// WebSocket URL, e.g. ws://localhost:3000/api/ws?token=dev-token
    #[arg(default_value = DEFAULT_WS_URL)]
    pub url: String,
}

/// Validated monitor configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorConfig {
    /// WebSocket endpoint to connect to.
    pub url: String,

    /// Topics subscribed right after connecting, in send order.
    pub topics: Vec<Topic>,
}

impl MonitorConfig {
    /// Builds a configuration for `url` with the default topics.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::InvalidUrl`] if `url` does not start with
    /// `ws://` or `wss://`.
    pub fn new(url: impl Into<String>) -> Result<Self, MonitorError> {
        let url = url.into();
        if !(url.starts_with("ws://") || url.starts_with("wss://")) {
            return Err(MonitorError::InvalidUrl(url));
        }
        Ok(Self {
            url,
            topics: Topic::DEFAULT.to_vec(),
        })
    }

    /// Parses the process arguments.
    ///
    /// # Errors
    ///
    /// See [`MonitorConfig::new`]. Argument syntax errors are reported by
    /// `clap`, which exits the process.
    pub fn from_args() -> Result<Self, MonitorError> {
        Self::from_cli(Cli::parse())
    }

    /// Builds a configuration from already-parsed arguments.
    ///
    /// # Errors
    ///
    /// See [`MonitorConfig::new`].
    pub fn from_cli(cli: Cli) -> Result<Self, MonitorError> {
        Self::new(cli.url)
    }
}
