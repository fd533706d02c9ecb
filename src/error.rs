//! Monitor error types.
//!
//! [`MonitorError`] is the central error type for the client. Errors split
//! into two classes:
//!
//! | Class     | Variants                                   | Effect                      |
//! |-----------|--------------------------------------------|-----------------------------|
//! | Fatal     | `InvalidUrl`, `Connect`, `Transport`, `Output` | session ends, exit non-zero |
//! | Per-frame | `Decode`                                   | reported, loop continues    |

use tokio_tungstenite::tungstenite;

/// Client-side error enum.
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    /// The configured URL is not a `ws://` or `wss://` URL.
    #[error("invalid websocket url `{0}`: expected ws:// or wss://")]
    InvalidUrl(String),

    /// The WebSocket handshake failed.
    #[error("connect failed: {0}")]
    Connect(Box<tungstenite::Error>),

    /// Reading from or writing to an open connection failed.
    #[error("transport error: {0}")]
    Transport(Box<tungstenite::Error>),

    /// A frame could not be interpreted.
    #[error("{0}")]
    Decode(#[from] serde_json::Error),

    /// Writing to the console failed.
    #[error("console write failed: {0}")]
    Output(#[from] std::io::Error),
}

impl MonitorError {
    /// Returns `true` if the error must end the session.
    ///
    /// Only per-frame decode errors are recoverable.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        !matches!(self, Self::Decode(_))
    }

    /// Wraps a handshake error.
    #[must_use]
    pub fn connect(error: tungstenite::Error) -> Self {
        Self::Connect(Box::new(error))
    }

    /// Wraps an error on an established connection.
    #[must_use]
    pub fn transport(error: tungstenite::Error) -> Self {
        Self::Transport(Box::new(error))
    }
}
