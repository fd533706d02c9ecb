//! # weft-monitor
//!
//! Console client for the Weft WebSocket API.
//!
//! Connects to a Weft server, subscribes to the `work` and `agents` topics,
//! and prints a human-readable line block for every event, stats update,
//! acknowledgement and error the server pushes.
//!
//! ## Architecture
//!
//! ```text
//! CLI (config/)
//!     │
//!     ├── Session loop (ws/connection)
//!     │       ├── ClientMessage / ServerMessage (ws/messages)
//!     │       └── SubscriptionTracker (ws/subscription)
//!     │
//!     ├── Renderer (render)
//!     │
//!     └── Typed payloads (domain/)
//! ```

pub mod config;
pub mod domain;
pub mod error;
pub mod render;
pub mod signals;
pub mod ws;
