//! WebSocket layer: session handling, message types, subscriptions.
//!
//! The client opens one connection, subscribes to its topics, and renders
//! every message the server pushes until shutdown.

pub mod connection;
pub mod messages;
pub mod subscription;
