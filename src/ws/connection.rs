//! WebSocket session: connect, subscribe, and the message loop.
//!
//! A session is one connection handled on one task. The loop races the
//! next inbound frame against a shutdown future; frame-level failures are
//! reported to the console and never end the session.

use std::future::Future;
use std::io::Write;

use futures_util::{Sink, SinkExt, Stream, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use super::messages::{Ack, ClientMessage, ServerMessage};
use super::subscription::{SubscriptionTracker, Topic};
use crate::config::MonitorConfig;
use crate::error::MonitorError;
use crate::render::render;

/// Client WebSocket stream as returned by [`connect`].
pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// How a session ended without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The shutdown future resolved.
    Interrupted,
    /// The server sent a close frame or the stream ended.
    ServerClosed,
}

/// Opens the WebSocket connection. No retry.
///
/// # Errors
///
/// Returns [`MonitorError::Connect`] if the TCP connect or the WebSocket
/// handshake fails.
pub async fn connect(url: &str) -> Result<WsStream, MonitorError> {
    let (stream, response) = connect_async(url).await.map_err(MonitorError::connect)?;
    tracing::debug!(status = %response.status(), "websocket handshake complete");
    Ok(stream)
}

/// Runs a full session: connect, subscribe to the configured topics, then
/// render messages until shutdown or server close.
///
/// An interrupt while still connecting prints `Disconnected` and ends the
/// session without error.
///
/// # Errors
///
/// Returns the first fatal [`MonitorError`]; see [`MonitorError::is_fatal`].
pub async fn run_session<W, F>(
    config: &MonitorConfig,
    out: W,
    shutdown: F,
) -> Result<SessionEnd, MonitorError>
where
    W: Write,
    F: Future<Output = ()>,
{
    let mut monitor = Monitor::new(out);
    tokio::pin!(shutdown);

    monitor.print(&format!("Connecting to Weft WebSocket at {}...", config.url))?;
    tracing::info!(url = %config.url, "connecting");

    let mut stream = tokio::select! {
        () = &mut shutdown => {
            monitor.print("")?;
            monitor.print("Disconnected")?;
            return Ok(SessionEnd::Interrupted);
        }
        result = connect(&config.url) => result?,
    };
    monitor.print("✓ Connected to Weft")?;
    monitor.print("")?;

    monitor.subscribe(&mut stream, &config.topics).await?;
    let end = monitor.run(&mut stream, shutdown).await;

    let subs = monitor.subscriptions();
    tracing::info!(
        confirmed = ?subs.confirmed(),
        pending = ?subs.pending(),
        outcome = ?end,
        "session ended"
    );
    end
}

/// Per-connection state: the console sink and subscription tracking.
#[derive(Debug)]
pub struct Monitor<W> {
    out: W,
    subscriptions: SubscriptionTracker,
}

impl<W: Write> Monitor<W> {
    /// Creates a monitor that prints to `out`.
    #[must_use]
    pub fn new(out: W) -> Self {
        Self {
            out,
            subscriptions: SubscriptionTracker::new(),
        }
    }

    /// Subscription state as seen so far.
    #[must_use]
    pub fn subscriptions(&self) -> &SubscriptionTracker {
        &self.subscriptions
    }

    /// Consumes the monitor and returns the console sink.
    #[must_use]
    pub fn into_inner(self) -> W {
        self.out
    }

    /// Sends one subscribe command per topic, in order.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Transport`] if a send fails, or
    /// [`MonitorError::Output`] if the console cannot be written.
    pub async fn subscribe<S>(&mut self, sink: &mut S, topics: &[Topic]) -> Result<(), MonitorError>
    where
        S: Sink<Message, Error = tungstenite::Error> + Unpin,
    {
        let names: Vec<&str> = topics.iter().map(|t| t.label()).collect();
        self.print(&format!("Subscribing to {} events...", names.join(" and ")))?;
        for &topic in topics {
            let json = serde_json::to_string(&ClientMessage::Subscribe { topic })?;
            sink.send(Message::text(json))
                .await
                .map_err(MonitorError::transport)?;
            self.subscriptions.request(topic);
            tracing::debug!(%topic, "subscribe sent");
        }
        self.print("")?;
        Ok(())
    }

    /// Reads frames until `shutdown` resolves or the server closes.
    ///
    /// On shutdown prints `Shutting down...` and sends a best-effort close
    /// frame.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Transport`] on a read error and
    /// [`MonitorError::Output`] if the console cannot be written.
    pub async fn run<S, F>(&mut self, stream: &mut S, shutdown: F) -> Result<SessionEnd, MonitorError>
    where
        S: Stream<Item = Result<Message, tungstenite::Error>>
            + Sink<Message, Error = tungstenite::Error>
            + Unpin,
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                () = &mut shutdown => {
                    self.print("")?;
                    self.print("Shutting down...")?;
                    if let Err(err) = stream.close().await {
                        tracing::debug!(error = %err, "close frame not delivered");
                    }
                    return Ok(SessionEnd::Interrupted);
                }
                frame = stream.next() => match frame {
                    Some(Ok(Message::Text(text))) => self.handle_text(text.as_str())?,
                    Some(Ok(Message::Binary(bytes))) => match std::str::from_utf8(&bytes) {
                        Ok(text) => self.handle_text(text)?,
                        Err(err) => {
                            tracing::warn!(error = %err, len = bytes.len(), "binary frame is not utf-8");
                            self.print(&format!("Failed to parse message: <{} binary bytes>", bytes.len()))?;
                        }
                    },
                    Some(Ok(Message::Close(frame))) => {
                        tracing::info!(?frame, "server closed connection");
                        return Ok(SessionEnd::ServerClosed);
                    }
                    // Ping/pong control frames are answered by tungstenite.
                    Some(Ok(_)) => {}
                    Some(Err(err)) => return Err(MonitorError::transport(err)),
                    None => return Ok(SessionEnd::ServerClosed),
                }
            }
        }
    }

    /// Decodes and renders one text frame.
    ///
    /// Malformed JSON prints `Failed to parse message: <raw>`; any other
    /// per-message failure prints `Error handling message: <reason>`.
    /// Neither is returned as an error.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Output`] if the console cannot be written.
    pub fn handle_text(&mut self, text: &str) -> Result<(), MonitorError> {
        let value = match serde_json::from_str::<Value>(text) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(error = %err, "failed to parse message");
                self.print(&format!("Failed to parse message: {text}"))?;
                return Ok(());
            }
        };

        if let Err(err) = self.dispatch(value) {
            if err.is_fatal() {
                return Err(err);
            }
            tracing::warn!(error = %err, "error handling message");
            self.print(&format!("Error handling message: {err}"))?;
        }
        Ok(())
    }

    fn dispatch(&mut self, value: Value) -> Result<(), MonitorError> {
        let msg = ServerMessage::from_value(value)?;
        if let ServerMessage::Ack(ack) = &msg {
            self.track(ack);
        }
        for line in render(&msg)? {
            self.print(&line)?;
        }
        Ok(())
    }

    fn track(&mut self, ack: &Ack) {
        if let Some(topic) = &ack.subscribed {
            self.subscriptions.confirm(topic);
            tracing::info!(%topic, "subscription confirmed");
        }
        if let Some(topic) = &ack.unsubscribed {
            self.subscriptions.release(topic);
            tracing::info!(%topic, "subscription released");
        }
    }

    fn print(&mut self, line: &str) -> Result<(), MonitorError> {
        writeln!(self.out, "{line}")?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;
    use tokio_tungstenite::accept_async;

    fn output(monitor: Monitor<Vec<u8>>) -> String {
        String::from_utf8(monitor.into_inner()).unwrap_or_default()
    }

    fn feed(frames: &[&str]) -> String {
        let mut monitor = Monitor::new(Vec::new());
        for frame in frames {
            if let Err(err) = monitor.handle_text(frame) {
                panic!("frame `{frame}` ended the session: {err}");
            }
        }
        output(monitor)
    }

    #[test]
    fn malformed_json_is_reported_and_loop_continues() {
        let out = feed(&[
            "{not json",
            r#"{"type":"ack","subscribed":"work"}"#,
        ]);
        assert!(out.contains("Failed to parse message: {not json"));
        assert!(out.contains("✓ Subscribed to topic: work"));
    }

    #[test]
    fn handling_error_is_reported_and_loop_continues() {
        let out = feed(&[
            r#"{"type":"event","timestamp":"later","event":"work:created","data":{}}"#,
            r#"{"type":"error","error":"nope"}"#,
        ]);
        assert!(out.contains("Error handling message: invalid timestamp `later`"));
        assert!(out.contains("✗ Error: nope"));
    }

    #[test]
    fn pong_and_unknown_type_print_nothing() {
        assert_eq!(feed(&[r#"{"type":"pong"}"#, r#"{"type":"foo"}"#, "42"]), "");
    }

    #[test]
    fn acks_update_subscriptions() {
        let mut monitor = Monitor::new(Vec::new());
        let frames = [
            r#"{"type":"ack","subscribed":"work"}"#,
            r#"{"type":"ack","subscribed":"agents"}"#,
            r#"{"type":"ack","unsubscribed":"work"}"#,
        ];
        for frame in frames {
            if monitor.handle_text(frame).is_err() {
                panic!("ack should not fail");
            }
        }
        assert_eq!(monitor.subscriptions().confirmed(), vec!["agents"]);
        assert!(output(monitor).contains("✓ Unsubscribed from topic: work"));
    }

    /// Accepts one WebSocket client on a loopback port and runs `handler`.
    async fn serve_once<H, Fut>(handler: H) -> (String, tokio::task::JoinHandle<()>)
    where
        H: FnOnce(WebSocketStream<TcpStream>) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send,
    {
        let Ok(listener) = TcpListener::bind("127.0.0.1:0").await else {
            panic!("bind failed");
        };
        let Ok(addr) = listener.local_addr() else {
            panic!("no local addr");
        };
        let handle = tokio::spawn(async move {
            let Ok((tcp, _)) = listener.accept().await else {
                panic!("accept failed");
            };
            let Ok(ws) = accept_async(tcp).await else {
                panic!("handshake failed");
            };
            handler(ws).await;
        });
        (format!("ws://{addr}/api/ws"), handle)
    }

    async fn next_text(ws: &mut WebSocketStream<TcpStream>) -> Value {
        let Some(Ok(Message::Text(text))) = ws.next().await else {
            panic!("expected a text frame");
        };
        serde_json::from_str(text.as_str()).unwrap_or_default()
    }

    async fn send_json(ws: &mut WebSocketStream<TcpStream>, value: Value) {
        if ws.send(Message::text(value.to_string())).await.is_err() {
            panic!("server send failed");
        }
    }

    fn config(url: &str) -> MonitorConfig {
        MonitorConfig::new(url).unwrap_or_else(|e| panic!("bad url: {e}"))
    }

    #[tokio::test]
    async fn session_subscribes_then_renders_until_server_close() {
        let (url, server) = serve_once(|mut ws| async move {
            assert_eq!(next_text(&mut ws).await, json!({ "type": "subscribe", "topic": "work" }));
            assert_eq!(next_text(&mut ws).await, json!({ "type": "subscribe", "topic": "agents" }));

            send_json(&mut ws, json!({ "type": "ack", "subscribed": "work" })).await;
            if ws.send(Message::text("{not json")).await.is_err() {
                panic!("server send failed");
            }
            send_json(
                &mut ws,
                json!({
                    "type": "event",
                    "timestamp": "2024-01-15T14:30:00Z",
                    "event": "work:created",
                    "data": { "taskId": "task-1", "capability": "code" }
                }),
            )
            .await;
            send_json(&mut ws, json!({ "type": "pong" })).await;
            let _ = ws.close(None).await;
        })
        .await;

        let mut buf = Vec::new();
        let end = run_session(&config(&url), &mut buf, std::future::pending()).await;
        assert!(matches!(end, Ok(SessionEnd::ServerClosed)), "got {end:?}");
        assert!(server.await.is_ok());

        let out = String::from_utf8(buf).unwrap_or_default();
        assert!(out.contains(&format!("Connecting to Weft WebSocket at {url}...")));
        assert!(out.contains("✓ Connected to Weft"));
        assert!(out.contains("Subscribing to work and agent events..."));
        assert!(out.contains("✓ Subscribed to topic: work"));
        assert!(out.contains("Failed to parse message: {not json"));
        assert!(out.contains("[14:30:00] work:created"));
        assert!(out.contains("  Task ID: task-1"));
        assert!(out.contains("  Capability: code"));
    }

    #[tokio::test]
    async fn shutdown_sends_close_frame() {
        let (subscribed_tx, subscribed_rx) = oneshot::channel::<()>();
        let (url, server) = serve_once(|mut ws| async move {
            next_text(&mut ws).await;
            next_text(&mut ws).await;
            let _ = subscribed_tx.send(());
            let frame = ws.next().await;
            assert!(matches!(frame, Some(Ok(Message::Close(_)))), "got {frame:?}");
        })
        .await;

        let shutdown = async {
            let _ = subscribed_rx.await;
        };
        let mut buf = Vec::new();
        let end = run_session(&config(&url), &mut buf, shutdown).await;
        assert!(matches!(end, Ok(SessionEnd::Interrupted)), "got {end:?}");
        assert!(server.await.is_ok());
        assert!(String::from_utf8(buf).unwrap_or_default().contains("Shutting down..."));
    }

    #[tokio::test]
    async fn interrupt_while_connecting_disconnects() {
        // Listener that never accepts: the handshake never completes.
        let Ok(listener) = TcpListener::bind("127.0.0.1:0").await else {
            panic!("bind failed");
        };
        let Ok(addr) = listener.local_addr() else {
            panic!("no local addr");
        };

        let mut buf = Vec::new();
        let end = run_session(&config(&format!("ws://{addr}/")), &mut buf, std::future::ready(())).await;
        assert!(matches!(end, Ok(SessionEnd::Interrupted)), "got {end:?}");
        assert!(String::from_utf8(buf).unwrap_or_default().contains("Disconnected"));
        drop(listener);
    }

    #[tokio::test]
    async fn refused_connection_is_a_fatal_connect_error() {
        let Ok(listener) = TcpListener::bind("127.0.0.1:0").await else {
            panic!("bind failed");
        };
        let Ok(addr) = listener.local_addr() else {
            panic!("no local addr");
        };
        drop(listener);

        let mut buf = Vec::new();
        let end = run_session(&config(&format!("ws://{addr}/")), &mut buf, std::future::pending()).await;
        let Err(err) = end else {
            panic!("expected connect failure, got {end:?}");
        };
        assert!(matches!(err, MonitorError::Connect(_)));
        assert!(err.is_fatal());
    }
}
