//! WebSocket message types: the inbound union and outbound commands.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::subscription::Topic;
use crate::domain::{EventPayload, StatsSnapshot, Timestamp};

/// Message pushed by the server, discriminated by its `type` field.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Acknowledgement of a subscribe or unsubscribe command.
    Ack(Ack),
    /// A single domain event.
    Event(EventMessage),
    /// Periodic aggregate counters.
    Stats(StatsMessage),
    /// Server-reported error.
    Error(ErrorMessage),
    /// Liveness reply; carries nothing.
    Pong,
    /// Any other `type`. Renders nothing.
    #[serde(other)]
    Unknown,
}

impl ServerMessage {
    /// Interprets an already-parsed JSON value.
    ///
    /// A value that is not an object, or has no string `type`, is
    /// [`ServerMessage::Unknown`] rather than an error.
    ///
    /// # Errors
    ///
    /// Returns a [`serde_json::Error`] when a known `type` is missing a
    /// required field or a field has the wrong shape.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        if value.get("type").and_then(Value::as_str).is_none() {
            return Ok(Self::Unknown);
        }
        serde_json::from_value(value)
    }
}

/// Body of an `ack` message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Ack {
    /// Topic that was just subscribed.
    pub subscribed: Option<String>,
    /// Topic that was just unsubscribed.
    pub unsubscribed: Option<String>,
}

/// Body of an `event` message.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EventMessage {
    /// When the server emitted the event.
    pub timestamp: Timestamp,
    /// Namespaced event name, e.g. `work:created`.
    pub event: String,
    /// Namespace-dependent payload.
    #[serde(default, deserialize_with = "object_or_empty")]
    pub data: Map<String, Value>,
}

impl EventMessage {
    /// Decodes [`EventMessage::data`] according to the event's namespace.
    ///
    /// # Errors
    ///
    /// See [`EventPayload::decode`].
    pub fn payload(&self) -> Result<EventPayload, serde_json::Error> {
        EventPayload::decode(&self.event, &self.data)
    }
}

/// Body of a `stats` message.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StatsMessage {
    /// When the snapshot was taken.
    pub timestamp: Timestamp,
    /// The counters.
    pub data: StatsSnapshot,
}

/// Body of an `error` message.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ErrorMessage {
    /// Human-readable error text.
    pub error: String,
}

/// Commands the client sends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Start receiving events for a topic.
    Subscribe {
        /// Topic to subscribe to.
        topic: Topic,
    },
}

/// Treats `null` as an empty map so `"data": null` matches a missing key.
fn object_or_empty<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Map<String, Value>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use serde_json::json;

    fn decode(value: Value) -> ServerMessage {
        let Ok(msg) = ServerMessage::from_value(value) else {
            panic!("expected message to decode");
        };
        msg
    }

    #[test]
    fn ack_with_subscribed() {
        let msg = decode(json!({ "type": "ack", "subscribed": "work" }));
        assert_eq!(
            msg,
            ServerMessage::Ack(Ack {
                subscribed: Some("work".to_string()),
                unsubscribed: None,
            })
        );
    }

    #[test]
    fn pong_ignores_extra_fields() {
        assert_eq!(decode(json!({ "type": "pong" })), ServerMessage::Pong);
        assert_eq!(
            decode(json!({ "type": "pong", "ts": 12 })),
            ServerMessage::Pong
        );
    }

    #[test]
    fn unknown_type_is_unknown() {
        assert_eq!(decode(json!({ "type": "foo", "x": 1 })), ServerMessage::Unknown);
    }

    #[test]
    fn missing_type_or_non_object_is_unknown() {
        assert_eq!(decode(json!({ "event": "work:created" })), ServerMessage::Unknown);
        assert_eq!(decode(json!([1, 2, 3])), ServerMessage::Unknown);
        assert_eq!(decode(json!({ "type": 7 })), ServerMessage::Unknown);
    }

    #[test]
    fn event_without_data_has_empty_map() {
        let msg = decode(json!({
            "type": "event",
            "timestamp": "2024-01-15T14:30:00Z",
            "event": "system:tick",
            "data": null
        }));
        let ServerMessage::Event(event) = msg else {
            panic!("expected event");
        };
        assert!(event.data.is_empty());
        assert!(matches!(event.payload(), Ok(EventPayload::Other)));
    }

    #[test]
    fn event_with_bad_timestamp_fails() {
        let msg = ServerMessage::from_value(json!({
            "type": "event",
            "timestamp": "soon",
            "event": "work:created",
            "data": {}
        }));
        assert!(msg.is_err());
    }

    #[test]
    fn error_requires_error_field() {
        let ok = decode(json!({ "type": "error", "error": "unknown topic" }));
        assert_eq!(
            ok,
            ServerMessage::Error(ErrorMessage {
                error: "unknown topic".to_string()
            })
        );
        assert!(ServerMessage::from_value(json!({ "type": "error" })).is_err());
    }

    #[test]
    fn subscribe_serializes_to_wire_shape() {
        let msg = ClientMessage::Subscribe { topic: Topic::Work };
        let json = serde_json::to_value(&msg).unwrap_or_default();
        assert_eq!(json, json!({ "type": "subscribe", "topic": "work" }));
    }
}
