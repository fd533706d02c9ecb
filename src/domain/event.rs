//! Event namespaces and the typed payload each namespace carries.
//!
//! An `event` message names its event with a colon-prefixed namespace
//! (`work:created`, `agent:status-changed`, `target:spin-up`). The
//! namespace decides which payload struct the loosely-typed `data` map is
//! decoded into. Every displayable key is an `Option<Scalar>`: any JSON
//! type decodes, an absent key and a JSON `null` both decode to `None`, and
//! unknown keys are ignored. One odd field never costs the rest of the event.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

/// Placeholder shown when an agent reference lacks a field.
pub const UNKNOWN: &str = "unknown";

/// Number of GUID characters shown when labelling an agent.
pub const SHORT_GUID_LEN: usize = 8;

/// Category of an event, taken from the prefix of its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventNamespace {
    /// `work:*` task lifecycle events.
    Work,
    /// `agent:*` agent lifecycle and status events.
    Agent,
    /// `target:*` spin-up target events.
    Target,
    /// `spin-up:*` events; rendered like [`EventNamespace::Target`].
    SpinUp,
    /// Any other prefix.
    Other,
}

impl EventNamespace {
    /// Classifies an event name by its prefix.
    #[must_use]
    pub fn of(event_name: &str) -> Self {
        if event_name.starts_with("work:") {
            Self::Work
        } else if event_name.starts_with("agent:") {
            Self::Agent
        } else if event_name.starts_with("target:") {
            Self::Target
        } else if event_name.starts_with("spin-up:") {
            Self::SpinUp
        } else {
            Self::Other
        }
    }
}

/// A displayable leaf of any JSON type.
///
/// Strings print without quotes, numbers print as sent (`50.0` stays
/// `50.0`), booleans print `True`/`False`, and arrays or objects print as
/// compact JSON.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct Scalar(Value);

impl Scalar {
    /// Truthiness: `false`, `0`, `""`, `[]`, `{}` and `null` are false.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match &self.0 {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
            Value::String(s) => !s.is_empty(),
            Value::Array(items) => !items.is_empty(),
            Value::Object(map) => !map.is_empty(),
        }
    }
}

impl From<Value> for Scalar {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Value::String(s) => f.write_str(s),
            Value::Bool(true) => f.write_str("True"),
            Value::Bool(false) => f.write_str("False"),
            Value::Null => f.write_str("None"),
            other => write!(f, "{other}"),
        }
    }
}

/// A list of displayable values (`capabilities`, `boundaries`).
///
/// `null` items are skipped; a bare non-array value reads as a one-item
/// list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScalarList(Vec<Scalar>);

impl ScalarList {
    /// The items, in order.
    #[must_use]
    pub fn items(&self) -> &[Scalar] {
        &self.0
    }
}

impl<'de> Deserialize<'de> for ScalarList {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let items = match Value::deserialize(deserializer)? {
            Value::Array(items) => items,
            Value::Null => Vec::new(),
            other => vec![other],
        };
        Ok(Self(
            items
                .into_iter()
                .filter(|item| !item.is_null())
                .map(Scalar)
                .collect(),
        ))
    }
}

impl fmt::Display for ScalarList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, item) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{item}")?;
        }
        Ok(())
    }
}

/// Decodes a nested object, falling back to `T::default()` when the value
/// is not an object.
fn lenient_object<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    Ok(match Value::deserialize(deserializer)? {
        value @ Value::Object(_) => serde_json::from_value(value).unwrap_or_default(),
        _ => T::default(),
    })
}

/// Nested agent reference (`agent`, `assignedToAgent`).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentRef {
    /// Agent instance GUID.
    pub guid: Option<Scalar>,
    /// Agent type label (e.g. `"coder"`).
    pub agent_type: Option<Scalar>,
}

impl AgentRef {
    /// First eight characters of the GUID, or `unknown`.
    #[must_use]
    pub fn short_guid(&self) -> String {
        self.guid
            .as_ref()
            .map_or_else(|| UNKNOWN.to_owned(), ToString::to_string)
            .chars()
            .take(SHORT_GUID_LEN)
            .collect()
    }

    /// Agent type, or `unknown`.
    #[must_use]
    pub fn agent_type_or_unknown(&self) -> String {
        self.agent_type
            .as_ref()
            .map_or_else(|| UNKNOWN.to_owned(), ToString::to_string)
    }
}

/// Payload of `work:*` events.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkPayload {
    /// Task identifier.
    pub task_id: Option<Scalar>,
    /// Required capability.
    pub capability: Option<Scalar>,
    /// Boundary the task runs in.
    pub boundary: Option<Scalar>,
    /// Task priority.
    pub priority: Option<Scalar>,
    /// Free-text description.
    pub description: Option<Scalar>,
    /// Raw id of the assigned agent.
    pub assigned_to: Option<Scalar>,
    /// Expanded record of the assigned agent, when the server includes it.
    #[serde(default, deserialize_with = "lenient_object")]
    pub assigned_to_agent: Option<AgentRef>,
    /// Failure message.
    pub error_message: Option<Scalar>,
    /// Completion summary.
    pub summary: Option<Scalar>,
    /// Progress percentage.
    pub progress: Option<Scalar>,
}

impl WorkPayload {
    /// Label for the assignee: the nested agent type when known, otherwise
    /// the raw id. `None` when the task is unassigned.
    #[must_use]
    pub fn assignee(&self) -> Option<&Scalar> {
        let raw = self.assigned_to.as_ref()?;
        Some(
            self.assigned_to_agent
                .as_ref()
                .and_then(|agent| agent.agent_type.as_ref())
                .unwrap_or(raw),
        )
    }
}

/// Payload of `agent:*` events.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentPayload {
    /// The agent the event is about.
    #[serde(default, deserialize_with = "lenient_object")]
    pub agent: AgentRef,
    /// Current status.
    pub status: Option<Scalar>,
    /// Status before a transition.
    pub previous_status: Option<Scalar>,
    /// Status after a transition.
    pub new_status: Option<Scalar>,
    /// Tasks currently held by the agent.
    pub current_task_count: Option<Scalar>,
    /// Advertised capabilities.
    pub capabilities: Option<ScalarList>,
    /// Boundaries the agent serves.
    pub boundaries: Option<ScalarList>,
    /// Reason given for a stop or failure.
    pub reason: Option<Scalar>,
    /// Whether a shutdown was graceful; read by truthiness.
    pub graceful: Option<Scalar>,
}

impl AgentPayload {
    /// `(previous, new)` status pair when the event reports a transition.
    /// A missing previous status reads as `unknown`.
    #[must_use]
    pub fn transition(&self) -> Option<(String, String)> {
        let new = self.new_status.as_ref()?;
        let previous = self
            .previous_status
            .as_ref()
            .map_or_else(|| UNKNOWN.to_owned(), ToString::to_string);
        Some((previous, new.to_string()))
    }
}

/// Payload of `target:*` and `spin-up:*` events.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetPayload {
    /// Spin-up target name.
    pub target_name: Option<Scalar>,
    /// Agent type being spun up.
    pub agent_type: Option<Scalar>,
    /// Spin-up mechanism (e.g. `"local"`, `"ssh"`).
    pub mechanism: Option<Scalar>,
    /// Failure message.
    pub error_message: Option<Scalar>,
    /// Duration in milliseconds.
    pub duration_ms: Option<Scalar>,
}

/// Event data decoded according to its namespace.
#[derive(Debug, Clone, PartialEq)]
pub enum EventPayload {
    /// `work:*`
    Work(WorkPayload),
    /// `agent:*`
    Agent(AgentPayload),
    /// `target:*` or `spin-up:*`
    Target(TargetPayload),
    /// Unrecognised namespace; no fields are expanded.
    Other,
}

impl EventPayload {
    /// Decodes `data` into the payload type for `event_name`'s namespace.
    ///
    /// # Errors
    ///
    /// Returns a [`serde_json::Error`] if `data` cannot be read as the
    /// namespace's payload. Every payload field accepts any JSON type, so
    /// an object map always decodes.
    pub fn decode(event_name: &str, data: &Map<String, Value>) -> Result<Self, serde_json::Error> {
        let value = Value::Object(data.clone());
        match EventNamespace::of(event_name) {
            EventNamespace::Work => serde_json::from_value(value).map(Self::Work),
            EventNamespace::Agent => serde_json::from_value(value).map(Self::Agent),
            EventNamespace::Target | EventNamespace::SpinUp => {
                serde_json::from_value(value).map(Self::Target)
            }
            EventNamespace::Other => Ok(Self::Other),
        }
    }
}
