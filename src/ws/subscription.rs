//! Topics and client-side subscription tracking.
//!
//! The client records every topic it asks for and moves it to the
//! confirmed set when the server acknowledges it.

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

/// Server-side channel of pushed messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
    /// Task lifecycle events.
    Work,
    /// Agent lifecycle and status events.
    Agents,
    /// Periodic aggregate counters.
    Stats,
}

impl Topic {
    /// Topics subscribed on connect. `stats` is opt-in and left out.
    pub const DEFAULT: [Self; 2] = [Self::Work, Self::Agents];

    /// Wire name of the topic.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Work => "work",
            Self::Agents => "agents",
            Self::Stats => "stats",
        }
    }

    /// Singular name used in the console banner (`agent`, not `agents`).
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Work => "work",
            Self::Agents => "agent",
            Self::Stats => "stats",
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Subscription state for one connection.
#[derive(Debug, Default)]
pub struct SubscriptionTracker {
    /// Topics a subscribe command was sent for.
    requested: BTreeSet<Topic>,
    /// Topic names the server has acknowledged. Kept as strings because
    /// the server may confirm topics this client does not model.
    confirmed: BTreeSet<String>,
}

impl SubscriptionTracker {
    /// Creates an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that a subscribe command was sent.
    pub fn request(&mut self, topic: Topic) {
        self.requested.insert(topic);
    }

    /// Records a `subscribed` acknowledgement.
    pub fn confirm(&mut self, topic: &str) {
        self.confirmed.insert(topic.to_owned());
    }

    /// Records an `unsubscribed` acknowledgement.
    pub fn release(&mut self, topic: &str) {
        self.confirmed.remove(topic);
        self.requested.retain(|t| t.as_str() != topic);
    }

    /// Returns `true` once the server has acknowledged `topic`.
    #[must_use]
    pub fn is_confirmed(&self, topic: &str) -> bool {
        self.confirmed.contains(topic)
    }

    /// Requested topics the server has not acknowledged yet.
    #[must_use]
    pub fn pending(&self) -> Vec<Topic> {
        self.requested
            .iter()
            .copied()
            .filter(|t| !self.confirmed.contains(t.as_str()))
            .collect()
    }

    /// Confirmed topic names, sorted.
    #[must_use]
    pub fn confirmed(&self) -> Vec<&str> {
        self.confirmed.iter().map(String::as_str).collect()
    }
}
