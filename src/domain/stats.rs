//! Aggregate counters pushed on the `stats` topic.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;

/// Body of a `stats` message.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StatsSnapshot {
    /// Agent counters.
    pub agents: AgentStats,
    /// Work queue counters.
    pub work: WorkStats,
    /// Spin-up target counters.
    pub targets: TargetStats,
    /// Server-side WebSocket counters, when the server reports them.
    #[serde(default)]
    pub websocket: Option<WebsocketStats>,
}

/// Agent counters.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentStats {
    /// Registered agents.
    pub total: u64,
    /// Agent count keyed by status name (`online`, `busy`, ...). Values are
    /// kept raw so an odd count under one status does not spoil the others.
    #[serde(default)]
    pub by_status: HashMap<String, Value>,
}

impl AgentStats {
    /// Number of agents in `status`; zero when the server omits it or sends
    /// something other than a non-negative integer.
    #[must_use]
    pub fn in_status(&self, status: &str) -> u64 {
        self.by_status
            .get(status)
            .and_then(Value::as_u64)
            .unwrap_or(0)
    }
}

/// Work queue counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct WorkStats {
    /// Tasks waiting for an agent.
    pub pending: u64,
    /// Tasks in progress.
    pub active: u64,
    /// Tasks finished successfully.
    pub completed: u64,
    /// Tasks that failed.
    pub failed: u64,
}

/// Spin-up target counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct TargetStats {
    /// Targets able to accept a spin-up.
    pub available: u64,
    /// Configured targets.
    pub total: u64,
}

/// Server-side WebSocket counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct WebsocketStats {
    /// Open client connections.
    pub connections: u64,
    /// Active topic subscriptions.
    pub subscriptions: u64,
}
