//! Console rendering of server messages.
//!
//! [`render`] is a pure function from a decoded [`ServerMessage`] to the
//! lines printed for it. An empty result means the message prints nothing
//! (`pong`, unknown types).

use std::fmt::Display;

use crate::domain::{AgentPayload, EventPayload, StatsSnapshot, TargetPayload, WorkPayload};
use crate::ws::messages::{Ack, EventMessage, ServerMessage, StatsMessage};

/// Renders one message to console lines.
///
/// # Errors
///
/// Returns a [`serde_json::Error`] when an event's `data` cannot be read as
/// the payload type of its namespace. Payload fields accept any JSON type,
/// so in practice this does not happen for an object `data` map.
pub fn render(msg: &ServerMessage) -> Result<Vec<String>, serde_json::Error> {
    let lines = match msg {
        ServerMessage::Ack(ack) => render_ack(ack),
        ServerMessage::Event(event) => render_event(event, &event.payload()?),
        ServerMessage::Stats(stats) => render_stats(stats),
        ServerMessage::Error(err) => vec![format!("✗ Error: {}", err.error)],
        ServerMessage::Pong | ServerMessage::Unknown => Vec::new(),
    };
    Ok(lines)
}

fn render_ack(ack: &Ack) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(topic) = &ack.subscribed {
        lines.push(format!("✓ Subscribed to topic: {topic}"));
        lines.push(String::new());
        lines.push("Waiting for events...".to_owned());
        lines.push(String::new());
    }
    if let Some(topic) = &ack.unsubscribed {
        lines.push(format!("✓ Unsubscribed from topic: {topic}"));
    }
    lines
}

/// Renders an event whose payload has already been decoded.
#[must_use]
pub fn render_event(event: &EventMessage, payload: &EventPayload) -> Vec<String> {
    let mut lines = vec![format!("[{}] {}", event.timestamp.clock(), event.event)];
    match payload {
        EventPayload::Work(work) => work_lines(&mut lines, work),
        EventPayload::Agent(agent) => agent_lines(&mut lines, agent),
        EventPayload::Target(target) => target_lines(&mut lines, target),
        EventPayload::Other => {}
    }
    lines.push(String::new());
    lines
}

fn work_lines(lines: &mut Vec<String>, work: &WorkPayload) {
    field(lines, "Task ID", work.task_id.as_ref());
    field(lines, "Capability", work.capability.as_ref());
    field(lines, "Boundary", work.boundary.as_ref());
    field(lines, "Priority", work.priority.as_ref());
    field(lines, "Description", work.description.as_ref());
    field(lines, "Assigned to", work.assignee());
    field(lines, "Error", work.error_message.as_ref());
    field(lines, "Summary", work.summary.as_ref());
    if let Some(progress) = &work.progress {
        lines.push(format!("  Progress: {progress}%"));
    }
}

fn agent_lines(lines: &mut Vec<String>, agent: &AgentPayload) {
    lines.push(format!(
        "  Agent: {}... ({})",
        agent.agent.short_guid(),
        agent.agent.agent_type_or_unknown()
    ));
    field(lines, "Status", agent.status.as_ref());
    if let Some((previous, new)) = agent.transition() {
        lines.push(format!("  Status: {previous} → {new}"));
    }
    field(lines, "Tasks", agent.current_task_count.as_ref());
    field(lines, "Capabilities", agent.capabilities.as_ref());
    field(lines, "Boundaries", agent.boundaries.as_ref());
    field(lines, "Reason", agent.reason.as_ref());
    field(
        lines,
        "Graceful",
        agent
            .graceful
            .as_ref()
            .map(|graceful| if graceful.is_truthy() { "Yes" } else { "No" }),
    );
}

fn target_lines(lines: &mut Vec<String>, target: &TargetPayload) {
    field(lines, "Target", target.target_name.as_ref());
    field(lines, "Agent Type", target.agent_type.as_ref());
    field(lines, "Mechanism", target.mechanism.as_ref());
    field(lines, "Error", target.error_message.as_ref());
    if let Some(duration) = &target.duration_ms {
        lines.push(format!("  Duration: {duration}ms"));
    }
}

fn render_stats(stats: &StatsMessage) -> Vec<String> {
    let StatsSnapshot {
        agents,
        work,
        targets,
        websocket,
    } = &stats.data;
    let mut lines = vec![
        String::new(),
        format!("=== Stats Update ({}) ===", stats.timestamp.clock()),
        format!("Agents: {} total", agents.total),
        format!("  Online: {}", agents.in_status("online")),
        format!("  Busy: {}", agents.in_status("busy")),
        format!("Work: {} pending, {} active", work.pending, work.active),
        format!("  Completed: {}, Failed: {}", work.completed, work.failed),
        format!("Targets: {}/{} available", targets.available, targets.total),
    ];
    if let Some(ws) = websocket {
        lines.push(format!(
            "WebSocket: {} connections, {} subscriptions",
            ws.connections, ws.subscriptions
        ));
    }
    lines.push(String::new());
    lines
}

/// Pushes `  <label>: <value>` when the value is present.
fn field(lines: &mut Vec<String>, label: &str, value: Option<impl Display>) {
    if let Some(value) = value {
        lines.push(format!("  {label}: {value}"));
    }
}
