//! Domain layer: what the Weft server reports.
//!
//! Typed views over the loosely-typed JSON the server pushes: event
//! namespaces and their payloads, aggregate stats, and timestamps.

pub mod event;
pub mod stats;
pub mod timestamp;

pub use event::{
    AgentPayload, AgentRef, EventNamespace, EventPayload, Scalar, ScalarList, TargetPayload,
    WorkPayload,
};
pub use stats::StatsSnapshot;
pub use timestamp::Timestamp;
