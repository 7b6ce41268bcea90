//! Observable per-node state.

use crate::{NodeId, Value};
use serde::{Deserialize, Serialize};

/// Lifecycle of one node's consensus engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    /// Created, not started.
    Idle,
    /// Round loop active.
    Running,
    /// Terminal: agreement locally confirmed. The engine keeps
    /// rebroadcasting its decided value but performs no further estimate
    /// updates.
    Decided,
    /// Terminal: externally halted.
    Stopped,
    /// A faulty node. Never starts, never sends, never decides.
    Inert,
}

/// Snapshot of one node's state, readable at any time without blocking
/// the engine's own loop.
///
/// Invariants:
/// - a faulty node reports `estimate == Unknown`, `decided == false`,
///   `decided_value == None` forever;
/// - once `decided` is true, `decided_value` is fixed and `estimate`
///   equals it from then on;
/// - `round` is non-decreasing over the node's lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeState {
    /// Which node this is.
    pub id: NodeId,
    /// Where in the lifecycle the engine is.
    pub status: NodeStatus,
    /// Current working estimate (`Unknown` for faulty nodes).
    pub estimate: Value,
    /// Current round, starting at 1.
    pub round: u64,
    /// Whether the node has decided.
    pub decided: bool,
    /// The decided value, once fixed.
    pub decided_value: Option<Value>,
}

impl NodeState {
    /// Fresh state for a non-faulty node with the given initial estimate.
    pub fn new(id: NodeId, initial: Value) -> Self {
        Self {
            id,
            status: NodeStatus::Idle,
            estimate: initial,
            round: 1,
            decided: false,
            decided_value: None,
        }
    }

    /// The permanent state of a faulty node.
    pub fn inert(id: NodeId) -> Self {
        Self {
            id,
            status: NodeStatus::Inert,
            estimate: Value::Unknown,
            round: 1,
            decided: false,
            decided_value: None,
        }
    }

    /// True once the engine reached a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self.status, NodeStatus::Decided | NodeStatus::Stopped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inert_state_shape() {
        let state = NodeState::inert(NodeId(2));
        assert_eq!(state.status, NodeStatus::Inert);
        assert_eq!(state.estimate, Value::Unknown);
        assert!(!state.decided);
        assert_eq!(state.decided_value, None);
    }
}
