//! Wire types for the control API.

use benor_consensus::EngineHandle;
use benor_types::{NodeId, NodeState, NodeStatus, Value};
use serde::{Deserialize, Serialize};

/// Response for `/state`.
///
/// `estimate` serializes as `0`, `1`, or `null`; a faulty node reports
/// `null` across the board plus `killed: true`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateResponse {
    pub id: NodeId,
    pub status: NodeStatus,
    /// True when the node is crash-faulty.
    pub killed: bool,
    pub estimate: Value,
    pub round: Option<u64>,
    pub decided: Option<bool>,
    pub decided_value: Option<Value>,
}

impl StateResponse {
    pub fn from_handle(handle: &EngineHandle) -> Self {
        let state = handle.snapshot();
        if handle.is_faulty() {
            return Self {
                id: state.id,
                status: NodeStatus::Inert,
                killed: true,
                estimate: Value::Unknown,
                round: None,
                decided: None,
                decided_value: None,
            };
        }
        Self::from(state)
    }
}

impl From<NodeState> for StateResponse {
    fn from(state: NodeState) -> Self {
        Self {
            id: state.id,
            status: state.status,
            killed: false,
            estimate: state.estimate,
            round: Some(state.round),
            decided: Some(state.decided),
            decided_value: state.decided_value,
        }
    }
}
