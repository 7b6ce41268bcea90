//! Wire-level message vocabulary.

use crate::{NodeId, Value};
use serde::{Deserialize, Serialize};

/// The two message types within a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// First exchange of a round: each node announces its current estimate.
    Propose,
    /// Second exchange: each node announces the estimate it adopted after
    /// tallying proposals.
    Vote,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Propose => write!(f, "propose"),
            Phase::Vote => write!(f, "vote"),
        }
    }
}

/// A single protocol message. Immutable once constructed.
///
/// A non-faulty sender never puts [`Value::Unknown`] in a message; the
/// receiving buffer stores whatever arrives and leaves interpretation to
/// the tally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsensusMessage {
    /// Round this message belongs to. Rounds start at 1.
    pub round: u64,
    /// Propose or vote.
    pub phase: Phase,
    /// The carried estimate.
    pub value: Value,
    /// Who sent it. Used to key the round buffer, so retransmissions
    /// never double-count.
    pub sender: NodeId,
}

impl ConsensusMessage {
    /// Create a new message.
    pub fn new(round: u64, phase: Phase, value: Value, sender: NodeId) -> Self {
        Self {
            round,
            phase,
            value,
            sender,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_json_shape() {
        let msg = ConsensusMessage::new(3, Phase::Vote, Value::One, NodeId(4));
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "round": 3,
                "phase": "vote",
                "value": 1,
                "sender": 4,
            })
        );
        let back: ConsensusMessage = serde_json::from_value(json).unwrap();
        assert_eq!(back, msg);
    }
}
