//! The seam between the engine and whatever moves messages.

use benor_types::{ConsensusMessage, NodeId};

/// Delivers a message to the addressed node.
///
/// Fire-and-forget and best-effort: a send may silently fail, and a
/// failure to reach one recipient must not affect sends to others or the
/// sender's own state. The engine never assumes delivery is reliable,
/// ordered, or deduplicated beyond the round buffer's overwrite-by-sender
/// semantics.
pub trait Transport: Send + Sync {
    /// Hand `message` to the network for delivery to `to`.
    fn send(&self, to: NodeId, message: ConsensusMessage);
}
