//! External control surface for a spawned engine.

use crate::RoundBuffer;
use benor_types::{ConsensusMessage, NodeId, NodeState};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

/// Cheap, cloneable handle to one node.
///
/// Everything the outside world may do to a node goes through here:
/// start it, stop it, deliver an inbound message, read a state snapshot.
/// A faulty node gets an [`inert`](EngineHandle::inert) handle with no
/// engine behind it; every operation on it is a refusal.
#[derive(Clone)]
pub struct EngineHandle {
    id: NodeId,
    /// `None` for a faulty node: there is no buffer to deliver into.
    buffer: Option<Arc<RoundBuffer>>,
    state_rx: watch::Receiver<NodeState>,
    start_tx: Arc<watch::Sender<bool>>,
    stop_tx: Arc<watch::Sender<bool>>,
}

impl EngineHandle {
    pub(crate) fn new(
        id: NodeId,
        buffer: Arc<RoundBuffer>,
        state_rx: watch::Receiver<NodeState>,
        start_tx: watch::Sender<bool>,
        stop_tx: watch::Sender<bool>,
    ) -> Self {
        Self {
            id,
            buffer: Some(buffer),
            state_rx,
            start_tx: Arc::new(start_tx),
            stop_tx: Arc::new(stop_tx),
        }
    }

    /// Handle for a crash-faulty node. No engine runs behind it; the
    /// snapshot is permanently [`NodeState::inert`].
    pub fn inert(id: NodeId) -> Self {
        // The receiver keeps serving the inert snapshot after the
        // sender drops; no engine task is needed.
        let (_state_tx, state_rx) = watch::channel(NodeState::inert(id));
        let (start_tx, _) = watch::channel(false);
        let (stop_tx, _) = watch::channel(false);
        Self {
            id,
            buffer: None,
            state_rx,
            start_tx: Arc::new(start_tx),
            stop_tx: Arc::new(stop_tx),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    /// True when this handle fronts a crash-faulty node.
    pub fn is_faulty(&self) -> bool {
        self.buffer.is_none()
    }

    /// Current state, read without touching the engine's task.
    pub fn snapshot(&self) -> NodeState {
        self.state_rx.borrow().clone()
    }

    /// Kick the engine out of idle. Returns false, and does nothing,
    /// when the node is faulty, already started, or already stopped.
    pub fn start(&self) -> bool {
        if self.is_faulty() || self.is_stopped() || *self.start_tx.borrow() {
            return false;
        }
        self.start_tx.send_replace(true);
        true
    }

    /// Halt the engine. Idempotent; a no-op on faulty nodes.
    pub fn stop(&self) {
        if self.is_faulty() {
            return;
        }
        self.stop_tx.send_replace(true);
    }

    /// Whether a stop command has been issued.
    pub fn is_stopped(&self) -> bool {
        *self.stop_tx.borrow()
    }

    /// Deliver an inbound message into this node's round buffer.
    ///
    /// Returns true if the message was recorded. A faulty or stopped
    /// node drops everything on the floor; the sender is never told.
    pub fn deliver(&self, message: &ConsensusMessage) -> bool {
        let Some(buffer) = &self.buffer else {
            return false;
        };
        if self.is_stopped() {
            debug!(node = %self.id, from = %message.sender, "dropping message for stopped node");
            return false;
        }
        buffer.record(message);
        true
    }

    /// Wait until the engine reaches a terminal status, returning the
    /// final snapshot. Resolves immediately for faulty nodes with their
    /// inert state.
    pub async fn terminal_state(&self) -> NodeState {
        if self.is_faulty() {
            return self.snapshot();
        }
        let mut rx = self.state_rx.clone();
        loop {
            {
                let state = rx.borrow_and_update();
                if state.is_terminal() {
                    return state.clone();
                }
            }
            if rx.changed().await.is_err() {
                return self.snapshot();
            }
        }
    }
}
