//! Per-round, per-phase message buffer for one node.

use benor_types::{ConsensusMessage, NodeId, Phase, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};
use tokio::sync::futures::Notified;
use tokio::sync::Notify;

/// Messages collected for one round, keyed by sender per phase.
#[derive(Debug, Default)]
struct RoundSlot {
    proposals: HashMap<NodeId, Value>,
    votes: HashMap<NodeId, Value>,
}

impl RoundSlot {
    fn slot(&self, phase: Phase) -> &HashMap<NodeId, Value> {
        match phase {
            Phase::Propose => &self.proposals,
            Phase::Vote => &self.votes,
        }
    }

    fn slot_mut(&mut self, phase: Phase) -> &mut HashMap<NodeId, Value> {
        match phase {
            Phase::Propose => &mut self.proposals,
            Phase::Vote => &mut self.votes,
        }
    }
}

/// Value counts for one (round, phase) slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    /// Distinct senders that sent `Value::Zero`.
    pub zeros: usize,
    /// Distinct senders that sent `Value::One`.
    pub ones: usize,
}

/// Concurrent message buffer: round → (propose slot, vote slot).
///
/// This is the one piece of genuinely shared state per node: the owning
/// engine reads it while the transport's inbound path writes to it.
/// Entries are keyed by sender, so retransmissions overwrite instead of
/// double-counting. Any round is acceptable: nodes ahead or behind in
/// round number are stored for later, never rejected. Nothing is pruned
/// during a node's lifetime.
///
/// Writers wake waiters through a [`Notify`], letting quorum waits be
/// wakeup-driven instead of busy-polled.
#[derive(Debug, Default)]
pub struct RoundBuffer {
    rounds: Mutex<BTreeMap<u64, RoundSlot>>,
    changed: Notify,
}

impl RoundBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    fn rounds(&self) -> MutexGuard<'_, BTreeMap<u64, RoundSlot>> {
        // A poisoned lock only means a writer panicked mid-insert; the
        // map itself is still structurally sound.
        self.rounds.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Insert a message into its (round, phase) slot, keyed by sender.
    ///
    /// Re-insertion from the same sender overwrites. Never fails: late,
    /// early, and unknown rounds are all stored.
    pub fn record(&self, message: &ConsensusMessage) {
        self.rounds()
            .entry(message.round)
            .or_default()
            .slot_mut(message.phase)
            .insert(message.sender, message.value);
        self.changed.notify_waiters();
    }

    /// Number of distinct senders recorded for (round, phase).
    pub fn count_at(&self, round: u64, phase: Phase) -> usize {
        self.rounds()
            .get(&round)
            .map_or(0, |slot| slot.slot(phase).len())
    }

    /// Snapshot of the values recorded for (round, phase).
    ///
    /// The returned vector is an owned, consistent snapshot taken at the
    /// instant of the call; it can be scanned as many times as needed.
    pub fn values_at(&self, round: u64, phase: Phase) -> Vec<Value> {
        self.rounds()
            .get(&round)
            .map_or_else(Vec::new, |slot| slot.slot(phase).values().copied().collect())
    }

    /// Count zeros and ones recorded for (round, phase).
    pub fn tally(&self, round: u64, phase: Phase) -> Tally {
        let mut tally = Tally::default();
        for value in self.values_at(round, phase) {
            match value {
                Value::Zero => tally.zeros += 1,
                Value::One => tally.ones += 1,
                Value::Unknown => {}
            }
        }
        tally
    }

    /// Highest round number seen so far (0 when empty).
    pub fn latest_round(&self) -> u64 {
        self.rounds().keys().next_back().copied().unwrap_or(0)
    }

    /// A future that resolves after the next [`record`](Self::record).
    ///
    /// Create the future *before* re-checking counts to avoid missing a
    /// wakeup that lands in between.
    pub fn changed(&self) -> Notified<'_> {
        self.changed.notified()
    }
}
