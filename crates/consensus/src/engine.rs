//! The per-node round loop.

use crate::{EngineConfig, EngineHandle, RoundBuffer, Tally, Transport};
use benor_types::{ConsensusMessage, NetworkConfig, NodeId, NodeState, NodeStatus, Phase, Value};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info};

/// What a completed round means for the loop.
enum RoundResult {
    /// Move on to the next round.
    Continue,
    /// Agreement reached; switch to rebroadcasting.
    Decided(Value),
    /// A stop command arrived mid-round.
    Stopped,
}

/// What the vote tally of a round dictates.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum VoteOutcome {
    /// The value is safe to commit.
    Decide(Value),
    /// Not decidable yet, but the value was vouched for by at least one
    /// node that is certainly correct; carry it into the next round.
    Adopt(Value),
    /// No usable signal; randomize.
    CoinFlip,
}

/// Strict majority over all N nodes, or `None` on a split.
pub(crate) fn majority_value(tally: Tally, num_nodes: u32) -> Option<Value> {
    let n = num_nodes as usize;
    if 2 * tally.zeros > n {
        Some(Value::Zero)
    } else if 2 * tally.ones > n {
        Some(Value::One)
    } else {
        None
    }
}

/// Decision rule for the vote phase.
///
/// A value with more than (N + F) / 2 votes is decided: any other
/// quorum of N − F senders must then overlap it in more than F votes,
/// which is the adoption threshold below, so no conflicting decision can
/// form while F < N/3. A count above F cannot consist of faulty senders
/// alone, so such a value is adopted; with both values above F the
/// larger count wins and an exact tie falls through to the coin.
pub(crate) fn vote_outcome(tally: Tally, num_nodes: u32, max_faulty: u32) -> VoteOutcome {
    let n = num_nodes as usize;
    let f = max_faulty as usize;
    if 2 * tally.zeros > n + f {
        return VoteOutcome::Decide(Value::Zero);
    }
    if 2 * tally.ones > n + f {
        return VoteOutcome::Decide(Value::One);
    }
    match (tally.zeros > f, tally.ones > f) {
        (true, true) if tally.zeros > tally.ones => VoteOutcome::Adopt(Value::Zero),
        (true, true) if tally.ones > tally.zeros => VoteOutcome::Adopt(Value::One),
        (true, true) => VoteOutcome::CoinFlip,
        (true, false) => VoteOutcome::Adopt(Value::Zero),
        (false, true) => VoteOutcome::Adopt(Value::One),
        (false, false) => VoteOutcome::CoinFlip,
    }
}

/// One node's consensus engine.
///
/// Owned by its tokio task; the only shared pieces are the round buffer
/// (written by the inbound message path) and the watch channels that
/// carry state snapshots out and start/stop commands in. Everything else
/// is single-writer by construction.
pub struct ConsensusEngine {
    id: NodeId,
    network: NetworkConfig,
    config: EngineConfig,
    buffer: Arc<RoundBuffer>,
    transport: Arc<dyn Transport>,
    rng: ChaCha8Rng,
    state: NodeState,
    state_tx: watch::Sender<NodeState>,
    start_rx: watch::Receiver<bool>,
    stop_rx: watch::Receiver<bool>,
}

impl ConsensusEngine {
    /// Spawn the engine onto the runtime and return its handle.
    ///
    /// The engine sits idle until [`EngineHandle::start`] fires. `seed`
    /// drives only this node's coin flips; distinct nodes must get
    /// distinct seeds or correlated coins will stall convergence.
    pub fn spawn(
        id: NodeId,
        initial: Value,
        network: NetworkConfig,
        config: EngineConfig,
        transport: Arc<dyn Transport>,
        seed: u64,
    ) -> EngineHandle {
        let buffer = Arc::new(RoundBuffer::new());
        let state = NodeState::new(id, initial);
        let (state_tx, state_rx) = watch::channel(state.clone());
        let (start_tx, start_rx) = watch::channel(false);
        let (stop_tx, stop_rx) = watch::channel(false);
        let engine = Self {
            id,
            network,
            config,
            buffer: Arc::clone(&buffer),
            transport,
            rng: ChaCha8Rng::seed_from_u64(seed),
            state,
            state_tx,
            start_rx,
            stop_rx,
        };
        tokio::spawn(engine.run());
        EngineHandle::new(id, buffer, state_rx, start_tx, stop_tx)
    }

    async fn run(mut self) {
        if !self.await_start().await {
            self.halt();
            return;
        }
        self.state.status = NodeStatus::Running;
        self.publish();
        info!(node = %self.id, estimate = %self.state.estimate, "consensus started");

        loop {
            match self.run_round().await {
                RoundResult::Continue => {}
                RoundResult::Decided(value) => {
                    self.rebroadcast_until_stopped(value).await;
                    return;
                }
                RoundResult::Stopped => {
                    self.halt();
                    return;
                }
            }
        }
    }

    /// Block until started. Returns false if stopped (or orphaned) first.
    async fn await_start(&mut self) -> bool {
        loop {
            if *self.stop_rx.borrow() {
                return false;
            }
            if *self.start_rx.borrow() {
                return true;
            }
            tokio::select! {
                res = self.start_rx.changed() => {
                    if res.is_err() {
                        return false;
                    }
                }
                res = self.stop_rx.changed() => {
                    if res.is_err() {
                        return false;
                    }
                }
            }
        }
    }

    async fn run_round(&mut self) -> RoundResult {
        let round = self.state.round;

        self.broadcast(round, Phase::Propose, self.state.estimate);
        if !self.await_quorum(round, Phase::Propose).await {
            return RoundResult::Stopped;
        }
        let proposals = self.buffer.tally(round, Phase::Propose);
        let vote = match majority_value(proposals, self.network.num_nodes) {
            Some(value) => value,
            None => self.coin_flip(),
        };
        debug!(
            node = %self.id,
            round,
            zeros = proposals.zeros,
            ones = proposals.ones,
            vote = %vote,
            "propose phase resolved"
        );
        self.state.estimate = vote;
        self.publish();

        self.broadcast(round, Phase::Vote, vote);
        if !self.await_quorum(round, Phase::Vote).await {
            return RoundResult::Stopped;
        }
        let votes = self.buffer.tally(round, Phase::Vote);
        let outcome = vote_outcome(votes, self.network.num_nodes, self.network.max_faulty);
        debug!(
            node = %self.id,
            round,
            zeros = votes.zeros,
            ones = votes.ones,
            ?outcome,
            "vote phase resolved"
        );
        match outcome {
            VoteOutcome::Decide(value) => {
                self.decide(value);
                return RoundResult::Decided(value);
            }
            VoteOutcome::Adopt(value) => self.state.estimate = value,
            VoteOutcome::CoinFlip => self.state.estimate = self.coin_flip(),
        }
        self.state.round += 1;
        self.publish();
        RoundResult::Continue
    }

    /// Wait for N − F distinct senders in (round, phase).
    ///
    /// Returns false only when stopped. Wakeups from the buffer re-check
    /// for free against a fixed per-attempt deadline, so a steady trickle
    /// of non-quorum messages cannot keep resetting the timer; only a
    /// reached deadline consumes the attempt budget. An exhausted budget
    /// lets the round proceed on whatever was collected so a crash of
    /// more than F peers cannot wedge the loop.
    async fn await_quorum(&mut self, round: u64, phase: Phase) -> bool {
        let quorum = self.network.quorum();
        let buffer = Arc::clone(&self.buffer);
        let mut attempts = 0u32;
        loop {
            // One attempt = one fixed deadline, however many wakeups
            // land before it.
            let deadline = tokio::time::Instant::now() + self.config.poll_interval;
            loop {
                if *self.stop_rx.borrow() {
                    return false;
                }
                // Register before the count check so a record landing in
                // between still wakes us.
                let notified = buffer.changed();
                tokio::pin!(notified);
                notified.as_mut().enable();

                if buffer.count_at(round, phase) >= quorum {
                    return true;
                }
                if attempts >= self.config.max_poll_attempts {
                    debug!(
                        node = %self.id,
                        round,
                        %phase,
                        have = buffer.count_at(round, phase),
                        need = quorum,
                        "quorum wait budget exhausted, proceeding with partial tally"
                    );
                    return true;
                }
                tokio::select! {
                    biased;
                    res = self.stop_rx.changed() => {
                        if res.is_err() || *self.stop_rx.borrow() {
                            return false;
                        }
                    }
                    _ = notified => {}
                    _ = tokio::time::sleep_until(deadline) => {
                        attempts += 1;
                        break;
                    }
                }
            }
        }
    }

    /// Record the message locally, then fan it out to every peer.
    ///
    /// Self-delivery is synchronous and unconditional: a node always
    /// counts its own message before the network gets a chance to fail.
    fn broadcast(&self, round: u64, phase: Phase, value: Value) {
        let message = ConsensusMessage::new(round, phase, value, self.id);
        self.buffer.record(&message);
        for peer in (0..self.network.num_nodes).map(NodeId) {
            if peer != self.id {
                self.transport.send(peer, message.clone());
            }
        }
    }

    /// Keep lagging peers supplied with the decided value until stopped.
    ///
    /// Rebroadcasts ride the highest round seen anywhere, so a peer deep
    /// in later rounds still counts them toward its current quorums.
    async fn rebroadcast_until_stopped(&mut self, value: Value) {
        loop {
            if *self.stop_rx.borrow() {
                // Status stays Decided; stop only ends the rebroadcasts.
                return;
            }
            let round = self.state.round.max(self.buffer.latest_round());
            self.broadcast(round, Phase::Propose, value);
            self.broadcast(round, Phase::Vote, value);
            tokio::select! {
                biased;
                res = self.stop_rx.changed() => {
                    if res.is_err() || *self.stop_rx.borrow() {
                        return;
                    }
                }
                _ = tokio::time::sleep(self.config.rebroadcast_interval) => {}
            }
        }
    }

    fn decide(&mut self, value: Value) {
        self.state.decided = true;
        self.state.decided_value = Some(value);
        self.state.estimate = value;
        self.state.status = NodeStatus::Decided;
        self.publish();
        info!(node = %self.id, round = self.state.round, value = %value, "decided");
    }

    fn halt(&mut self) {
        self.state.status = NodeStatus::Stopped;
        self.publish();
        info!(node = %self.id, round = self.state.round, "stopped");
    }

    fn coin_flip(&mut self) -> Value {
        Value::from_bit(self.rng.gen::<bool>())
    }

    fn publish(&self) {
        self.state_tx.send_replace(self.state.clone());
    }
}
