//! Simulated message fabric with latency and packet loss.

use benor_consensus::{EngineHandle, Transport};
use benor_types::{ConsensusMessage, NodeId};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::HashMap;
use std::sync::{Mutex, RwLock};
use std::time::Duration;
use tracing::{debug, trace};

/// Delivery behavior of the simulated network.
#[derive(Debug, Clone)]
pub struct NetworkOptions {
    /// Fixed delay applied to every delivery. Zero means inline,
    /// synchronous delivery, which keeps runs fully deterministic.
    pub latency: Duration,
    /// Probability in `[0.0, 1.0]` that a message is silently dropped.
    pub loss_rate: f64,
    /// Seed for the drop lottery.
    pub seed: u64,
}

impl Default for NetworkOptions {
    fn default() -> Self {
        Self {
            latency: Duration::ZERO,
            loss_rate: 0.0,
            seed: 42,
        }
    }
}

/// In-process network connecting the engines of one cluster.
///
/// Engines and the network reference each other, so construction is
/// two-step: build the network first, hand it to each engine as its
/// transport, then [`register`](SimulatedNetwork::register) the handles
/// as they come out. Sends to unregistered or faulty nodes disappear
/// silently, exactly like sends to a crashed process.
pub struct SimulatedNetwork {
    peers: RwLock<HashMap<NodeId, EngineHandle>>,
    options: NetworkOptions,
    rng: Mutex<ChaCha8Rng>,
}

impl SimulatedNetwork {
    pub fn new(options: NetworkOptions) -> Self {
        let rng = ChaCha8Rng::seed_from_u64(options.seed);
        Self {
            peers: RwLock::new(HashMap::new()),
            options,
            rng: Mutex::new(rng),
        }
    }

    /// Attach a node's handle so the network can deliver to it.
    pub fn register(&self, handle: EngineHandle) {
        let mut peers = self.peers.write().unwrap_or_else(|e| e.into_inner());
        peers.insert(handle.id(), handle);
    }

    fn handle_of(&self, id: NodeId) -> Option<EngineHandle> {
        let peers = self.peers.read().unwrap_or_else(|e| e.into_inner());
        peers.get(&id).cloned()
    }

    fn should_drop(&self) -> bool {
        if self.options.loss_rate <= 0.0 {
            return false;
        }
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        rng.gen::<f64>() < self.options.loss_rate
    }
}

impl Transport for SimulatedNetwork {
    fn send(&self, to: NodeId, message: ConsensusMessage) {
        if self.should_drop() {
            debug!(%to, from = %message.sender, round = message.round, "dropping message");
            return;
        }
        let Some(handle) = self.handle_of(to) else {
            trace!(%to, "send to unregistered node");
            return;
        };
        if self.options.latency.is_zero() {
            handle.deliver(&message);
            return;
        }
        let latency = self.options.latency;
        tokio::spawn(async move {
            tokio::time::sleep(latency).await;
            handle.deliver(&message);
        });
    }
}
