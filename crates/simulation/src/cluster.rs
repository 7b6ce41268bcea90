//! Cluster supervisor: spawns, wires, and drives a set of nodes.

use crate::{NetworkOptions, SimulatedNetwork};
use benor_consensus::{ConsensusEngine, EngineConfig, EngineHandle};
use benor_types::{ConfigError, NetworkConfig, NodeId, NodeState, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::info;

/// Everything needed to launch one cluster.
#[derive(Debug, Clone)]
pub struct ClusterConfig {
    pub network: NetworkConfig,
    pub engine: EngineConfig,
    /// Initial estimate per node; length must equal N.
    pub initial_values: Vec<Value>,
    /// Crash-fault flag per node; length must equal N and exactly F
    /// entries must be true.
    pub faulty: Vec<bool>,
    pub options: NetworkOptions,
    /// Base seed; node i flips coins with `seed + i`.
    pub seed: u64,
}

impl ClusterConfig {
    /// A healthy cluster where every node starts from the same value.
    pub fn uniform(network: NetworkConfig, value: Value) -> Self {
        let n = network.num_nodes as usize;
        Self {
            network,
            engine: EngineConfig::fast(),
            initial_values: vec![value; n],
            faulty: vec![false; n],
            options: NetworkOptions::default(),
            seed: 42,
        }
    }
}

/// A launched cluster: one engine task per non-faulty node, all wired
/// through a shared [`SimulatedNetwork`].
pub struct Cluster {
    handles: Vec<EngineHandle>,
    network: Arc<SimulatedNetwork>,
}

impl Cluster {
    /// Validate the configuration and spawn every node.
    ///
    /// Nodes come up idle; call [`start_all`](Cluster::start_all) to set
    /// them running. Faulty nodes get inert handles and no task.
    pub fn launch(config: ClusterConfig) -> Result<Self, ConfigError> {
        let n = config.network.num_nodes as usize;
        if config.initial_values.len() != n {
            return Err(ConfigError::LengthMismatch {
                what: "initial_values",
                got: config.initial_values.len(),
                expected: n,
            });
        }
        if config.faulty.len() != n {
            return Err(ConfigError::LengthMismatch {
                what: "faulty",
                got: config.faulty.len(),
                expected: n,
            });
        }
        let marked = config.faulty.iter().filter(|f| **f).count();
        if marked != config.network.max_faulty as usize {
            return Err(ConfigError::FaultyCountMismatch {
                got: marked,
                expected: config.network.max_faulty as usize,
            });
        }

        let network = Arc::new(SimulatedNetwork::new(config.options.clone()));
        let mut handles = Vec::with_capacity(n);
        for i in 0..n {
            let id = NodeId(i as u32);
            let handle = if config.faulty[i] {
                EngineHandle::inert(id)
            } else {
                ConsensusEngine::spawn(
                    id,
                    config.initial_values[i],
                    config.network,
                    config.engine.clone(),
                    Arc::clone(&network) as Arc<dyn benor_consensus::Transport>,
                    config.seed.wrapping_add(i as u64),
                )
            };
            network.register(handle.clone());
            handles.push(handle);
        }
        info!(
            num_nodes = config.network.num_nodes,
            max_faulty = config.network.max_faulty,
            seed = config.seed,
            "cluster launched"
        );
        Ok(Self { handles, network })
    }

    /// Start every non-faulty node.
    pub fn start_all(&self) {
        for handle in &self.handles {
            handle.start();
        }
    }

    /// Stop every non-faulty node. Idempotent.
    pub fn stop_all(&self) {
        for handle in &self.handles {
            handle.stop();
        }
    }

    pub fn node(&self, index: usize) -> Option<&EngineHandle> {
        self.handles.get(index)
    }

    pub fn handles(&self) -> &[EngineHandle] {
        &self.handles
    }

    pub fn network(&self) -> &Arc<SimulatedNetwork> {
        &self.network
    }

    /// State snapshot of every node, faulty ones included.
    pub fn snapshots(&self) -> Vec<NodeState> {
        self.handles.iter().map(EngineHandle::snapshot).collect()
    }

    /// True once every non-faulty node has decided.
    pub fn all_nonfaulty_decided(&self) -> bool {
        self.handles
            .iter()
            .filter(|h| !h.is_faulty())
            .all(|h| h.snapshot().decided)
    }

    /// The common decided value, if every non-faulty node has decided
    /// and they agree. `None` while undecided or (impossibly) split.
    pub fn decided_value(&self) -> Option<Value> {
        let mut decided = None;
        for handle in &self.handles {
            if handle.is_faulty() {
                continue;
            }
            let value = handle.snapshot().decided_value?;
            match decided {
                None => decided = Some(value),
                Some(prev) if prev != value => return None,
                Some(_) => {}
            }
        }
        decided
    }

    /// Poll until every non-faulty node has decided on one value, or
    /// until the deadline passes.
    pub async fn run_until_decided(&self, timeout: Duration) -> Option<Value> {
        let deadline = Instant::now() + timeout;
        loop {
            if self.all_nonfaulty_decided() {
                return self.decided_value();
            }
            if Instant::now() >= deadline {
                return None;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }
}
