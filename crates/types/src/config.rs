//! Network sizing configuration with fail-fast validation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors detected at network-construction time, before any node starts.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The network must contain at least one node.
    #[error("network must contain at least one node")]
    EmptyNetwork,

    /// F must stay strictly below N.
    #[error("faulty count {max_faulty} must be less than node count {num_nodes}")]
    TooManyFaulty { num_nodes: u32, max_faulty: u32 },

    /// A per-node array does not match N.
    #[error("{what} has length {got}, expected {expected}")]
    LengthMismatch {
        what: &'static str,
        got: usize,
        expected: usize,
    },

    /// The faulty-flag array does not mark exactly F nodes.
    #[error("faulty flags mark {got} nodes, expected {expected}")]
    FaultyCountMismatch { got: usize, expected: usize },
}

/// Size parameters of one network instance.
///
/// The protocol preserves agreement and terminates with probability 1 as
/// long as `max_faulty < num_nodes / 3`. Configurations above that bound
/// are still accepted: the engines simply keep running without deciding,
/// which is the designed behavior when the fault assumption is violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Total number of nodes (N).
    pub num_nodes: u32,
    /// Number of crash-faulty nodes the run tolerates (F).
    pub max_faulty: u32,
}

impl NetworkConfig {
    /// Create a validated configuration. `0 <= F < N` is enforced here.
    pub fn new(num_nodes: u32, max_faulty: u32) -> Result<Self, ConfigError> {
        if num_nodes == 0 {
            return Err(ConfigError::EmptyNetwork);
        }
        if max_faulty >= num_nodes {
            return Err(ConfigError::TooManyFaulty {
                num_nodes,
                max_faulty,
            });
        }
        Ok(Self {
            num_nodes,
            max_faulty,
        })
    }

    /// Quorum size: `N - F` distinct senders.
    pub fn quorum(&self) -> usize {
        (self.num_nodes - self.max_faulty) as usize
    }

    /// Whether the configuration sits inside the guaranteed-termination
    /// bound `F < N/3`. Informational only; the engine never branches on it.
    pub fn within_fault_bound(&self) -> bool {
        3 * self.max_faulty < self.num_nodes
    }
}
