//! In-process network simulation and cluster supervision.
//!
//! Wires a set of [`benor_consensus::ConsensusEngine`]s together over a
//! [`SimulatedNetwork`] with configurable latency and packet loss, and
//! drives whole runs through the [`Cluster`] supervisor. Given the same
//! seed and zero latency, a run's coin flips are identical every time.

mod cluster;
mod network;

pub use cluster::{Cluster, ClusterConfig};
pub use network::{NetworkOptions, SimulatedNetwork};
