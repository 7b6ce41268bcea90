//! Core types for the randomized binary consensus network.
//!
//! This crate provides the foundational types shared by every node:
//!
//! - **Values**: the binary consensus domain ([`Value`])
//! - **Identifiers**: [`NodeId`]
//! - **Wire vocabulary**: [`ConsensusMessage`], [`Phase`]
//! - **Observable state**: [`NodeState`], [`NodeStatus`]
//! - **Network sizing**: [`NetworkConfig`] with fail-fast validation
//!
//! # Design Philosophy
//!
//! This crate is self-contained with minimal dependencies. It does not depend
//! on any other workspace crates, making it the foundation layer. Types here
//! are pure data: construction, equality, and (de)serialization only.

mod config;
mod message;
mod state;
mod value;

pub use config::{ConfigError, NetworkConfig};
pub use message::{ConsensusMessage, Phase};
pub use state::{NodeState, NodeStatus};
pub use value::Value;

/// Identifier of a participant, stable for the lifetime of the network.
///
/// Node ids are indices in `[0, N)`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
