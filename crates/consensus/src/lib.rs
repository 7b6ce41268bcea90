//! Randomized binary consensus state machine (Ben-Or style).
//!
//! This crate provides the per-node consensus engine: the round/phase
//! protocol loop, message buffering, quorum detection, and the decision
//! rule. All network I/O goes through the [`Transport`] seam; all
//! observation goes through the [`EngineHandle`].
//!
//! # Protocol
//!
//! Each round has two phases. With N nodes of which at most F are
//! crash-faulty (silent), a quorum is N − F distinct senders:
//!
//! - **Propose**: broadcast the current estimate, wait for a propose
//!   quorum. If a strict majority of the collected proposals carry the
//!   same value, adopt it; otherwise flip an unbiased coin.
//! - **Vote**: broadcast the adopted estimate, wait for a vote quorum.
//!   If a value holds more than (N + F) / 2 of the votes, decide it.
//!   Otherwise, if a value holds more than F votes it cannot have come
//!   only from faulty nodes, so adopt it for the next round; failing
//!   that, flip a coin. Increment the round and repeat.
//!
//! # Safety and liveness
//!
//! - **Agreement**: a decision with more than (N + F) / 2 votes forces
//!   every other quorum of N − F votes to contain more than F votes for
//!   the same value whenever F < N/3, so every other node adopts it and
//!   can only ever decide it. The F < N/3 threshold is emergent from
//!   this quorum arithmetic; there is no branch keyed on it.
//! - **Termination**: the coin flip defeats adversarial scheduling; a
//!   deterministic tie-break could be starved forever, an unbiased coin
//!   cannot. With F at or above N/3 the engine simply keeps running
//!   without deciding, which is the designed degradation.
//! - **Bounded waits**: both quorum waits are wakeup-driven with a
//!   bounded poll-attempt budget, so a node never blocks forever when
//!   more than F peers are actually down, and a stop command is
//!   observed within one poll interval.

mod buffer;
mod config;
mod engine;
mod handle;
mod transport;

pub use buffer::{RoundBuffer, Tally};
pub use config::EngineConfig;
pub use engine::ConsensusEngine;
pub use handle::EngineHandle;
pub use transport::Transport;
