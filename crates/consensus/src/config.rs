//! Engine timing configuration.

use std::time::Duration;

/// Tuning knobs for one engine's round loop.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Delay between re-checks while waiting for a quorum.
    pub poll_interval: Duration,
    /// Poll-timeout budget per quorum wait. When exhausted the engine
    /// proceeds with whatever it has collected, preserving liveness when
    /// more than F nodes are actually down.
    pub max_poll_attempts: u32,
    /// How often a decided engine rebroadcasts its decided value so that
    /// lagging peers can still assemble quorums.
    pub rebroadcast_interval: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(50),
            max_poll_attempts: 20,
            rebroadcast_interval: Duration::from_millis(200),
        }
    }
}

impl EngineConfig {
    /// A fast configuration for tests and local simulation.
    pub fn fast() -> Self {
        Self {
            poll_interval: Duration::from_millis(5),
            max_poll_attempts: 20,
            rebroadcast_interval: Duration::from_millis(20),
        }
    }
}
