//! Consensus simulation CLI
//!
//! Launches an in-process cluster, runs it to a decision (or a
//! timeout), and prints the outcome per node.
//!
//! # Example
//!
//! ```bash
//! # 10 nodes, 3 crash-faulty, mixed initial values
//! benor-sim -n 10 -f 3 --ones 4
//!
//! # Same run, same coins
//! benor-sim -n 10 -f 3 --ones 4 --seed 7
//!
//! # Serve each node's control endpoints on ports 3000..3003 and let
//! # an external harness drive /start, /state, /message
//! benor-sim -n 4 --rpc-base-port 3000
//! ```

use benor_consensus::EngineConfig;
use benor_simulation::{Cluster, ClusterConfig, NetworkOptions};
use benor_types::{NetworkConfig, Value};
use clap::Parser;
use std::net::SocketAddr;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Randomized binary consensus simulator
///
/// Runs N nodes of which F are crash-faulty in a single process. Given
/// the same parameters and seed, coin flips are identical every run.
#[derive(Parser, Debug)]
#[command(name = "benor-sim")]
#[command(version, about, long_about = None)]
struct Args {
    /// Number of nodes
    #[arg(short = 'n', long, default_value = "4")]
    nodes: u32,

    /// Number of crash-faulty nodes (the first F node indices)
    #[arg(short = 'f', long, default_value = "0")]
    faulty: u32,

    /// How many of the non-faulty nodes start with estimate 1
    /// (the rest start with 0)
    #[arg(long, default_value = "0")]
    ones: u32,

    /// Random seed for the per-node coin flips
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Give up after this many seconds without a decision
    #[arg(short = 't', long, default_value = "30")]
    timeout: u64,

    /// Probability that any message is dropped (0.0-1.0)
    #[arg(long, default_value = "0.0")]
    loss_rate: f64,

    /// Per-message delivery latency in milliseconds
    #[arg(long, default_value = "0")]
    latency_ms: u64,

    /// Delay between quorum re-checks in milliseconds
    #[arg(long, default_value = "50")]
    poll_interval_ms: u64,

    /// Poll-timeout budget per quorum wait
    #[arg(long, default_value = "20")]
    max_poll_attempts: u32,

    /// Serve each node's HTTP control endpoints on 127.0.0.1, node i on
    /// this port + i. The cluster is then left idle for an external
    /// harness to drive; the process runs until Ctrl-C
    #[arg(long)]
    rpc_base_port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let network = NetworkConfig::new(args.nodes, args.faulty)?;
    if !network.within_fault_bound() {
        warn!(
            nodes = args.nodes,
            faulty = args.faulty,
            "fault count at or above N/3, the run may never decide"
        );
    }

    // The first F indices are the crashed ones; initial ones are dealt
    // to the live nodes from the back.
    let n = args.nodes as usize;
    let faulty: Vec<bool> = (0..n).map(|i| i < args.faulty as usize).collect();
    let mut initial_values = vec![Value::Zero; n];
    let mut ones_left = args.ones;
    for i in (0..n).rev() {
        if ones_left == 0 {
            break;
        }
        if !faulty[i] {
            initial_values[i] = Value::One;
            ones_left -= 1;
        }
    }

    let cluster = Cluster::launch(ClusterConfig {
        network,
        engine: EngineConfig {
            poll_interval: Duration::from_millis(args.poll_interval_ms),
            max_poll_attempts: args.max_poll_attempts,
            ..EngineConfig::default()
        },
        initial_values,
        faulty,
        options: NetworkOptions {
            latency: Duration::from_millis(args.latency_ms),
            loss_rate: args.loss_rate,
            seed: args.seed,
        },
        seed: args.seed,
    })?;

    if let Some(base_port) = args.rpc_base_port {
        let base_addr = SocketAddr::from(([127, 0, 0, 1], base_port));
        let servers = benor_rpc::serve_handles(cluster.handles(), base_addr).await?;
        info!(
            nodes = args.nodes,
            base_port,
            "serving control endpoints, press Ctrl-C to exit"
        );
        tokio::signal::ctrl_c().await?;
        cluster.stop_all();
        for server in &servers {
            server.abort();
        }
        return Ok(());
    }

    info!(nodes = args.nodes, faulty = args.faulty, ones = args.ones, "starting cluster");
    cluster.start_all();

    let outcome = cluster
        .run_until_decided(Duration::from_secs(args.timeout))
        .await;
    cluster.stop_all();

    for state in cluster.snapshots() {
        info!(
            node = %state.id,
            status = ?state.status,
            round = state.round,
            estimate = %state.estimate,
            decided = state.decided,
            "final state"
        );
    }
    match outcome {
        Some(value) => info!(value = %value, "cluster decided"),
        None => warn!("no decision within the timeout"),
    }
    Ok(())
}
