//! End-to-end cluster runs covering agreement, validity, fault
//! tolerance, and the degraded regime above the fault bound.

use benor_consensus::EngineConfig;
use benor_simulation::{Cluster, ClusterConfig, NetworkOptions};
use benor_types::{NetworkConfig, NodeStatus, Value};
use std::time::Duration;
use tracing_test::traced_test;

const DECIDE_TIMEOUT: Duration = Duration::from_secs(20);

fn mixed_cluster(
    num_nodes: u32,
    max_faulty: u32,
    initial_values: Vec<Value>,
    faulty: Vec<bool>,
) -> Cluster {
    let network = NetworkConfig::new(num_nodes, max_faulty).expect("valid network");
    Cluster::launch(ClusterConfig {
        network,
        engine: EngineConfig::fast(),
        initial_values,
        faulty,
        options: NetworkOptions::default(),
        seed: 42,
    })
    .expect("valid cluster config")
}

#[tokio::test]
#[traced_test]
async fn unanimous_zeros_decide_in_the_first_round() {
    let network = NetworkConfig::new(3, 0).expect("valid network");
    let cluster = Cluster::launch(ClusterConfig::uniform(network, Value::Zero))
        .expect("valid cluster config");
    cluster.start_all();

    let decided = cluster.run_until_decided(DECIDE_TIMEOUT).await;
    assert_eq!(decided, Some(Value::Zero));
    for state in cluster.snapshots() {
        assert_eq!(state.round, 1, "node {} needed extra rounds", state.id);
        assert_eq!(state.decided_value, Some(Value::Zero));
    }
    cluster.stop_all();
}

#[tokio::test]
#[traced_test]
async fn quorum_decides_despite_faulty_minority() {
    // 10 nodes, 3 crashed. The 7 live ones all start at 1 and must
    // still assemble their quorums of 7.
    let faulty: Vec<bool> = (0..10).map(|i| i >= 7).collect();
    let cluster = mixed_cluster(10, 3, vec![Value::One; 10], faulty);
    cluster.start_all();

    let decided = cluster.run_until_decided(DECIDE_TIMEOUT).await;
    assert_eq!(decided, Some(Value::One));
    cluster.stop_all();
}

#[tokio::test]
async fn faulty_nodes_never_participate() {
    let faulty: Vec<bool> = (0..10).map(|i| i >= 7).collect();
    let cluster = mixed_cluster(10, 3, vec![Value::One; 10], faulty);
    cluster.start_all();

    // Traffic aimed straight at a faulty node must bounce off.
    let dead = cluster.node(9).expect("node 9 exists");
    assert!(!dead.start());
    let nudge = benor_types::ConsensusMessage::new(
        1,
        benor_types::Phase::Vote,
        Value::One,
        benor_types::NodeId(0),
    );
    assert!(!dead.deliver(&nudge));

    cluster.run_until_decided(DECIDE_TIMEOUT).await;
    cluster.stop_all();

    for state in cluster.snapshots().into_iter().skip(7) {
        assert_eq!(state.status, NodeStatus::Inert);
        assert_eq!(state.estimate, Value::Unknown);
        assert!(!state.decided);
        assert_eq!(state.decided_value, None);
    }
}

#[tokio::test]
#[traced_test]
async fn cluster_above_fault_bound_keeps_running_without_deciding() {
    // 4 nodes with 2 crashed sits past F < N/3: the two live nodes can
    // reach their quorum of 2 but never the decision threshold, so they
    // grind through rounds indefinitely.
    let cluster = mixed_cluster(
        4,
        2,
        vec![Value::Zero, Value::One, Value::Zero, Value::One],
        vec![false, false, true, true],
    );
    cluster.start_all();
    tokio::time::sleep(Duration::from_millis(500)).await;

    for state in cluster.snapshots().into_iter().take(2) {
        assert!(!state.decided, "node {} must not decide", state.id);
        assert_eq!(state.status, NodeStatus::Running);
        assert!(state.round > 1, "node {} never advanced", state.id);
    }
    cluster.stop_all();
}

#[tokio::test]
async fn mixed_estimates_converge_on_one_value() {
    let cluster = mixed_cluster(
        5,
        0,
        vec![Value::Zero, Value::Zero, Value::One, Value::One, Value::One],
        vec![false; 5],
    );
    cluster.start_all();

    let decided = cluster.run_until_decided(DECIDE_TIMEOUT).await;
    let value = decided.expect("a healthy cluster must decide");
    for state in cluster.snapshots() {
        assert_eq!(state.decided_value, Some(value));
        assert_eq!(state.estimate, value);
    }
    cluster.stop_all();
}

#[tokio::test]
async fn decision_matches_a_unanimous_input() {
    // Validity: when every node proposes 1, no run of coin flips can
    // manufacture a 0 decision.
    let cluster = mixed_cluster(5, 0, vec![Value::One; 5], vec![false; 5]);
    cluster.start_all();

    let decided = cluster.run_until_decided(DECIDE_TIMEOUT).await;
    assert_eq!(decided, Some(Value::One));
    cluster.stop_all();
}

#[tokio::test]
async fn lossy_network_still_converges() {
    let network = NetworkConfig::new(4, 0).expect("valid network");
    let cluster = Cluster::launch(ClusterConfig {
        network,
        engine: EngineConfig::fast(),
        initial_values: vec![Value::Zero, Value::One, Value::One, Value::Zero],
        faulty: vec![false; 4],
        options: NetworkOptions {
            latency: Duration::from_millis(1),
            loss_rate: 0.2,
            seed: 7,
        },
        seed: 7,
    })
    .expect("valid cluster config");
    cluster.start_all();

    let decided = cluster.run_until_decided(Duration::from_secs(60)).await;
    let value = decided.expect("rebroadcasts must pull stragglers through");
    for state in cluster.snapshots() {
        assert_eq!(state.decided_value, Some(value));
    }
    cluster.stop_all();
}

#[tokio::test]
async fn stop_freezes_round_progress() {
    let cluster = mixed_cluster(
        4,
        2,
        vec![Value::Zero; 4],
        vec![false, false, true, true],
    );
    cluster.start_all();
    tokio::time::sleep(Duration::from_millis(200)).await;
    cluster.stop_all();

    // Engines observe the stop within one poll interval.
    tokio::time::sleep(Duration::from_millis(100)).await;
    let frozen = cluster.snapshots();
    for state in frozen.iter().take(2) {
        assert_eq!(state.status, NodeStatus::Stopped);
    }
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(
        cluster.snapshots().iter().map(|s| s.round).collect::<Vec<_>>(),
        frozen.iter().map(|s| s.round).collect::<Vec<_>>(),
        "rounds must not advance after stop"
    );
}
