//! Cluster builders for the integration tests.

use quorum::tests::ConsensusCluster;
use quorum::Proposer;
use simrpc::tokio;
use simrpc::tokio::task::JoinHandle;
use simrpc::Network;

use crate::kv::KvNode;
use crate::{KvClient, KvServer};

/// Register `n` store nodes on `net`, each proposing into `cluster`.
/// Node `i` gets proposer id `i`; all nodes view the cluster's store.
pub fn kv_cluster(
    net: &Network,
    n: u32,
    cluster: &ConsensusCluster,
) -> (Vec<KvClient>, Vec<JoinHandle<()>>) {
    let mut clients = Vec::new();
    let mut tasks = Vec::new();
    for i in 0..n {
        let store = cluster.store.clone();
        let acceptors = cluster.acceptors.clone();
        let learner = cluster.learner.clone();
        let (client, routine) = net.register_service::<KvServer<KvNode>, KvClient, _>(
            format!("kv-{}", i),
            move || {
                KvNode::new(
                    store.clone(),
                    Proposer::new(i, acceptors.clone(), learner.clone()),
                )
            },
        );
        clients.push(client);
        tasks.push(tokio::spawn(routine));
    }
    (clients, tasks)
}
