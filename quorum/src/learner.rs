use std::collections::{HashMap, HashSet};

use simrpc::anyhow::Result;
use simrpc::log::{debug, info};

use crate::{LearnerService, Message, ProposalId, Store};

/// Aggregates acceptor votes into decisions and materializes them into
/// the store.
///
/// A decision for a key is finalized the first time a majority of
/// distinct acceptors is seen for one (key, proposal) pair; re-delivered
/// votes and repeated decisions are no-ops. A finalized decision is only
/// ever superseded by a strictly higher proposal id, never reverted.
pub struct Learner {
    store: Store,
    majority: usize,
    votes: HashMap<(String, ProposalId), HashSet<u32>>,
    decided: HashMap<String, ProposalId>,
}

impl Learner {
    /// `majority` is ⌊N/2⌋+1 for the acceptor cluster feeding this learner.
    pub fn new(store: Store, majority: usize) -> Self {
        Self {
            store,
            majority,
            votes: HashMap::new(),
            decided: HashMap::new(),
        }
    }

    /// Apply a decision unless an equal or higher one is already final.
    fn finalize(&mut self, key: &str, id: ProposalId, value: Option<String>) {
        match self.decided.get(key).copied() {
            Some(d) if d >= id => {
                debug!("decision {} for {} ignored, already final at {}", id, key, d);
            }
            _ => {
                info!("key {} decided at {}: {:?}", key, id, value);
                self.store.apply(key, value);
                self.decided.insert(key.to_string(), id);
                // Ballots this decision obsoletes are dead weight.
                self.votes.retain(|(k, vid), _| k != key || *vid > id);
            }
        }
    }
}

#[simrpc::async_trait]
impl LearnerService for Learner {
    async fn learn(&mut self, msg: Message) -> Result<()> {
        if let Message::Accepted {
            from,
            id,
            key,
            value,
        } = msg
        {
            if self.decided.get(&key).copied() >= Some(id) {
                return Ok(());
            }
            let voters = self.votes.entry((key.clone(), id)).or_default();
            if !voters.insert(from) {
                // Duplicate vote from the same acceptor.
                return Ok(());
            }
            if voters.len() >= self.majority {
                self.finalize(&key, id, value);
            }
        }
        Ok(())
    }

    async fn decide(&mut self, key: String, id: ProposalId, value: Option<String>) -> Result<()> {
        self.finalize(&key, id, value);
        Ok(())
    }

    async fn decided(&mut self, key: String) -> Result<Option<ProposalId>> {
        Ok(self.decided.get(&key).copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use simrpc::tokio;

    fn vote(from: u32, id: ProposalId, key: &str, value: &str) -> Message {
        Message::Accepted {
            from,
            id,
            key: key.into(),
            value: Some(value.into()),
        }
    }

    #[tokio::test]
    async fn applies_on_majority_of_distinct_voters() {
        let store = Store::new();
        let mut learner = Learner::new(store.clone(), 2);
        let id = ProposalId::new(1, 0);

        learner.learn(vote(0, id, "k", "v")).await.unwrap();
        assert_eq!(store.get("k"), None);
        learner.learn(vote(1, id, "k", "v")).await.unwrap();
        assert_eq!(store.get("k"), Some("v".into()));
        assert_eq!(learner.decided("k".into()).await.unwrap(), Some(id));
    }

    #[tokio::test]
    async fn duplicate_votes_do_not_count() {
        let store = Store::new();
        let mut learner = Learner::new(store.clone(), 2);
        let id = ProposalId::new(1, 0);

        learner.learn(vote(0, id, "k", "v")).await.unwrap();
        learner.learn(vote(0, id, "k", "v")).await.unwrap();
        learner.learn(vote(0, id, "k", "v")).await.unwrap();
        assert_eq!(store.get("k"), None);
    }

    #[tokio::test]
    async fn redelivery_after_finalize_is_a_noop() {
        let store = Store::new();
        let mut learner = Learner::new(store.clone(), 2);
        let id = ProposalId::new(1, 0);

        learner.learn(vote(0, id, "k", "v")).await.unwrap();
        learner.learn(vote(1, id, "k", "v")).await.unwrap();
        store.apply("k", Some("poked".into()));
        // Same decision again: must not re-apply.
        learner.learn(vote(2, id, "k", "v")).await.unwrap();
        learner.learn(vote(0, id, "k", "v")).await.unwrap();
        assert_eq!(store.get("k"), Some("poked".into()));
    }

    #[tokio::test]
    async fn higher_id_supersedes_lower_never_reverts() {
        let store = Store::new();
        let mut learner = Learner::new(store.clone(), 1);
        let old = ProposalId::new(1, 0);
        let new = ProposalId::new(2, 0);

        learner.decide("k".into(), new, Some("new".into())).await.unwrap();
        assert_eq!(store.get("k"), Some("new".into()));

        // A straggler decision from an older round is ignored.
        learner.decide("k".into(), old, Some("old".into())).await.unwrap();
        assert_eq!(store.get("k"), Some("new".into()));
        assert_eq!(learner.decided("k".into()).await.unwrap(), Some(new));
    }

    #[tokio::test]
    async fn absent_value_removes_the_key() {
        let store = Store::new();
        let mut learner = Learner::new(store.clone(), 1);

        learner
            .decide("k".into(), ProposalId::new(1, 0), Some("v".into()))
            .await
            .unwrap();
        learner
            .decide("k".into(), ProposalId::new(2, 0), None)
            .await
            .unwrap();
        assert_eq!(store.get("k"), None);
    }

    #[tokio::test]
    async fn repeated_decide_is_idempotent() {
        let store = Store::new();
        let mut learner = Learner::new(store.clone(), 1);
        let id = ProposalId::new(1, 0);

        learner.decide("k".into(), id, Some("v".into())).await.unwrap();
        store.apply("k", Some("poked".into()));
        learner.decide("k".into(), id, Some("v".into())).await.unwrap();
        assert_eq!(store.get("k"), Some("poked".into()));
    }
}
