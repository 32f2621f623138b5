use std::collections::HashMap;

use simrpc::anyhow::{anyhow, Result};
use simrpc::log::{debug, warn};
use simrpc::tokio::sync::mpsc::Sender;

use crate::{AcceptorService, FaultPlan, Message, ProposalId, Reply};

/// One consensus participant. Keeps a per-key promise and a per-key last
/// accepted value, votes on proposals, and forwards each accepted vote
/// toward the learner.
///
/// The promise recorded for a key never decreases.
pub struct Acceptor {
    id: u32,
    plan: FaultPlan,
    promised: HashMap<String, ProposalId>,
    accepted: HashMap<String, (ProposalId, Option<String>)>,
    learn_tx: Sender<Message>,
}

impl Acceptor {
    /// `plan` decides availability per incoming message; accepted votes
    /// are emitted on `learn_tx`.
    pub fn new(id: u32, plan: FaultPlan, learn_tx: Sender<Message>) -> Self {
        Self {
            id,
            plan,
            promised: HashMap::new(),
            accepted: HashMap::new(),
            learn_tx,
        }
    }

    fn on_prepare(&mut self, id: ProposalId, key: String) -> Reply {
        match self.promised.get(&key).copied() {
            Some(p) if p >= id => Reply::Reject { promised: p },
            _ => {
                let last = self.accepted.get(&key).cloned();
                self.promised.insert(key, id);
                Reply::Promise { last }
            }
        }
    }

    async fn on_accept(&mut self, id: ProposalId, key: String, value: Option<String>) -> Reply {
        match self.promised.get(&key).copied() {
            Some(p) if p == id => {
                self.accepted.insert(key.clone(), (id, value.clone()));
                let vote = Message::Accepted {
                    from: self.id,
                    id,
                    key,
                    value,
                };
                if self.learn_tx.send(vote).await.is_err() {
                    warn!("acc-{}: learner channel closed, vote dropped", self.id);
                }
                Reply::Accepted { id }
            }
            Some(p) => Reply::Reject { promised: p },
            // Accept without a prior prepare: a newer round already
            // cleared us, or the proposer skipped phase 1.
            None => Reply::Reject {
                promised: ProposalId::default(),
            },
        }
    }
}

#[simrpc::async_trait]
impl AcceptorService for Acceptor {
    async fn process(&mut self, msg: Message) -> Result<Reply> {
        if !self.plan.poll() {
            debug!("acc-{}: inactive, dropping {:?}", self.id, msg);
            return Err(anyhow!("acc-{} unavailable", self.id));
        }
        Ok(match msg {
            Message::Prepare { id, key } => self.on_prepare(id, key),
            Message::Accept { id, key, value } => self.on_accept(id, key, value).await,
            Message::Accepted { .. } => {
                warn!("acc-{}: learner-bound message, ignored", self.id);
                Reply::Reject {
                    promised: ProposalId::default(),
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use simrpc::tokio;
    use simrpc::tokio::sync::mpsc;

    fn acceptor(plan: FaultPlan) -> (Acceptor, mpsc::Receiver<Message>) {
        let (tx, rx) = mpsc::channel(16);
        (Acceptor::new(0, plan, tx), rx)
    }

    fn prepare(id: ProposalId, key: &str) -> Message {
        Message::Prepare {
            id,
            key: key.into(),
        }
    }

    fn accept(id: ProposalId, key: &str, value: &str) -> Message {
        Message::Accept {
            id,
            key: key.into(),
            value: Some(value.into()),
        }
    }

    #[tokio::test]
    async fn promises_are_monotonic() {
        let (mut acc, _rx) = acceptor(FaultPlan::Up);
        let low = ProposalId::new(1, 0);
        let high = ProposalId::new(2, 0);

        let reply = acc.process(prepare(high, "k")).await.unwrap();
        assert_eq!(reply, Reply::Promise { last: None });

        // Lower and equal proposals lose; the reject carries the winner.
        let reply = acc.process(prepare(low, "k")).await.unwrap();
        assert_eq!(reply, Reply::Reject { promised: high });
        let reply = acc.process(prepare(high, "k")).await.unwrap();
        assert_eq!(reply, Reply::Reject { promised: high });
    }

    #[tokio::test]
    async fn promise_carries_previously_accepted_value() {
        let (mut acc, _rx) = acceptor(FaultPlan::Up);
        let first = ProposalId::new(1, 0);
        let second = ProposalId::new(2, 1);

        acc.process(prepare(first, "k")).await.unwrap();
        acc.process(accept(first, "k", "v1")).await.unwrap();

        let reply = acc.process(prepare(second, "k")).await.unwrap();
        assert_eq!(
            reply,
            Reply::Promise {
                last: Some((first, Some("v1".into())))
            }
        );
    }

    #[tokio::test]
    async fn accepts_only_at_the_promised_id() {
        let (mut acc, mut rx) = acceptor(FaultPlan::Up);
        let promised = ProposalId::new(3, 0);
        let stale = ProposalId::new(2, 0);

        acc.process(prepare(promised, "k")).await.unwrap();

        let reply = acc.process(accept(stale, "k", "old")).await.unwrap();
        assert_eq!(reply, Reply::Reject { promised });

        let reply = acc.process(accept(promised, "k", "new")).await.unwrap();
        assert_eq!(reply, Reply::Accepted { id: promised });

        // The vote went toward the learner.
        let vote = rx.try_recv().unwrap();
        assert_eq!(
            vote,
            Message::Accepted {
                from: 0,
                id: promised,
                key: "k".into(),
                value: Some("new".into()),
            }
        );
    }

    #[tokio::test]
    async fn accept_without_prepare_is_rejected() {
        let (mut acc, mut rx) = acceptor(FaultPlan::Up);
        let reply = acc
            .process(accept(ProposalId::new(1, 0), "k", "v"))
            .await
            .unwrap();
        assert!(matches!(reply, Reply::Reject { .. }));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn inactive_acceptor_drops_messages() {
        let (mut acc, _rx) = acceptor(FaultPlan::Down);
        let res = acc.process(prepare(ProposalId::new(1, 0), "k")).await;
        assert!(res.is_err());
    }

    #[tokio::test]
    async fn scripted_plan_recovers() {
        let (mut acc, _rx) = acceptor(FaultPlan::scripted(vec![false, true]));
        let id = ProposalId::new(1, 0);
        assert!(acc.process(prepare(id, "k")).await.is_err());
        assert!(acc.process(prepare(id, "k")).await.is_ok());
    }

    #[tokio::test]
    async fn keys_are_independent() {
        let (mut acc, _rx) = acceptor(FaultPlan::Up);
        let high = ProposalId::new(9, 0);
        let low = ProposalId::new(1, 1);

        acc.process(prepare(high, "a")).await.unwrap();
        let reply = acc.process(prepare(low, "b")).await.unwrap();
        assert_eq!(reply, Reply::Promise { last: None });
    }
}
