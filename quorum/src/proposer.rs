use std::ops::Range;
use std::time::Duration;

use rand::Rng;
use simrpc::futures::stream::{FuturesUnordered, StreamExt};
use simrpc::log::{debug, trace, warn};
use simrpc::tokio;

use crate::{AcceptorClient, ConsensusError, LearnerClient, Message, ProposalId, Reply};

const DEFAULT_MAX_ROUNDS: u32 = 8;
const DEFAULT_BACKOFF_MS: Range<u64> = 10..100;

/// Drives the two-phase quorum protocol for single key-writes.
///
/// Each attempt runs under a strictly higher [`ProposalId`]; both phases
/// fan out to all acceptors concurrently and stop as soon as a majority
/// has answered, so inactive acceptors are never waited for beyond the
/// per-call bound.
pub struct Proposer {
    id: u32,
    round: u32,
    acceptors: Vec<AcceptorClient>,
    learner: LearnerClient,
    max_rounds: u32,
    backoff_ms: Range<u64>,
}

impl Proposer {
    /// A proposer with the default retry budget. `id` must be unique
    /// among the proposers sharing these acceptors.
    pub fn new(id: u32, acceptors: Vec<AcceptorClient>, learner: LearnerClient) -> Self {
        Self {
            id,
            round: 0,
            acceptors,
            learner,
            max_rounds: DEFAULT_MAX_ROUNDS,
            backoff_ms: DEFAULT_BACKOFF_MS,
        }
    }

    /// Override the retry budget and the jittered backoff between rounds.
    /// `backoff_ms` must be a non-empty range.
    pub fn with_limits(mut self, max_rounds: u32, backoff_ms: Range<u64>) -> Self {
        self.max_rounds = max_rounds;
        self.backoff_ms = backoff_ms;
        self
    }

    /// Propose `value` for `key` (`None` deletes the key) and drive it to
    /// a decision. Returns the decided value, which is the in-flight value
    /// adopted from a promise when one exists, otherwise the requested one.
    /// The learner has applied the decision to the store before this
    /// returns Ok.
    pub async fn propose(
        &mut self,
        key: &str,
        value: Option<String>,
    ) -> Result<Option<String>, ConsensusError> {
        let majority = self.acceptors.len() / 2 + 1;

        for attempt in 0..self.max_rounds {
            if attempt > 0 {
                let dt = rand::thread_rng().gen_range(self.backoff_ms.clone());
                tokio::time::sleep(Duration::from_millis(dt)).await;
            }
            self.round += 1;
            let pid = ProposalId::new(self.round, self.id);
            trace!("propose {}={:?} round {}", key, value, pid);

            // Phase 1: gather promises until majority.
            let mut pending: FuturesUnordered<_> = self
                .acceptors
                .iter()
                .cloned()
                .map(|c| {
                    let key = key.to_string();
                    async move { c.process(Message::Prepare { id: pid, key }).await }
                })
                .collect();

            let mut promises = 0;
            let mut last_accepted: Option<(ProposalId, Option<String>)> = None;
            let mut highest_seen = pid;
            while let Some(res) = pending.next().await {
                match res {
                    Ok(Reply::Promise { last }) => {
                        promises += 1;
                        if let Some((aid, av)) = last {
                            match &last_accepted {
                                Some((cur, _)) if *cur >= aid => {}
                                _ => last_accepted = Some((aid, av)),
                            }
                        }
                        if promises >= majority {
                            break;
                        }
                    }
                    Ok(Reply::Reject { promised }) => {
                        if promised > highest_seen {
                            highest_seen = promised;
                        }
                    }
                    Ok(other) => debug!("unexpected prepare reply: {:?}", other),
                    Err(e) => debug!("prepare fan-out: {}", e),
                }
            }
            drop(pending);
            if promises < majority {
                self.round = self.round.max(highest_seen.round);
                continue;
            }

            // Adopt an in-flight value from the highest-id promise unless
            // the learner already finalized it; an already-applied value
            // needs no re-proposing and would shadow this write.
            let decided = match self.learner.decided(key.to_string()).await {
                Ok(d) => d,
                Err(e) => {
                    debug!("decided lookup failed, assuming in flight: {}", e);
                    None
                }
            };
            let chosen = match last_accepted {
                Some((aid, av)) if decided < Some(aid) => {
                    debug!("adopting in-flight value {:?} from {}", av, aid);
                    av
                }
                _ => value.clone(),
            };

            // Phase 2: gather acceptances until majority.
            let mut pending: FuturesUnordered<_> = self
                .acceptors
                .iter()
                .cloned()
                .map(|c| {
                    let key = key.to_string();
                    let value = chosen.clone();
                    async move { c.process(Message::Accept { id: pid, key, value }).await }
                })
                .collect();

            let mut accepted = 0;
            while let Some(res) = pending.next().await {
                match res {
                    Ok(Reply::Accepted { id }) if id == pid => {
                        accepted += 1;
                        if accepted >= majority {
                            break;
                        }
                    }
                    Ok(Reply::Reject { promised }) => {
                        if promised > highest_seen {
                            highest_seen = promised;
                        }
                    }
                    Ok(other) => debug!("unexpected accept reply: {:?}", other),
                    Err(e) => debug!("accept fan-out: {}", e),
                }
            }
            drop(pending);
            if accepted < majority {
                self.round = self.round.max(highest_seen.round);
                continue;
            }

            // Decided. The learner must apply before we report success.
            match self.learner.decide(key.to_string(), pid, chosen.clone()).await {
                Ok(()) => return Ok(chosen),
                Err(e) => {
                    warn!("decided at {} but learner notify failed: {}", pid, e);
                    continue;
                }
            }
        }

        Err(ConsensusError::ConsensusFailed {
            key: key.to_string(),
            rounds: self.max_rounds,
        })
    }
}
