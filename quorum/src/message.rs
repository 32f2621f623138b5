use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifies one proposal round. Ordered by round number first, with the
/// proposer id breaking ties, so two proposers can never collide and a
/// proposer's successive ids strictly increase.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct ProposalId {
    /// Round counter, bumped by the proposer on every attempt.
    pub round: u32,
    /// Id of the proposer that generated this proposal.
    pub proposer: u32,
}

impl ProposalId {
    /// Build an id for `round` issued by `proposer`.
    pub fn new(round: u32, proposer: u32) -> Self {
        Self { round, proposer }
    }
}

impl fmt::Display for ProposalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.round, self.proposer)
    }
}

/// Protocol unit exchanged between proposer, acceptors and learner.
/// Immutable once constructed; one instance per round and destination.
///
/// A `value` of `None` encodes a delete of the key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Message {
    /// Phase 1: ask an acceptor to promise not to accept anything below `id`.
    Prepare {
        /// Proposal this round runs under.
        id: ProposalId,
        /// Key the round decides a value for.
        key: String,
    },
    /// Phase 2: ask an acceptor to accept `value` for `key` under `id`.
    Accept {
        /// Proposal this round runs under.
        id: ProposalId,
        /// Key the round decides a value for.
        key: String,
        /// Proposed value; `None` deletes the key.
        value: Option<String>,
    },
    /// An acceptor's vote, emitted toward the learner after accepting.
    Accepted {
        /// Id of the acceptor that voted.
        from: u32,
        /// Proposal the vote was cast under.
        id: ProposalId,
        /// Key the vote is for.
        key: String,
        /// Accepted value; `None` deletes the key.
        value: Option<String>,
    },
}

/// An acceptor's answer to a [`Message`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reply {
    /// Promise not to accept anything below the prepared id. Carries the
    /// acceptor's last accepted (id, value) for the key, if any, so the
    /// proposer can re-propose an in-flight value instead of clobbering it.
    Promise {
        /// Last accepted proposal for the key, if any.
        last: Option<(ProposalId, Option<String>)>,
    },
    /// The value was accepted under `id`.
    Accepted {
        /// Proposal the acceptance was recorded under.
        id: ProposalId,
    },
    /// The request lost to a higher proposal; `promised` lets the caller
    /// fast-forward its round counter.
    Reject {
        /// Highest proposal id the acceptor has promised for the key.
        promised: ProposalId,
    },
}
