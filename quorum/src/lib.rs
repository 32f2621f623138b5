#![deny(missing_docs)]
#![deny(clippy::all)]
//! Single-decree consensus over simulated acceptors, materializing
//! decided key-writes into a shared store.
//!
//! A [`Proposer`] drives the two-phase quorum protocol against a set of
//! [`Acceptor`]s; their votes flow to a [`Learner`] that applies decided
//! values to the [`Store`]. Acceptor availability is governed by a
//! [`FaultPlan`], so partitions and crashes are injectable and seeded.

mod acceptor;
mod error;
mod fault;
mod learner;
mod message;
mod proposer;
pub mod store;


pub use acceptor::Acceptor;
pub use error::ConsensusError;
pub use fault::FaultPlan;
pub use learner::Learner;
pub use message::{Message, ProposalId, Reply};
pub use proposer::Proposer;
pub use store::Store;

simrpc::service! {
    /// Votes on proposals, one call per protocol message.
    service acceptor_svc {
        fn process(msg: Message) -> Reply;
    }
}

simrpc::service! {
    /// Aggregates votes into decisions and answers decision lookups.
    service learner_svc {
        fn learn(msg: Message) -> ();
        fn decide(key: String, id: ProposalId, value: Option<String>) -> ();
        fn decided(key: String) -> Option<ProposalId>;
    }
}

pub use acceptor_svc::{
    Client as AcceptorClient, Server as AcceptorServer, Service as AcceptorService,
};

pub use learner_svc::{
    Client as LearnerClient, Server as LearnerServer, Service as LearnerService,
};
