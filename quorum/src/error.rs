use thiserror::Error;

/// Errors surfaced by the consensus layer. Acceptor unavailability and
/// dropped messages are absorbed by quorum arithmetic and retries and
/// never appear here.
#[derive(Debug, Error)]
pub enum ConsensusError {
    /// Quorum was not reached within the retry budget. The transaction
    /// layer treats this as a rejection and auto-aborts.
    #[error("consensus failed for key {key:?} after {rounds} rounds")]
    ConsensusFailed {
        /// Key the write was proposed for.
        key: String,
        /// Rounds attempted before giving up.
        rounds: u32,
    },
}
