use std::collections::HashMap;

use log::{debug, info, warn};
use quorum::{Proposer, Store};

/// Transaction outcome. `Prepared` may move to either terminal state;
/// `Committed` and `Aborted` never transition again.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TxnState {
    /// Mutation applied via consensus, awaiting commit or abort.
    Prepared,
    /// Finalized; the prepared mutation stands.
    Committed,
    /// Rolled back; any prepared mutation was compensated.
    Aborted,
}

struct Undo {
    key: String,
    prior: Option<String>,
}

struct TxnRecord {
    state: TxnState,
    undo: Option<Undo>,
}

/// Sequences prepare/commit/abort around consensus-backed writes.
///
/// `prepare` applies the mutation through consensus immediately, so a
/// later `abort` issues a compensating write restoring the key's prior
/// value; otherwise the store would stay mutated by a rolled-back
/// transaction.
pub struct TransactionCoordinator {
    store: Store,
    records: HashMap<String, TxnRecord>,
}

impl TransactionCoordinator {
    /// A coordinator compensating into `store`.
    pub fn new(store: Store) -> Self {
        Self {
            store,
            records: HashMap::new(),
        }
    }

    /// Run the write through consensus and log the transaction. True and
    /// a `Prepared` record on success; on consensus failure the record is
    /// created directly in `Aborted` and false is returned. Transaction
    /// ids are single-use: re-preparing a known id is refused.
    pub async fn prepare(
        &mut self,
        id: &str,
        proposer: &mut Proposer,
        key: &str,
        value: Option<String>,
    ) -> bool {
        if self.records.contains_key(id) {
            warn!("prepare: transaction {} already exists, refused", id);
            return false;
        }
        let prior = self.store.get(key);
        match proposer.propose(key, value).await {
            Ok(decided) => {
                debug!("transaction {} prepared: {}={:?}", id, key, decided);
                self.records.insert(
                    id.to_string(),
                    TxnRecord {
                        state: TxnState::Prepared,
                        undo: Some(Undo {
                            key: key.to_string(),
                            prior,
                        }),
                    },
                );
                true
            }
            Err(e) => {
                warn!("transaction {} aborted: {}", id, e);
                self.records.insert(
                    id.to_string(),
                    TxnRecord {
                        state: TxnState::Aborted,
                        undo: None,
                    },
                );
                false
            }
        }
    }

    /// Log a transaction that never reached consensus (unpreparable
    /// command) directly as `Aborted`.
    pub fn reject(&mut self, id: &str) {
        if self.records.contains_key(id) {
            warn!("reject: transaction {} already exists, refused", id);
            return;
        }
        self.records.insert(
            id.to_string(),
            TxnRecord {
                state: TxnState::Aborted,
                undo: None,
            },
        );
    }

    /// Finalize a prepared transaction. Idempotent: unknown ids and
    /// terminal records are no-ops.
    pub fn commit(&mut self, id: &str) {
        match self.records.get_mut(id) {
            None => warn!("commit: unknown transaction {}", id),
            Some(rec) if rec.state == TxnState::Prepared => {
                rec.state = TxnState::Committed;
                rec.undo = None;
                info!("transaction {} committed", id);
            }
            Some(rec) => debug!("commit: transaction {} already {:?}", id, rec.state),
        }
    }

    /// Roll back a prepared transaction, restoring the key's pre-prepare
    /// value. Idempotent: unknown ids and terminal records are no-ops.
    pub fn abort(&mut self, id: &str) {
        match self.records.get_mut(id) {
            None => warn!("abort: unknown transaction {}", id),
            Some(rec) if rec.state == TxnState::Prepared => {
                if let Some(undo) = rec.undo.take() {
                    self.store.apply(&undo.key, undo.prior);
                }
                rec.state = TxnState::Aborted;
                info!("transaction {} aborted, store compensated", id);
            }
            Some(rec) => debug!("abort: transaction {} already {:?}", id, rec.state),
        }
    }

    /// Current state of a transaction, if known.
    pub fn state(&self, id: &str) -> Option<TxnState> {
        self.records.get(id).map(|r| r.state)
    }
}
