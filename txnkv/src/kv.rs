use log::debug;
use quorum::{Proposer, Store};
use simrpc::anyhow::Result;

use crate::command::Command;
use crate::coordinator::TransactionCoordinator;
use crate::KvService;

/// One replicated store node: a view of the shared state plus a proposer
/// that drives writes through consensus.
///
/// Writes return only after the decided value is applied; reads are
/// served from local state and never wait on consensus.
pub struct KvNode {
    store: Store,
    proposer: Proposer,
    coordinator: TransactionCoordinator,
}

impl KvNode {
    /// A node over `store` proposing via `proposer`.
    pub fn new(store: Store, proposer: Proposer) -> Self {
        let coordinator = TransactionCoordinator::new(store.clone());
        Self {
            store,
            proposer,
            coordinator,
        }
    }
}

#[simrpc::async_trait]
impl KvService for KvNode {
    async fn put(&mut self, key: String, value: String) -> Result<String> {
        self.proposer.propose(&key, Some(value)).await?;
        Ok("Put successful".to_string())
    }

    async fn get(&mut self, key: String) -> Result<String> {
        Ok(self
            .store
            .get(&key)
            .unwrap_or_else(|| "Key not found!".to_string()))
    }

    async fn delete(&mut self, key: String) -> Result<String> {
        if self.store.get(&key).is_none() {
            return Ok("Key not found!".to_string());
        }
        self.proposer.propose(&key, None).await?;
        Ok("Delete successful".to_string())
    }

    async fn handle_command(&mut self, command: String) -> Result<String> {
        match Command::parse(&command) {
            Some(Command::Put { key, value }) => self.put(key, value).await,
            Some(Command::Get { key }) => self.get(key).await,
            Some(Command::Delete { key }) => self.delete(key).await,
            None => Ok("Invalid command!".to_string()),
        }
    }

    async fn prepare(&mut self, txn_id: String, command: String) -> Result<bool> {
        let outcome = match Command::parse(&command) {
            Some(Command::Put { key, value }) => {
                self.coordinator
                    .prepare(&txn_id, &mut self.proposer, &key, Some(value))
                    .await
            }
            Some(Command::Delete { key }) => {
                if self.store.get(&key).is_none() {
                    debug!("prepare {}: delete of missing key {}", txn_id, key);
                    self.coordinator.reject(&txn_id);
                    false
                } else {
                    self.coordinator
                        .prepare(&txn_id, &mut self.proposer, &key, None)
                        .await
                }
            }
            // Reads and malformed commands have nothing to prepare.
            _ => {
                debug!("prepare {}: unpreparable command {:?}", txn_id, command);
                self.coordinator.reject(&txn_id);
                false
            }
        };
        Ok(outcome)
    }

    async fn commit(&mut self, txn_id: String) -> Result<()> {
        self.coordinator.commit(&txn_id);
        Ok(())
    }

    async fn abort(&mut self, txn_id: String) -> Result<()> {
        self.coordinator.abort(&txn_id);
        Ok(())
    }
}
