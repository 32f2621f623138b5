#![deny(missing_docs)]
#![deny(clippy::all)]
//! Replicated KV store: every write is agreed via quorum consensus, and
//! writes can be wrapped in a prepare/commit/abort transaction envelope.

simrpc::service! {
    /// The request/response surface a store node exposes to clients.
    service kv_service {
        fn put(key: String, value: String) -> String;
        fn get(key: String) -> String;
        fn delete(key: String) -> String;
        fn handle_command(command: String) -> String;
        fn prepare(txn_id: String, command: String) -> bool;
        fn commit(txn_id: String) -> ();
        fn abort(txn_id: String) -> ();
    }
}

pub use kv_service::{Client as KvClient, Server as KvServer, Service as KvService};

/// Client over several equivalent store endpoints.
pub mod client;
/// The `PUT`/`GET`/`DELETE` command grammar.
pub mod command;
/// Prepare/commit/abort sequencing around consensus-backed writes.
pub mod coordinator;
/// The store node service.
pub mod kv;

/// Cluster-building helpers for testing.
pub mod tests;

pub use quorum::Store;
