//! In-process RPC over channels, for running a whole cluster inside one
//! process. Services are declared with the [`service!`] macro, which
//! generates a typed client, a server event loop and a service trait;
//! a [`Network`] routes request envelopes between them.

pub mod endpoint;
mod macros;
pub mod network;

pub use anyhow;
pub use async_trait::async_trait;
pub use futures;
pub use log;
pub use serde;
pub use serde_json;
pub use tokio;

pub use network::Network;
