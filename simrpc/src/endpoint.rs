use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc::Sender;

use crate::network::Envelope;

/// Bound on every client call's reply wait unless overridden with
/// `with_timeout`. A call past this bound fails locally while the server
/// may still execute it, so callers must treat the result as unknown.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

/// Generated clients: bound to a server id on a network ingress.
pub trait BindClient {
    fn bind(server_id: String, net_tx: Sender<Envelope>) -> Self;
}

/// Generated servers: a service value plus its inbound request channel.
#[async_trait::async_trait]
pub trait Server {
    type Service;

    fn from_service(svc: Self::Service) -> Self;

    /// Channel the network delivers this server's envelopes on.
    fn client_chan(&self) -> Sender<Envelope>;

    /// Serve one request.
    async fn handle(&mut self) -> Result<()>;

    async fn run(&mut self) -> Result<()> {
        loop {
            self.handle().await?;
        }
    }
}
