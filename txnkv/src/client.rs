use std::time::Duration;

use log::{debug, warn};
use simrpc::anyhow::{anyhow, Result};
use simrpc::tokio;
use simrpc::tokio::sync::{mpsc, oneshot};

use crate::KvClient;

/// Commands the client seeds a fresh store with.
const PREPOPULATE: &[&str] = &[
    "PUT Usa Nyc",
    "PUT India Delhi",
    "PUT Greece Athens",
    "PUT Spain Madrid",
    "PUT Germany Berlin",
    "PUT England London",
];

/// Client over several equivalent store endpoints. The first endpoint
/// that answers is treated as primary; the rest are standbys tried in
/// order when it fails.
pub struct Client {
    endpoints: Vec<KvClient>,
}

impl Client {
    /// A client over `endpoints`, in preference order.
    pub fn new(endpoints: Vec<KvClient>) -> Self {
        Self { endpoints }
    }

    /// Send one command line, failing over across endpoints.
    pub async fn handle_command(&self, command: &str) -> Result<String> {
        let mut last = anyhow!("no endpoints configured");
        for endpoint in &self.endpoints {
            match endpoint.handle_command(command.to_string()).await {
                Ok(resp) => return Ok(resp),
                Err(e) => {
                    debug!("endpoint failed, trying standby: {}", e);
                    last = e;
                }
            }
        }
        Err(last)
    }

    /// Load the initial data set.
    pub async fn prepopulate(&self) -> Result<()> {
        for command in PREPOPULATE {
            self.handle_command(command).await?;
        }
        Ok(())
    }
}

type Dispatch = (String, oneshot::Sender<Result<String>>);

/// A client session: one worker task executes commands strictly in issue
/// order while each caller waits with a bound.
///
/// A command whose caller timed out keeps running on the worker and may
/// still mutate the store, so a timed-out result is unknown, not failed.
pub struct Session {
    tx: mpsc::Sender<Dispatch>,
    wait: Duration,
}

impl Session {
    /// Spawn the session worker over `client`, bounding each command
    /// wait by `wait`.
    pub fn spawn(client: Client, wait: Duration) -> Self {
        let (tx, mut rx) = mpsc::channel::<Dispatch>(100);
        tokio::spawn(async move {
            while let Some((command, done)) = rx.recv().await {
                let resp = client.handle_command(&command).await;
                if done.send(resp).is_err() {
                    warn!("caller gave up on {:?} before it finished", command);
                }
            }
        });
        Self { tx, wait }
    }

    /// Queue one command and wait for its result, at most `wait`.
    pub async fn submit(&self, command: &str) -> Result<String> {
        let (done_tx, done_rx) = oneshot::channel();
        self.tx
            .send((command.to_string(), done_tx))
            .await
            .map_err(|_| anyhow!("session worker is gone"))?;
        match tokio::time::timeout(self.wait, done_rx).await {
            Ok(Ok(resp)) => resp,
            Ok(Err(_)) => Err(anyhow!("session worker dropped the command")),
            Err(_) => Err(anyhow!("command {:?} timed out, result unknown", command)),
        }
    }
}
