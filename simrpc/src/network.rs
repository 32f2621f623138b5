use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use futures::Future;
use log::{info, warn};
use tokio::sync::mpsc::{self, Receiver, Sender};

use crate::endpoint::{BindClient, Server};

/// A request in flight: destination id, the serialized request body and
/// a channel the server answers on.
#[derive(Debug, Clone)]
pub struct Envelope {
    pub to: String,
    pub reply: Sender<String>,
    pub body: String,
}

/// Routes [`Envelope`]s from clients to registered servers by id.
pub struct Network {
    /// Ingress shared by every client bound on this network.
    pub tx: Sender<Envelope>,
    rx: Receiver<Envelope>,
    nodes: Arc<Mutex<HashMap<String, Sender<Envelope>>>>,
}

impl Network {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel(100);
        Self {
            tx,
            rx,
            nodes: Arc::new(Mutex::new(HashMap::default())),
        }
    }

    /// Register a service under `id` and hand back a client bound to it,
    /// plus the server routine the caller must spawn. The service is
    /// rebuilt from `f` if its event loop ever bails out.
    ///
    /// The server's channel is published before this returns, so the
    /// client is usable as soon as the routine is spawned.
    pub fn register_service<S, C, F>(&self, id: String, f: F) -> (C, impl Future<Output = ()>)
    where
        F: Fn() -> S::Service + Send + 'static,
        S: Server + Send + 'static,
        C: BindClient,
    {
        let client = C::bind(id.clone(), self.tx.clone());
        let nodes = self.nodes.clone();
        let mut server = S::from_service(f());
        nodes.lock().unwrap().insert(id.clone(), server.client_chan());
        let routine = async move {
            loop {
                match server.run().await {
                    Ok(()) => break,
                    Err(e) => info!("service {} restarting: {}", id, e),
                }
                server = S::from_service(f());
                nodes.lock().unwrap().insert(id.clone(), server.client_chan());
            }
        };
        (client, routine)
    }

    /// Pump envelopes until every client handle is gone.
    pub async fn run(&mut self) {
        while let Some(env) = self.rx.recv().await {
            let node = { self.nodes.lock().unwrap().get(&env.to).cloned() };
            match node {
                Some(chan) => {
                    if chan.send(env).await.is_err() {
                        warn!("destination gone, envelope dropped");
                    }
                }
                None => warn!("unknown destination {}", env.to),
            }
        }
    }
}

impl Default for Network {
    fn default() -> Self {
        Self::new()
    }
}
