/// Declare an RPC service.
///
/// Expands to a module containing a `Request` enum, a `Service` trait
/// (one async method per declared fn, `&mut self`), a cloneable `Client`
/// with a typed method per fn, and a `Server` event loop.
///
/// Handler errors are carried back to the caller inside the response
/// envelope rather than tearing down the server, and a response whose
/// caller already gave up is dropped, so neither a failed nor an
/// abandoned request resets service state. Every client call waits at most
/// [`endpoint::DEFAULT_TIMEOUT`](crate::endpoint::DEFAULT_TIMEOUT)
/// for its reply.
#[macro_export]
macro_rules! service {
    () => {
        compile_error!("empty service is not allowed");
    };
    (
        $(#[$service_attr:meta])*
        service $svc_name:ident {
            $(
                $(#[$method_attr:meta])*
                fn $method_name:ident($($arg_id:ident: $arg_ty:ty),*) -> $output:ty;
            )*
        }
    ) => {
        #[allow(missing_docs)]
        $(#[$service_attr])*
        pub mod $svc_name {
            use super::*;

            use $crate::endpoint;
            use $crate::network::Envelope;

            use $crate::anyhow::{anyhow, Result};
            use $crate::async_trait;
            use $crate::log::{debug, trace};
            use $crate::serde::{Deserialize, Serialize};
            use $crate::serde_json;
            use $crate::tokio::sync::mpsc::{self, Receiver, Sender};

            #[derive(Debug, Deserialize, Serialize)]
            pub enum Request {
                $(
                    #[allow(non_camel_case_types)]
                    $method_name { $($arg_id: $arg_ty),* }
                ),*
            }

            mod response {
                use super::*;
                $(
                    #[derive(Deserialize, Serialize)]
                    #[allow(non_camel_case_types)]
                    pub struct $method_name {
                        pub data: std::result::Result<$output, String>,
                    }
                )*
            }

            #[async_trait]
            pub trait Service: Send + 'static {
                $(
                    $(#[$method_attr])*
                    async fn $method_name(&mut self, $($arg_id: $arg_ty),*) -> Result<$output>;
                )*
            }

            #[derive(Debug, Clone)]
            pub struct Client {
                server_id: String,
                tx: Sender<Envelope>,
                timeout: std::time::Duration,
            }

            impl Client {
                /// Replace the bound on this client's reply waits.
                pub fn with_timeout(mut self, timeout: std::time::Duration) -> Self {
                    self.timeout = timeout;
                    self
                }

                $(
                    pub async fn $method_name(&self, $($arg_id: $arg_ty),*) -> Result<$output> {
                        let req = Request::$method_name { $($arg_id),* };
                        let resp = self.call(serde_json::to_string(&req)?).await?;
                        let resp: response::$method_name = serde_json::from_str(&resp)?;
                        resp.data.map_err(|e| anyhow!("{}: {}", self.server_id, e))
                    }
                )*

                pub async fn call(&self, req: String) -> Result<String> {
                    let (tx, mut rx) = mpsc::channel(1);
                    self.tx
                        .send(Envelope {
                            to: self.server_id.clone(),
                            reply: tx,
                            body: req,
                        })
                        .await?;
                    match $crate::tokio::time::timeout(self.timeout, rx.recv()).await {
                        Ok(Some(resp)) => Ok(resp),
                        Ok(None) => Err(anyhow!("{}: connection closed", self.server_id)),
                        Err(_) => Err(anyhow!("{}: call timed out", self.server_id)),
                    }
                }
            }

            impl endpoint::BindClient for Client {
                fn bind(server_id: String, net_tx: Sender<Envelope>) -> Self {
                    Self {
                        server_id,
                        tx: net_tx,
                        timeout: endpoint::DEFAULT_TIMEOUT,
                    }
                }
            }

            #[derive(Debug)]
            pub struct Server<T: Service> {
                svc: T,
                tx: Sender<Envelope>,
                rx: Receiver<Envelope>,
            }

            #[async_trait]
            impl<T: Service> endpoint::Server for Server<T> {
                type Service = T;

                fn from_service(svc: T) -> Self {
                    let (tx, rx) = mpsc::channel(100);
                    Self { svc, tx, rx }
                }

                fn client_chan(&self) -> Sender<Envelope> {
                    self.tx.clone()
                }

                async fn handle(&mut self) -> Result<()> {
                    let Envelope { reply, body, .. } = self
                        .rx
                        .recv()
                        .await
                        .ok_or_else(|| anyhow!("all client handles dropped"))?;
                    trace!("request: {}", &body);
                    let req: Request = serde_json::from_str(&body)?;
                    let resp = match req {
                        $(
                            Request::$method_name { $($arg_id),* } => {
                                let data = self
                                    .svc
                                    .$method_name($($arg_id),*)
                                    .await
                                    .map_err(|e| e.to_string());
                                serde_json::to_string(&response::$method_name { data })?
                            }
                        )*
                    };
                    trace!("response: {}", &resp);
                    // The caller may have stopped waiting (timeout, or a
                    // fan-out satisfied early). An undeliverable response
                    // must not take the service down with it.
                    if reply.send(resp).await.is_err() {
                        debug!("caller gone, response dropped");
                    }
                    Ok(())
                }
            }
        }
    };
}
