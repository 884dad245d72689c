// src/server/builder.rs
use super::listener::bind_tcp;
use super::ServerError;
use hyper::{server::conn::Http, Body, Request, Response};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tower::Service;

/// Builder so the http plugin can inject its request handler.
pub struct ServerBuilder<H>
where
    H: Service<Request<Body>, Response = Response<Body>> + Send + Clone + 'static,
    H::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    H::Future: Send + 'static,
{
    host: String,
    port: u16,
    handler: Option<H>,
}

impl<H> ServerBuilder<H>
where
    H: Service<Request<Body>, Response = Response<Body>> + Send + Clone + 'static,
    H::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    H::Future: Send + 'static,
{
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            handler: None,
        }
    }

    pub fn with_handler(mut self, handler: H) -> Self {
        self.handler = Some(handler);
        self
    }

    /// Bind the listener and spawn the accept loop. Port 0 picks a free port;
    /// the bound address is on the returned handle.
    pub async fn spawn(self) -> Result<RunningServer, ServerError> {
        let handler = self.handler.ok_or(ServerError::MissingHandler)?;

        let listener = bind_tcp(&self.host, self.port).await?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| ServerError::Bind {
                addr: format!("{}:{}", self.host, self.port),
                source,
            })?;
        tracing::info!("HTTP server listening on {}", local_addr);

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(accept_loop(listener, handler, shutdown_rx));

        Ok(RunningServer {
            local_addr,
            shutdown_tx,
            task,
        })
    }
}

async fn accept_loop<H>(listener: TcpListener, handler: H, mut shutdown_rx: watch::Receiver<bool>)
where
    H: Service<Request<Body>, Response = Response<Body>> + Send + Clone + 'static,
    H::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    H::Future: Send + 'static,
{
    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, peer) = match accepted {
                    Ok(conn) => conn,
                    Err(err) => {
                        tracing::warn!(%err, "accept failed");
                        continue;
                    }
                };
                let svc = handler.clone();

                // One task per connection.
                tokio::spawn(async move {
                    let http = Http::new();
                    if let Err(err) = http.serve_connection(stream, svc).await {
                        tracing::warn!(%peer, %err, "connection error");
                    }
                });
            }
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    tracing::info!("HTTP server shutting down");
                    break;
                }
            }
        }
    }
}

/// Handle to a spawned server.
#[derive(Debug)]
pub struct RunningServer {
    local_addr: SocketAddr,
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl RunningServer {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop accepting connections and wait for the accept loop to exit.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        if let Err(err) = self.task.await {
            tracing::warn!(%err, "server task ended abnormally");
        }
    }
}
