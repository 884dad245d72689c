// src/server/mod.rs
pub mod builder;
pub mod handler;
pub mod listener;
pub mod router;
pub mod service;

pub use builder::{RunningServer, ServerBuilder};
pub use handler::RequestHandler;
pub use router::{Route, Router};
pub use service::HealthService;

use std::net::SocketAddr;

/// Where the http plugin ended up listening.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerInfo {
    pub local_addr: SocketAddr,
    pub base_path: String,
}

impl ServerInfo {
    pub fn url(&self) -> String {
        format!("http://{}{}", self.local_addr, self.base_path)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("no request handler configured")]
    MissingHandler,
}
