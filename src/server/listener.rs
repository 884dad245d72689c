// src/server/listener.rs
use super::ServerError;
use tokio::net::TcpListener;

pub async fn bind_tcp(host: &str, port: u16) -> Result<TcpListener, ServerError> {
    TcpListener::bind((host, port))
        .await
        .map_err(|source| ServerError::Bind {
            addr: format!("{}:{}", host, port),
            source,
        })
}
