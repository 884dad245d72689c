// src/checks/tcp.rs
use crate::health::{CheckHandler, CheckOutcome};
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::time::Instant;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

/// Connects to `address`, optionally sending a request and matching the reply prefix.
pub struct TcpCheck {
    address: String,
    exchange: Option<(Vec<u8>, Vec<u8>)>,
}

impl TcpCheck {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            exchange: None,
        }
    }

    /// Redis-compatible `PING` / `+PONG` exchange.
    pub fn redis(address: impl Into<String>) -> Self {
        Self::new(address).with_exchange(b"PING\r\n", b"+PONG")
    }

    pub fn with_exchange(mut self, request: &[u8], expected: &[u8]) -> Self {
        self.exchange = Some((request.to_vec(), expected.to_vec()));
        self
    }
}

#[async_trait]
impl CheckHandler for TcpCheck {
    async fn check(&self) -> Result<CheckOutcome> {
        let start = Instant::now();
        let mut stream = TcpStream::connect(&self.address)
            .await
            .with_context(|| format!("connect to {} failed", self.address))?;

        if let Some((request, expected)) = &self.exchange {
            stream.write_all(request).await?;

            let mut reply = vec![0u8; expected.len()];
            stream
                .read_exact(&mut reply)
                .await
                .with_context(|| format!("no reply from {}", self.address))?;

            if &reply != expected {
                bail!(
                    "unexpected reply from {}: {:?}",
                    self.address,
                    String::from_utf8_lossy(&reply)
                );
            }
        }

        Ok(CheckOutcome::healthy().with_latency(start.elapsed().as_secs_f64() * 1_000.0))
    }
}
