// src/cli/remote.rs
use crate::health::Status;
use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

pub const EXIT_ERROR: i32 = 3;
const CHECK_TIMEOUT: Duration = Duration::from_secs(10);

pub fn exit_code_for(status: Status) -> i32 {
    match status {
        Status::Healthy => 0,
        Status::Degraded => 1,
        Status::Unhealthy => 2,
    }
}

/// Ask a running server for its overall status.
///
/// 503 answers still carry a status body, so only transport failures and
/// unreadable bodies are errors.
pub async fn check_remote(url: &str) -> Result<Status> {
    let client = Client::builder().timeout(CHECK_TIMEOUT).build()?;
    let response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("Failed to reach {}", url))?;
    let code = response.status();

    let body: Value = response
        .json()
        .await
        .with_context(|| format!("{} returned a non-JSON body (HTTP {})", url, code))?;
    debug!(%code, %body, "remote status");

    let status = body
        .get("status")
        .cloned()
        .ok_or_else(|| anyhow!("{} returned no status (HTTP {})", url, code))?;
    serde_json::from_value(status).with_context(|| format!("{} returned an unknown status", url))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_code_for(Status::Healthy), 0);
        assert_eq!(exit_code_for(Status::Degraded), 1);
        assert_eq!(exit_code_for(Status::Unhealthy), 2);
    }

    #[tokio::test]
    async fn test_reads_status_from_any_code() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/health")
            .with_status(503)
            .with_header("content-type", "application/json")
            .with_body(r#"{"status":"unhealthy","score":20}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/degraded")
            .with_status(200)
            .with_body(r#"{"status":"degraded","score":60}"#)
            .create_async()
            .await;

        let status = check_remote(&format!("{}/health", server.url())).await.unwrap();
        assert_eq!(status, Status::Unhealthy);

        let status = check_remote(&format!("{}/degraded", server.url())).await.unwrap();
        assert_eq!(status, Status::Degraded);
    }

    #[tokio::test]
    async fn test_bad_bodies_are_errors() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/plain")
            .with_status(200)
            .with_body("OK")
            .create_async()
            .await;
        server
            .mock("GET", "/weird")
            .with_status(200)
            .with_body(r#"{"status":"sideways"}"#)
            .create_async()
            .await;

        assert!(check_remote(&format!("{}/plain", server.url())).await.is_err());
        assert!(check_remote(&format!("{}/weird", server.url())).await.is_err());
        assert!(check_remote("http://127.0.0.1:9/health").await.is_err());
    }
}
