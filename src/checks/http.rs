// src/checks/http.rs
use crate::health::{CheckHandler, CheckOutcome, Status};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::time::Instant;
use url::Url;

/// GETs a URL; 2xx is healthy, anything else unhealthy.
///
/// Transport failures are returned as errors so the runner can retry them.
pub struct HttpCheck {
    url: Url,
    expected_status: Option<u16>,
    client: Client,
}

impl HttpCheck {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            expected_status: None,
            client: Client::new(),
        }
    }

    /// Require one exact status code instead of any 2xx.
    pub fn expect_status(mut self, status: u16) -> Self {
        self.expected_status = Some(status);
        self
    }

    fn is_expected(&self, status: reqwest::StatusCode) -> bool {
        match self.expected_status {
            Some(expected) => status.as_u16() == expected,
            None => status.is_success(),
        }
    }
}

#[async_trait]
impl CheckHandler for HttpCheck {
    async fn check(&self) -> Result<CheckOutcome> {
        let start = Instant::now();
        let response = self
            .client
            .get(self.url.as_str())
            .send()
            .await
            .with_context(|| format!("request to {} failed", self.url))?;
        let latency = start.elapsed().as_secs_f64() * 1_000.0;

        let status = response.status();
        let outcome = if self.is_expected(status) {
            CheckOutcome::new(Status::Healthy)
        } else {
            CheckOutcome::unhealthy(format!("HTTP {}", status))
        };

        Ok(outcome
            .with_latency(latency)
            .with_metadata("statusCode", json!(status.as_u16())))
    }
}
