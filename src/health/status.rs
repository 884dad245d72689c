// src/health/status.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Healthy,
    Degraded,
    Unhealthy,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Healthy => "healthy",
            Status::Degraded => "degraded",
            Status::Unhealthy => "unhealthy",
        }
    }

    /// Contribution of one check to the aggregate score, before weighting.
    pub fn score_factor(&self) -> f64 {
        match self {
            Status::Healthy => 1.0,
            Status::Degraded => 0.5,
            Status::Unhealthy => 0.0,
        }
    }

    /// HTTP status code the transport answers with for this verdict.
    pub fn http_code(&self) -> u16 {
        match self {
            Status::Healthy | Status::Degraded => 200,
            Status::Unhealthy => 503,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw value produced by a check handler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckOutcome {
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, serde_json::Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CheckOutcome {
    pub fn new(status: Status) -> Self {
        Self {
            status,
            latency: None,
            metadata: None,
            error: None,
        }
    }

    pub fn healthy() -> Self {
        Self::new(Status::Healthy)
    }

    pub fn degraded() -> Self {
        Self::new(Status::Degraded)
    }

    pub fn unhealthy(error: impl Into<String>) -> Self {
        Self::new(Status::Unhealthy).with_error(error)
    }

    pub fn with_latency(mut self, latency_ms: f64) -> Self {
        self.latency = Some(latency_ms);
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value);
        self
    }
}

/// Outcome of one check in one aggregation cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckResult {
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, serde_json::Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub critical: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    pub last_check: DateTime<Utc>,
}

impl CheckResult {
    pub fn from_outcome(
        outcome: CheckOutcome,
        critical: bool,
        weight: Option<f64>,
        last_check: DateTime<Utc>,
    ) -> Self {
        Self {
            status: outcome.status,
            latency: outcome.latency,
            metadata: outcome.metadata,
            error: outcome.error,
            critical,
            weight,
            last_check,
        }
    }

    /// Unset weights count as 1; an explicit zero stays zero.
    pub fn effective_weight(&self) -> f64 {
        self.weight.unwrap_or(1.0)
    }

    pub fn is_critical_failure(&self) -> bool {
        self.critical && self.status == Status::Unhealthy
    }
}

/// The single output artifact of an aggregation cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: Status,
    pub score: u8,
    pub uptime: f64,
    pub timestamp: DateTime<Utc>,
    pub checks: BTreeMap<String, CheckResult>,
}

impl HealthStatus {
    pub fn critical_failures(&self) -> impl Iterator<Item = &str> {
        self.checks
            .iter()
            .filter(|(_, result)| result.is_critical_failure())
            .map(|(name, _)| name.as_str())
    }

    pub fn is_ready(&self) -> bool {
        self.critical_failures().next().is_none()
    }
}
