// src/config/models.rs
use crate::aggregator::{ThresholdConfig, ValidationError};
use crate::health::CheckDefaults;
use crate::interval::Interval;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use url::Url;

pub const DEFAULT_PORT: u16 = 9000;
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_BASE_PATH: &str = "/health";
pub const DEFAULT_HISTORY_SIZE: usize = 100;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub thresholds: Option<ThresholdConfig>,
    pub defaults: DefaultsConfig,
    /// Re-run every check on this interval in the background.
    pub interval: Option<Interval>,
    pub history: HistoryConfig,
    pub metrics: MetricsConfig,
    pub checks: BTreeMap<String, CheckDefinition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub base_path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            base_path: DEFAULT_BASE_PATH.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    pub timeout: Option<Interval>,
    pub retries: Option<u32>,
    pub backoff: Option<Interval>,
}

impl DefaultsConfig {
    pub fn check_defaults(&self) -> CheckDefaults {
        CheckDefaults {
            timeout: self.timeout.map(|i| i.as_duration()),
            retries: self.retries,
            backoff: self.backoff.map(|i| i.as_duration()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub enabled: bool,
    pub size: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            size: DEFAULT_HISTORY_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// A built-in check declared in the configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckDefinition {
    #[serde(flatten)]
    pub kind: CheckKind,
    #[serde(default)]
    pub timeout: Option<Interval>,
    #[serde(default)]
    pub retries: Option<u32>,
    #[serde(default)]
    pub critical: Option<bool>,
    #[serde(default)]
    pub weight: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CheckKind {
    Http {
        url: Url,
        #[serde(default)]
        expected_status: Option<u16>,
    },
    Tcp {
        address: String,
    },
    Redis {
        address: String,
    },
}

impl Config {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(thresholds) = &self.thresholds {
            thresholds.validate()?;
        }

        if self.server.host.trim().is_empty() {
            return Err(config_error("server.host", "must not be empty"));
        }
        if self.server.base_path.trim_matches('/').is_empty() {
            return Err(config_error("server.base_path", "must name a path below /"));
        }
        if self.history.size == 0 {
            return Err(config_error("history.size", "must be at least 1"));
        }
        if let Some(interval) = &self.interval {
            if interval.to_millis() < 1.0 {
                return Err(config_error("interval", "must be at least 1ms"));
            }
        }
        if let Some(timeout) = &self.defaults.timeout {
            if timeout.to_millis() <= 0.0 {
                return Err(config_error("defaults.timeout", "must be positive"));
            }
        }

        for (name, check) in &self.checks {
            if name.trim().is_empty() {
                return Err(config_error("checks", "check names must not be empty"));
            }
            if let Some(weight) = check.weight {
                if !weight.is_finite() || weight <= 0.0 {
                    return Err(config_error(
                        &format!("checks.{}.weight", name),
                        "must be a positive number",
                    ));
                }
            }
            if let Some(timeout) = &check.timeout {
                if timeout.to_millis() <= 0.0 {
                    return Err(config_error(
                        &format!("checks.{}.timeout", name),
                        "must be positive",
                    ));
                }
            }
        }

        Ok(())
    }
}

fn config_error(field: &str, reason: &str) -> ValidationError {
    ValidationError::Config {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}
