// src/aggregator/thresholds.rs
use serde::{Deserialize, Serialize};

pub const DEFAULT_HEALTHY_THRESHOLD: f64 = 80.0;
pub const DEFAULT_DEGRADED_THRESHOLD: f64 = 50.0;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("invalid {field} threshold {value}: must be a finite number between 0 and 100")]
    Threshold { field: &'static str, value: f64 },

    #[error("invalid {field}: {reason}")]
    Config { field: String, reason: String },
}

/// Score boundaries. `healthy >= degraded` is the caller's responsibility.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdConfig {
    pub healthy: f64,
    pub degraded: f64,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            healthy: DEFAULT_HEALTHY_THRESHOLD,
            degraded: DEFAULT_DEGRADED_THRESHOLD,
        }
    }
}

impl ThresholdConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_threshold("healthy", self.healthy)?;
        validate_threshold("degraded", self.degraded)?;
        Ok(())
    }

    /// Apply a partial update, validating every provided field first.
    pub fn merged(&self, update: &ThresholdUpdate) -> Result<Self, ValidationError> {
        if let Some(healthy) = update.healthy {
            validate_threshold("healthy", healthy)?;
        }
        if let Some(degraded) = update.degraded {
            validate_threshold("degraded", degraded)?;
        }

        Ok(Self {
            healthy: update.healthy.unwrap_or(self.healthy),
            degraded: update.degraded.unwrap_or(self.degraded),
        })
    }
}

/// Partial threshold change; `None` leaves the current value untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ThresholdUpdate {
    #[serde(default)]
    pub healthy: Option<f64>,
    #[serde(default)]
    pub degraded: Option<f64>,
}

impl ThresholdUpdate {
    pub fn healthy(value: f64) -> Self {
        Self {
            healthy: Some(value),
            degraded: None,
        }
    }

    pub fn degraded(value: f64) -> Self {
        Self {
            healthy: None,
            degraded: Some(value),
        }
    }
}

impl From<ThresholdConfig> for ThresholdUpdate {
    fn from(config: ThresholdConfig) -> Self {
        Self {
            healthy: Some(config.healthy),
            degraded: Some(config.degraded),
        }
    }
}

fn validate_threshold(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() && (0.0..=100.0).contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::Threshold { field, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merged_only_changes_provided_fields() {
        let current = ThresholdConfig::default();
        let merged = current.merged(&ThresholdUpdate::degraded(30.0)).unwrap();
        assert_eq!(merged.healthy, DEFAULT_HEALTHY_THRESHOLD);
        assert_eq!(merged.degraded, 30.0);
    }

    #[test]
    fn test_out_of_range_is_rejected() {
        let current = ThresholdConfig::default();
        for value in [-10.0, 101.0, f64::NAN, f64::INFINITY] {
            assert!(current.merged(&ThresholdUpdate::healthy(value)).is_err());
        }
        assert!(ThresholdConfig { healthy: 120.0, degraded: 10.0 }.validate().is_err());
    }
}
