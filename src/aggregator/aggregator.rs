// src/aggregator/aggregator.rs
use super::thresholds::{ThresholdConfig, ThresholdUpdate, ValidationError};
use crate::health::{CheckResult, HealthStatus, Status};
use arc_swap::ArcSwap;
use chrono::Utc;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// Reduces per-check results into one weighted score and status.
pub struct Aggregator {
    thresholds: ArcSwap<ThresholdConfig>,
}

impl fmt::Debug for Aggregator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Aggregator")
            .field("thresholds", &self.thresholds())
            .finish()
    }
}

impl Default for Aggregator {
    fn default() -> Self {
        Self {
            thresholds: ArcSwap::from_pointee(ThresholdConfig::default()),
        }
    }
}

impl Aggregator {
    pub fn new(thresholds: ThresholdConfig) -> Result<Self, ValidationError> {
        thresholds.validate()?;
        Ok(Self {
            thresholds: ArcSwap::from_pointee(thresholds),
        })
    }

    pub fn aggregate(&self, results: BTreeMap<String, CheckResult>, uptime: f64) -> HealthStatus {
        let timestamp = Utc::now();

        if results.is_empty() {
            return HealthStatus {
                status: Status::Healthy,
                score: 100,
                uptime,
                timestamp,
                checks: results,
            };
        }

        // One snapshot for the whole cycle, even if a setter runs concurrently.
        let thresholds = self.thresholds.load();
        let score = weighted_score(&results);
        let mut status = status_for(&thresholds, score as f64);

        if let Some((name, _)) = results.iter().find(|(_, r)| r.is_critical_failure()) {
            debug!(check = %name, score, "critical check failed, forcing unhealthy");
            status = Status::Unhealthy;
        }

        HealthStatus {
            status,
            score,
            uptime,
            timestamp,
            checks: results,
        }
    }

    pub fn predict_status(&self, score: f64) -> Status {
        status_for(&self.thresholds.load(), score)
    }

    pub fn thresholds(&self) -> ThresholdConfig {
        **self.thresholds.load()
    }

    pub fn set_thresholds(&self, update: ThresholdUpdate) -> Result<ThresholdConfig, ValidationError> {
        let merged = self.thresholds().merged(&update)?;
        self.thresholds.store(Arc::new(merged));
        info!(
            healthy = merged.healthy,
            degraded = merged.degraded,
            "Thresholds updated"
        );
        Ok(merged)
    }

    pub fn healthy_threshold(&self) -> f64 {
        self.thresholds.load().healthy
    }

    pub fn degraded_threshold(&self) -> f64 {
        self.thresholds.load().degraded
    }
}

fn weighted_score(results: &BTreeMap<String, CheckResult>) -> u8 {
    let total_weight: f64 = results.values().map(CheckResult::effective_weight).sum();
    if total_weight == 0.0 {
        return 100;
    }

    let earned: f64 = results
        .values()
        .map(|r| r.status.score_factor() * r.effective_weight())
        .sum();

    (100.0 * earned / total_weight).round().clamp(0.0, 100.0) as u8
}

fn status_for(thresholds: &ThresholdConfig, score: f64) -> Status {
    if score >= thresholds.healthy {
        Status::Healthy
    } else if score >= thresholds.degraded {
        Status::Degraded
    } else {
        Status::Unhealthy
    }
}
