// src/metrics/collector.rs
use super::exposition::encode;
use crate::health::HealthStatus;
use anyhow::Result;
use prometheus::{IntCounterVec, IntGauge, Opts, Registry};
use std::fmt;

/// Cumulative counters fed from `health:checked` and `check:error` events.
pub struct MetricsCollector {
    registry: Registry,

    pub aggregations_total: IntCounterVec,
    pub check_results_total: IntCounterVec,
    pub check_errors_total: IntCounterVec,
    pub last_score: IntGauge,
}

impl MetricsCollector {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let aggregations_total = IntCounterVec::new(
            Opts::new(
                "health_aggregations_total",
                "Total number of aggregation cycles by overall status",
            ),
            &["status"],
        )?;
        registry.register(Box::new(aggregations_total.clone()))?;

        let check_results_total = IntCounterVec::new(
            Opts::new(
                "health_check_results_total",
                "Total number of check results by check and status",
            ),
            &["check", "status"],
        )?;
        registry.register(Box::new(check_results_total.clone()))?;

        let check_errors_total = IntCounterVec::new(
            Opts::new(
                "health_check_errors_total",
                "Total number of checks that failed or timed out",
            ),
            &["check"],
        )?;
        registry.register(Box::new(check_errors_total.clone()))?;

        let last_score = IntGauge::new("health_last_score", "Score of the latest aggregation")?;
        registry.register(Box::new(last_score.clone()))?;

        Ok(Self {
            registry,
            aggregations_total,
            check_results_total,
            check_errors_total,
            last_score,
        })
    }

    pub fn observe(&self, status: &HealthStatus) {
        self.aggregations_total
            .with_label_values(&[status.status.as_str()])
            .inc();

        for (name, result) in &status.checks {
            self.check_results_total
                .with_label_values(&[name.as_str(), result.status.as_str()])
                .inc();
        }

        self.last_score.set(status.score as i64);
    }

    pub fn record_check_error(&self, check: &str) {
        self.check_errors_total.with_label_values(&[check]).inc();
    }

    pub fn gather(&self) -> Result<String> {
        encode(&self.registry)
    }
}

impl fmt::Debug for MetricsCollector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetricsCollector")
            .field("last_score", &self.last_score.get())
            .finish_non_exhaustive()
    }
}
