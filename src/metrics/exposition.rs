// src/metrics/exposition.rs
use crate::health::HealthStatus;
use anyhow::Result;
use prometheus::{Counter, Encoder, Gauge, GaugeVec, Opts, Registry, TextEncoder};
use serde_json::{json, Map, Value};

/// Prometheus text exposition of one aggregation cycle.
pub fn render_prometheus(status: &HealthStatus) -> Result<String> {
    let registry = Registry::new();

    let check_status = GaugeVec::new(
        Opts::new(
            "health_check_status",
            "Check status (1=healthy, 0.5=degraded, 0=unhealthy)",
        ),
        &["check"],
    )?;
    registry.register(Box::new(check_status.clone()))?;

    let check_latency = GaugeVec::new(
        Opts::new("health_check_latency_ms", "Check latency in milliseconds"),
        &["check"],
    )?;
    registry.register(Box::new(check_latency.clone()))?;

    let score = Gauge::new("health_score", "Overall health score (0-100)")?;
    registry.register(Box::new(score.clone()))?;

    let uptime = Counter::new("health_uptime_seconds_total", "Process uptime in seconds")?;
    registry.register(Box::new(uptime.clone()))?;

    for (name, result) in &status.checks {
        check_status
            .with_label_values(&[name.as_str()])
            .set(result.status.score_factor());
        if let Some(latency) = result.latency {
            check_latency
                .with_label_values(&[name.as_str()])
                .set(latency);
        }
    }
    score.set(status.score as f64);
    uptime.inc_by(status.uptime.max(0.0));

    encode(&registry)
}

/// JSON mirror of [`render_prometheus`].
pub fn render_json(status: &HealthStatus) -> Value {
    let checks: Map<String, Value> = status
        .checks
        .iter()
        .map(|(name, result)| {
            (
                name.clone(),
                json!({
                    "status": result.status,
                    "value": result.status.score_factor(),
                    "latency": result.latency,
                }),
            )
        })
        .collect();

    json!({
        "status": status.status,
        "score": status.score,
        "uptime": status.uptime,
        "timestamp": status.timestamp,
        "checks": checks,
    })
}

pub(crate) fn encode(registry: &Registry) -> Result<String> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&registry.gather(), &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}
