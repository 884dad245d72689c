// src/plugins/metrics.rs
use crate::health::HealthStatus;
use crate::kernel::{events, HealthContext, Plugin};
use crate::metrics::MetricsCollector;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::warn;

pub const NAME: &str = "metrics";

/// Keeps cumulative counters next to the per-request `/metrics` snapshot.
#[derive(Debug, Default)]
pub struct MetricsPlugin;

#[async_trait]
impl Plugin for MetricsPlugin {
    fn name(&self) -> &str {
        NAME
    }

    fn install(&self, ctx: &mut HealthContext) -> anyhow::Result<()> {
        let collector = Arc::new(MetricsCollector::new()?);
        ctx.metrics = Some(collector.clone());

        let on_checked = collector.clone();
        ctx.events.on(events::HEALTH_CHECKED, move |payload| {
            match serde_json::from_value::<HealthStatus>(payload.clone()) {
                Ok(status) => on_checked.observe(&status),
                Err(err) => warn!(%err, "metrics skipped an unreadable health status"),
            }
        });

        ctx.events.on(events::CHECK_ERROR, move |payload| {
            if let Some(name) = payload["name"].as_str() {
                collector.record_check_error(name);
            }
        });
        Ok(())
    }
}
