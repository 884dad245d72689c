// src/plugins/history.rs
use crate::config::DEFAULT_HISTORY_SIZE;
use crate::health::HealthStatus;
use crate::history::HealthHistory;
use crate::kernel::{events, HealthContext, Plugin};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::warn;

pub const NAME: &str = "history";

#[derive(Debug)]
pub struct HistoryPlugin {
    capacity: usize,
}

impl HistoryPlugin {
    pub fn new(capacity: usize) -> Self {
        Self { capacity }
    }
}

impl Default for HistoryPlugin {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_SIZE)
    }
}

#[async_trait]
impl Plugin for HistoryPlugin {
    fn name(&self) -> &str {
        NAME
    }

    fn install(&self, ctx: &mut HealthContext) -> anyhow::Result<()> {
        let history = Arc::new(HealthHistory::new(self.capacity));
        ctx.history = Some(history.clone());

        ctx.events.on(events::HEALTH_CHECKED, move |payload| {
            match serde_json::from_value::<HealthStatus>(payload.clone()) {
                Ok(status) => history.record(&status),
                Err(err) => warn!(%err, "history skipped an unreadable health status"),
            }
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::Status;
    use serde_json::json;

    fn checked(score: u8, status: &str) -> serde_json::Value {
        json!({
            "status": status,
            "score": score,
            "uptime": 1.0,
            "timestamp": "2024-01-01T00:00:00Z",
            "checks": {},
        })
    }

    #[test]
    fn test_records_each_cycle_within_capacity() {
        let mut ctx = HealthContext::default();
        HistoryPlugin::new(2).install(&mut ctx).unwrap();
        let history = ctx.history.clone().unwrap();

        ctx.events.emit(events::HEALTH_CHECKED, &checked(100, "healthy"));
        ctx.events.emit(events::HEALTH_CHECKED, &checked(60, "degraded"));
        ctx.events.emit(events::HEALTH_CHECKED, &checked(10, "unhealthy"));

        assert_eq!(history.len(), 2);
        let latest = history.latest().unwrap();
        assert_eq!(latest.score, 10);
        assert_eq!(latest.status, Status::Unhealthy);
    }
}
