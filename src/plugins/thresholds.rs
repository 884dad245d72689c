// src/plugins/thresholds.rs
use super::aggregator::NAME as AGGREGATOR;
use crate::aggregator::ThresholdUpdate;
use crate::kernel::{events, HealthContext, Plugin};
use async_trait::async_trait;
use serde_json::json;
use tracing::{info, warn};

pub const NAME: &str = "thresholds";

/// Applies `thresholds:update` events to the aggregator and announces the
/// result with `thresholds:changed`. The context slot keeps the thresholds
/// in effect at install time.
#[derive(Debug, Default)]
pub struct ThresholdsPlugin;

#[async_trait]
impl Plugin for ThresholdsPlugin {
    fn name(&self) -> &str {
        NAME
    }

    fn dependencies(&self) -> Vec<String> {
        vec![AGGREGATOR.to_string()]
    }

    fn install(&self, ctx: &mut HealthContext) -> anyhow::Result<()> {
        let aggregator = ctx.require_aggregator()?;
        ctx.thresholds = Some(aggregator.thresholds());

        let bus = ctx.events.clone();
        let errors = ctx.errors.clone();
        ctx.events.on(events::THRESHOLDS_UPDATE, move |payload| {
            let update: ThresholdUpdate = match serde_json::from_value(payload.clone()) {
                Ok(update) => update,
                Err(err) => {
                    warn!(%err, "ignoring malformed threshold update");
                    errors.report(NAME, &anyhow::Error::new(err));
                    return;
                }
            };

            match aggregator.set_thresholds(update) {
                Ok(current) => {
                    info!(healthy = current.healthy, degraded = current.degraded, "thresholds changed");
                    bus.emit(
                        events::THRESHOLDS_CHANGED,
                        &json!({ "healthy": current.healthy, "degraded": current.degraded }),
                    );
                }
                Err(err) => errors.report(NAME, &anyhow::Error::new(err)),
            }
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HealthOptions;
    use crate::kernel::Kernel;
    use crate::plugins::AggregatorPlugin;
    use std::sync::{Arc, Mutex};

    async fn kernel() -> Kernel {
        let mut kernel = Kernel::new(HealthOptions::default());
        kernel
            .use_plugin(ThresholdsPlugin)
            .unwrap()
            .use_plugin(AggregatorPlugin)
            .unwrap();
        kernel.init().await.unwrap();
        kernel
    }

    #[tokio::test]
    async fn test_update_event_changes_thresholds() {
        let kernel = kernel().await;
        let changed = Arc::new(Mutex::new(Vec::new()));
        let sink = changed.clone();
        kernel.on(events::THRESHOLDS_CHANGED, move |payload| {
            sink.lock().unwrap().push(payload.clone());
        });

        kernel.emit(events::THRESHOLDS_UPDATE, &json!({ "healthy": 95 }));

        let aggregator = kernel.context().require_aggregator().unwrap();
        assert_eq!(aggregator.healthy_threshold(), 95.0);
        assert_eq!(aggregator.degraded_threshold(), 50.0);
        assert_eq!(
            changed.lock().unwrap().as_slice(),
            &[json!({ "healthy": 95.0, "degraded": 50.0 })]
        );
        assert_eq!(
            kernel.context().thresholds.unwrap().healthy,
            80.0
        );
    }

    #[tokio::test]
    async fn test_invalid_update_is_reported() {
        let kernel = kernel().await;
        let reported = Arc::new(Mutex::new(Vec::new()));
        let sink = reported.clone();
        kernel.on(events::ERROR, move |payload| {
            sink.lock().unwrap().push(payload["plugin"].clone());
        });

        kernel.emit(events::THRESHOLDS_UPDATE, &json!({ "degraded": 250 }));
        kernel.emit(events::THRESHOLDS_UPDATE, &json!({ "healthy": "high" }));

        let aggregator = kernel.context().require_aggregator().unwrap();
        assert_eq!(aggregator.degraded_threshold(), 50.0);
        assert_eq!(reported.lock().unwrap().len(), 2);
        assert_eq!(reported.lock().unwrap()[0], "thresholds");
    }
}
