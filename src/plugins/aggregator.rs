// src/plugins/aggregator.rs
use crate::aggregator::Aggregator;
use crate::kernel::{HealthContext, Plugin};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

pub const NAME: &str = "aggregator";

#[derive(Debug, Default)]
pub struct AggregatorPlugin;

#[async_trait]
impl Plugin for AggregatorPlugin {
    fn name(&self) -> &str {
        NAME
    }

    fn install(&self, ctx: &mut HealthContext) -> anyhow::Result<()> {
        let thresholds = ctx.options.config.thresholds.unwrap_or_default();
        debug!(
            healthy = thresholds.healthy,
            degraded = thresholds.degraded,
            "installing aggregator"
        );
        ctx.aggregator = Some(Arc::new(Aggregator::new(thresholds)?));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::ThresholdConfig;
    use crate::config::{Config, HealthOptions};

    #[test]
    fn test_configured_thresholds_are_applied() {
        let config = Config {
            thresholds: Some(ThresholdConfig {
                healthy: 90.0,
                degraded: 40.0,
            }),
            ..Config::default()
        };
        let mut ctx = HealthContext::new(HealthOptions::new(config));

        AggregatorPlugin.install(&mut ctx).unwrap();

        let aggregator = ctx.require_aggregator().unwrap();
        assert_eq!(aggregator.healthy_threshold(), 90.0);
        assert_eq!(aggregator.degraded_threshold(), 40.0);
    }

    #[test]
    fn test_out_of_range_thresholds_fail_install() {
        let config = Config {
            thresholds: Some(ThresholdConfig {
                healthy: 120.0,
                degraded: 40.0,
            }),
            ..Config::default()
        };
        let mut ctx = HealthContext::new(HealthOptions::new(config));

        assert!(AggregatorPlugin.install(&mut ctx).is_err());
        assert!(ctx.aggregator.is_none());
    }
}
