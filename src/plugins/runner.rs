// src/plugins/runner.rs
use crate::kernel::{HealthContext, Plugin};
use crate::runner::CheckRunner;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

pub const NAME: &str = "runner";

/// Places the [`CheckRunner`] in the context, configured with the file defaults.
#[derive(Debug, Default)]
pub struct RunnerPlugin;

#[async_trait]
impl Plugin for RunnerPlugin {
    fn name(&self) -> &str {
        NAME
    }

    fn install(&self, ctx: &mut HealthContext) -> anyhow::Result<()> {
        let defaults = ctx.options.check_defaults();
        debug!(?defaults, "installing check runner");
        ctx.runner = Some(Arc::new(CheckRunner::new(defaults)));
        Ok(())
    }
}
