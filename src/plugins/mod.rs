// src/plugins/mod.rs
pub mod aggregator;
pub mod history;
pub mod http;
pub mod metrics;
pub mod runner;
pub mod thresholds;

pub use aggregator::AggregatorPlugin;
pub use history::HistoryPlugin;
pub use http::HttpPlugin;
pub use metrics::MetricsPlugin;
pub use runner::RunnerPlugin;
pub use thresholds::ThresholdsPlugin;

use crate::config::HealthOptions;
use crate::kernel::{Kernel, KernelError};

/// A kernel with the core plugins plus the optional ones the config enables.
pub fn default_kernel(options: HealthOptions) -> Result<Kernel, KernelError> {
    let history = options.config.history.clone();
    let metrics_enabled = options.config.metrics.enabled;

    let mut kernel = Kernel::new(options);
    kernel
        .use_plugin(RunnerPlugin)?
        .use_plugin(AggregatorPlugin)?
        .use_plugin(HttpPlugin::new())?
        .use_plugin(ThresholdsPlugin)?;

    if metrics_enabled {
        kernel.use_plugin(MetricsPlugin)?;
    }
    if history.enabled {
        kernel.use_plugin(HistoryPlugin::new(history.size))?;
    }
    Ok(kernel)
}
