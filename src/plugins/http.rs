// src/plugins/http.rs
use super::aggregator::NAME as AGGREGATOR;
use super::runner::NAME as RUNNER;
use crate::kernel::{HealthContext, Plugin};
use crate::server::{HealthService, RequestHandler, RunningServer, ServerBuilder, ServerInfo};
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

pub const NAME: &str = "http";

struct Scheduler {
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

struct Running {
    service: Arc<HealthService>,
    server: RunningServer,
    scheduler: Option<Scheduler>,
}

/// Serves the health routes and, when an interval is configured, re-runs the
/// checks in the background.
#[derive(Default)]
pub struct HttpPlugin {
    running: Mutex<Option<Running>>,
    errors: AtomicU64,
}

impl HttpPlugin {
    pub fn new() -> Self {
        Self::default()
    }

    /// The service behind the routes while the plugin is started.
    pub async fn service(&self) -> Option<Arc<HealthService>> {
        self.running
            .lock()
            .await
            .as_ref()
            .map(|running| running.service.clone())
    }

    /// Request-time failures routed to this plugin so far.
    pub fn error_count(&self) -> u64 {
        self.errors.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Plugin for HttpPlugin {
    fn name(&self) -> &str {
        NAME
    }

    fn dependencies(&self) -> Vec<String> {
        vec![RUNNER.to_string(), AGGREGATOR.to_string()]
    }

    fn install(&self, ctx: &mut HealthContext) -> anyhow::Result<()> {
        ctx.require_runner()?;
        ctx.require_aggregator()?;
        Ok(())
    }

    async fn on_init(&self, ctx: &mut HealthContext) -> anyhow::Result<()> {
        let service = Arc::new(HealthService::from_context(ctx)?);
        let server_config = &ctx.options.config.server;

        let server = ServerBuilder::new(server_config.host.clone(), server_config.port)
            .with_handler(RequestHandler::new(service.clone()))
            .spawn()
            .await?;

        let info = ServerInfo {
            local_addr: server.local_addr(),
            base_path: service.router().base_path().to_string(),
        };
        info!(
            checks = ?service.check_names().collect::<Vec<_>>(),
            "Health endpoints available at {}",
            info.url()
        );
        ctx.server = Some(info);

        let scheduler = match ctx.options.config.interval {
            Some(every) if !every.as_duration().is_zero() => {
                let (shutdown_tx, shutdown_rx) = watch::channel(false);
                let task = tokio::spawn(
                    service
                        .clone()
                        .run_scheduler(every.as_duration(), shutdown_rx),
                );
                Some(Scheduler { shutdown_tx, task })
            }
            Some(_) => {
                warn!("ignoring zero check interval");
                None
            }
            None => None,
        };

        *self.running.lock().await = Some(Running {
            service,
            server,
            scheduler,
        });
        Ok(())
    }

    async fn on_destroy(&self) -> anyhow::Result<()> {
        let running = match self.running.lock().await.take() {
            Some(running) => running,
            None => return Ok(()),
        };

        if let Some(scheduler) = running.scheduler {
            let _ = scheduler.shutdown_tx.send(true);
            if let Err(err) = scheduler.task.await {
                warn!(%err, "scheduler task ended abnormally");
            }
        }
        running.server.shutdown().await;
        debug!("http plugin stopped");
        Ok(())
    }

    fn on_error(&self, _error: &anyhow::Error) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, HealthOptions};
    use crate::kernel::{Kernel, KernelError};
    use crate::plugins::{AggregatorPlugin, RunnerPlugin};

    fn local_options() -> HealthOptions {
        let mut config = Config::default();
        config.server.host = "127.0.0.1".to_string();
        config.server.port = 0;
        HealthOptions::new(config)
    }

    #[tokio::test]
    async fn test_requires_core_plugins() {
        let mut kernel = Kernel::new(local_options());
        kernel.use_plugin(HttpPlugin::new()).unwrap();

        let err = kernel.init().await.unwrap_err();
        assert!(matches!(err, KernelError::MissingDependency { .. }));
    }

    #[tokio::test]
    async fn test_starts_and_stops() {
        let plugin = Arc::new(HttpPlugin::new());
        let mut kernel = Kernel::new(local_options());
        kernel
            .use_arc(plugin.clone())
            .unwrap()
            .use_plugin(RunnerPlugin)
            .unwrap()
            .use_plugin(AggregatorPlugin)
            .unwrap();
        kernel.init().await.unwrap();

        let info = kernel.context().server.clone().unwrap();
        assert_ne!(info.local_addr.port(), 0);
        assert_eq!(info.base_path, "/health");
        assert!(plugin.service().await.is_some());

        let report = kernel.destroy().await;
        assert!(report.is_clean());
        assert!(plugin.service().await.is_none());
    }

    #[tokio::test]
    async fn test_dropped_kernel_releases_service() {
        let plugin = Arc::new(HttpPlugin::new());
        let mut kernel = Kernel::new(local_options());
        kernel
            .use_arc(plugin.clone())
            .unwrap()
            .use_plugin(RunnerPlugin)
            .unwrap()
            .use_plugin(AggregatorPlugin)
            .unwrap();
        kernel.init().await.unwrap();

        let service = Arc::downgrade(&plugin.service().await.unwrap());
        assert!(service.upgrade().is_some());

        drop(plugin);
        drop(kernel);
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        assert!(service.upgrade().is_none());
    }

    #[test]
    fn test_errors_are_counted() {
        let plugin = HttpPlugin::new();
        plugin.on_error(&anyhow::anyhow!("boom"));
        plugin.on_error(&anyhow::anyhow!("boom again"));
        assert_eq!(plugin.error_count(), 2);
    }
}
