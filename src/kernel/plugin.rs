// src/kernel/plugin.rs
use super::context::HealthContext;
use super::events::{self, EventBus};
use arc_swap::ArcSwap;
use async_trait::async_trait;
use serde_json::json;
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::error;

/// An installable unit composed by the [`Kernel`](super::Kernel).
///
/// `install` runs for every plugin (in dependency order) before any `on_init`,
/// so a plugin can rely on its dependencies' context slots being populated
/// during `on_init`, but not on them being started.
#[async_trait]
pub trait Plugin: Send + Sync + 'static {
    fn name(&self) -> &str;

    fn version(&self) -> &str {
        env!("CARGO_PKG_VERSION")
    }

    /// Names of plugins that must be installed first.
    fn dependencies(&self) -> Vec<String> {
        Vec::new()
    }

    fn install(&self, ctx: &mut HealthContext) -> anyhow::Result<()>;

    async fn on_init(&self, _ctx: &mut HealthContext) -> anyhow::Result<()> {
        Ok(())
    }

    async fn on_destroy(&self) -> anyhow::Result<()> {
        Ok(())
    }

    /// Called when this plugin reports a failure while serving a request.
    fn on_error(&self, _error: &anyhow::Error) {}
}

/// Routes request-time errors to the reporting plugin's `on_error` hook.
///
/// Plugins are held weakly; the kernel owns them.
#[derive(Clone)]
pub struct ErrorRouter {
    plugins: Arc<ArcSwap<Vec<Weak<dyn Plugin>>>>,
    events: EventBus,
}

impl ErrorRouter {
    pub fn new(events: EventBus) -> Self {
        Self {
            plugins: Arc::new(ArcSwap::from_pointee(Vec::new())),
            events,
        }
    }

    pub(crate) fn set_plugins(&self, plugins: &[Arc<dyn Plugin>]) {
        self.plugins
            .store(Arc::new(plugins.iter().map(Arc::downgrade).collect()));
    }

    pub(crate) fn clear(&self) {
        self.plugins.store(Arc::new(Vec::new()));
    }

    pub fn report(&self, plugin: &str, err: &anyhow::Error) {
        error!(plugin, error = %format!("{:#}", err), "plugin error");

        let target = self
            .plugins
            .load()
            .iter()
            .filter_map(Weak::upgrade)
            .find(|p| p.name() == plugin);
        if let Some(target) = target {
            target.on_error(err);
        }

        self.events.emit(
            events::ERROR,
            &json!({ "plugin": plugin, "error": format!("{:#}", err) }),
        );
    }
}

impl fmt::Debug for ErrorRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self
            .plugins
            .load()
            .iter()
            .filter_map(Weak::upgrade)
            .map(|p| p.name().to_string())
            .collect();
        f.debug_struct("ErrorRouter").field("plugins", &names).finish()
    }
}
