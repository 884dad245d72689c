// src/kernel/kernel.rs
use super::context::HealthContext;
use super::events::{self, HandlerId};
use super::plugin::Plugin;
use crate::config::HealthOptions;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tracing::{debug, error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelState {
    Created,
    Initializing,
    Running,
    Destroying,
    Destroyed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginState {
    Registered,
    Installed,
    Initialized,
    Destroyed,
}

#[derive(Debug, thiserror::Error)]
pub enum KernelError {
    #[error("plugin `{0}` is already registered")]
    DuplicatePlugin(String),

    #[error("plugin `{plugin}` depends on `{dependency}`, which is not registered")]
    MissingDependency { plugin: String, dependency: String },

    #[error("circular plugin dependency between: {}", .0.join(", "))]
    DependencyCycle(Vec<String>),

    #[error("cannot {action} a kernel in state {state:?}")]
    InvalidState {
        action: &'static str,
        state: KernelState,
    },

    #[error("context slot `{0}` is not populated")]
    MissingSlot(&'static str),

    #[error("plugin `{name}` failed during {stage}")]
    Plugin {
        name: String,
        stage: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl KernelError {
    pub fn is_dependency_error(&self) -> bool {
        matches!(
            self,
            KernelError::MissingDependency { .. } | KernelError::DependencyCycle(_)
        )
    }
}

/// A teardown failure collected by [`Kernel::destroy`].
#[derive(Debug)]
pub struct PluginFailure {
    pub plugin: String,
    pub error: anyhow::Error,
}

#[derive(Debug, Default)]
pub struct DestroyReport {
    pub failures: Vec<PluginFailure>,
}

impl DestroyReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

struct Entry {
    plugin: Arc<dyn Plugin>,
    state: PluginState,
}

/// Plugin micro-kernel: owns the context and drives plugin lifecycles.
pub struct Kernel {
    context: HealthContext,
    entries: Vec<Entry>,
    install_order: Vec<usize>,
    state: KernelState,
}

impl Kernel {
    pub fn new(options: HealthOptions) -> Self {
        Self {
            context: HealthContext::new(options),
            entries: Vec::new(),
            install_order: Vec::new(),
            state: KernelState::Created,
        }
    }

    pub fn use_plugin(&mut self, plugin: impl Plugin) -> Result<&mut Self, KernelError> {
        self.use_arc(Arc::new(plugin))
    }

    pub fn use_arc(&mut self, plugin: Arc<dyn Plugin>) -> Result<&mut Self, KernelError> {
        if self.state != KernelState::Created {
            return Err(KernelError::InvalidState {
                action: "register plugins on",
                state: self.state,
            });
        }
        if self.entries.iter().any(|e| e.plugin.name() == plugin.name()) {
            return Err(KernelError::DuplicatePlugin(plugin.name().to_string()));
        }

        debug!(plugin = plugin.name(), version = plugin.version(), "plugin registered");
        self.entries.push(Entry {
            plugin,
            state: PluginState::Registered,
        });
        Ok(self)
    }

    /// Install every plugin in dependency order, then run their `on_init` hooks.
    ///
    /// Dependency problems are reported before any plugin is installed. Hook
    /// failures are returned as-is; already installed plugins can still be
    /// torn down with [`Kernel::destroy`].
    pub async fn init(&mut self) -> Result<(), KernelError> {
        if self.state != KernelState::Created {
            return Err(KernelError::InvalidState {
                action: "initialize",
                state: self.state,
            });
        }

        let order = self.resolve_order()?;
        self.state = KernelState::Initializing;

        for &idx in &order {
            let plugin = self.entries[idx].plugin.clone();
            plugin
                .install(&mut self.context)
                .map_err(|source| KernelError::Plugin {
                    name: plugin.name().to_string(),
                    stage: "install",
                    source,
                })?;

            self.entries[idx].state = PluginState::Installed;
            self.install_order.push(idx);
            debug!(plugin = plugin.name(), "plugin installed");
            self.context.events.emit(
                events::PLUGIN_INSTALLED,
                &json!({ "name": plugin.name(), "version": plugin.version() }),
            );
        }

        for &idx in &order {
            let plugin = self.entries[idx].plugin.clone();
            plugin
                .on_init(&mut self.context)
                .await
                .map_err(|source| KernelError::Plugin {
                    name: plugin.name().to_string(),
                    stage: "init",
                    source,
                })?;
            self.entries[idx].state = PluginState::Initialized;
        }

        let plugins: Vec<Arc<dyn Plugin>> =
            self.entries.iter().map(|e| e.plugin.clone()).collect();
        self.context.errors.set_plugins(&plugins);
        self.state = KernelState::Running;

        let names = self.install_order_names();
        info!(plugins = ?names, "Kernel running");
        self.context
            .events
            .emit(events::KERNEL_READY, &json!({ "plugins": names }));
        Ok(())
    }

    /// Run `on_destroy` hooks in reverse install order. Failures are logged and
    /// collected; every installed plugin gets its teardown attempt.
    pub async fn destroy(&mut self) -> DestroyReport {
        let mut report = DestroyReport::default();
        if self.state == KernelState::Destroyed {
            return report;
        }
        self.state = KernelState::Destroying;

        let order: Vec<usize> = self.install_order.iter().rev().copied().collect();
        for idx in order {
            let plugin = self.entries[idx].plugin.clone();
            if let Err(err) = plugin.on_destroy().await {
                error!(plugin = plugin.name(), error = %format!("{:#}", err), "plugin teardown failed");
                report.failures.push(PluginFailure {
                    plugin: plugin.name().to_string(),
                    error: err,
                });
            }
        }
        for entry in &mut self.entries {
            entry.state = PluginState::Destroyed;
        }

        self.context.events.emit(
            events::KERNEL_DESTROYED,
            &json!({ "failures": report.failures.len() }),
        );
        self.context.teardown();
        self.state = KernelState::Destroyed;
        info!(failures = report.failures.len(), "Kernel destroyed");
        report
    }

    pub fn context(&self) -> &HealthContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut HealthContext {
        &mut self.context
    }

    pub fn state(&self) -> KernelState {
        self.state
    }

    pub fn plugin_state(&self, name: &str) -> Option<PluginState> {
        self.entries
            .iter()
            .find(|e| e.plugin.name() == name)
            .map(|e| e.state)
    }

    pub fn install_order_names(&self) -> Vec<String> {
        self.install_order
            .iter()
            .map(|&idx| self.entries[idx].plugin.name().to_string())
            .collect()
    }

    pub fn on<F>(&self, event: impl Into<String>, handler: F) -> HandlerId
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.context.events.on(event, handler)
    }

    pub fn once<F>(&self, event: impl Into<String>, handler: F) -> HandlerId
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.context.events.once(event, handler)
    }

    pub fn emit(&self, event: &str, payload: &Value) -> usize {
        self.context.events.emit(event, payload)
    }

    /// Topological order over declared dependencies (Kahn's algorithm),
    /// ties broken by registration order.
    fn resolve_order(&self) -> Result<Vec<usize>, KernelError> {
        let index: HashMap<&str, usize> = self
            .entries
            .iter()
            .enumerate()
            .map(|(idx, e)| (e.plugin.name(), idx))
            .collect();

        let mut in_degree = vec![0usize; self.entries.len()];
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); self.entries.len()];

        for (idx, entry) in self.entries.iter().enumerate() {
            for dependency in entry.plugin.dependencies() {
                let dep_idx = *index.get(dependency.as_str()).ok_or_else(|| {
                    KernelError::MissingDependency {
                        plugin: entry.plugin.name().to_string(),
                        dependency: dependency.clone(),
                    }
                })?;
                dependents[dep_idx].push(idx);
                in_degree[idx] += 1;
            }
        }

        let mut queue: VecDeque<usize> = (0..self.entries.len())
            .filter(|&idx| in_degree[idx] == 0)
            .collect();
        let mut order = Vec::with_capacity(self.entries.len());

        while let Some(idx) = queue.pop_front() {
            order.push(idx);
            for &dependent in &dependents[idx] {
                in_degree[dependent] -= 1;
                if in_degree[dependent] == 0 {
                    queue.push_back(dependent);
                }
            }
        }

        if order.len() != self.entries.len() {
            let stuck = in_degree
                .iter()
                .enumerate()
                .filter(|(_, &deg)| deg > 0)
                .map(|(idx, _)| self.entries[idx].plugin.name().to_string())
                .collect();
            return Err(KernelError::DependencyCycle(stuck));
        }

        Ok(order)
    }
}
