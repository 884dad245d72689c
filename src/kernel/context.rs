// src/kernel/context.rs
use super::events::EventBus;
use super::kernel::KernelError;
use super::plugin::ErrorRouter;
use crate::aggregator::{Aggregator, ThresholdConfig};
use crate::config::HealthOptions;
use crate::history::HealthHistory;
use crate::metrics::MetricsCollector;
use crate::runner::CheckRunner;
use crate::server::ServerInfo;
use std::sync::Arc;
use std::time::Instant;

/// State shared by every plugin of one kernel.
///
/// Each named slot belongs to exactly one plugin; other plugins only read it
/// or go through the methods of the handle stored there.
#[derive(Debug)]
pub struct HealthContext {
    pub options: HealthOptions,
    pub events: EventBus,
    pub errors: ErrorRouter,
    pub started_at: Instant,

    pub runner: Option<Arc<CheckRunner>>,
    pub aggregator: Option<Arc<Aggregator>>,
    pub server: Option<ServerInfo>,
    pub thresholds: Option<ThresholdConfig>,
    pub metrics: Option<Arc<MetricsCollector>>,
    pub history: Option<Arc<HealthHistory>>,
}

impl HealthContext {
    pub fn new(options: HealthOptions) -> Self {
        let events = EventBus::new();
        Self {
            options,
            errors: ErrorRouter::new(events.clone()),
            events,
            started_at: Instant::now(),
            runner: None,
            aggregator: None,
            server: None,
            thresholds: None,
            metrics: None,
            history: None,
        }
    }

    /// Seconds since the context was created.
    pub fn uptime(&self) -> f64 {
        self.started_at.elapsed().as_secs_f64()
    }

    pub fn require_runner(&self) -> Result<Arc<CheckRunner>, KernelError> {
        self.runner.clone().ok_or(KernelError::MissingSlot("runner"))
    }

    pub fn require_aggregator(&self) -> Result<Arc<Aggregator>, KernelError> {
        self.aggregator
            .clone()
            .ok_or(KernelError::MissingSlot("aggregator"))
    }

    pub(crate) fn teardown(&mut self) {
        self.runner = None;
        self.aggregator = None;
        self.server = None;
        self.thresholds = None;
        self.metrics = None;
        self.history = None;
        self.errors.clear();
        self.events.clear();
    }
}

impl Default for HealthContext {
    fn default() -> Self {
        Self::new(HealthOptions::default())
    }
}
