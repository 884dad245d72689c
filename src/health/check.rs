// src/health/check.rs
use super::status::CheckOutcome;
use async_trait::async_trait;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_RETRIES: u32 = 0;

/// A user-supplied health test of one dependency.
#[async_trait]
pub trait CheckHandler: Send + Sync + 'static {
    async fn check(&self) -> anyhow::Result<CheckOutcome>;
}

/// Adapter returned by [`check_fn`].
pub struct FnCheck<F> {
    f: F,
}

/// Turn an async closure into a [`CheckHandler`].
pub fn check_fn<F, Fut>(f: F) -> FnCheck<F>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<CheckOutcome>> + Send + 'static,
{
    FnCheck { f }
}

#[async_trait]
impl<F, Fut> CheckHandler for FnCheck<F>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<CheckOutcome>> + Send + 'static,
{
    async fn check(&self) -> anyhow::Result<CheckOutcome> {
        (self.f)().await
    }
}

/// How a single check must be run. Unset fields fall back to [`CheckDefaults`].
#[derive(Clone)]
pub struct CheckConfig {
    pub handler: Arc<dyn CheckHandler>,
    pub timeout: Option<Duration>,
    pub retries: Option<u32>,
    pub critical: Option<bool>,
    pub weight: Option<f64>,
    pub backoff: Option<Duration>,
}

impl CheckConfig {
    pub fn new(handler: impl CheckHandler) -> Self {
        Self::from_arc(Arc::new(handler))
    }

    pub fn from_arc(handler: Arc<dyn CheckHandler>) -> Self {
        Self {
            handler,
            timeout: None,
            retries: None,
            critical: None,
            weight: None,
            backoff: None,
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn retries(mut self, retries: u32) -> Self {
        self.retries = Some(retries);
        self
    }

    pub fn critical(mut self, critical: bool) -> Self {
        self.critical = Some(critical);
        self
    }

    pub fn weight(mut self, weight: f64) -> Self {
        self.weight = Some(weight);
        self
    }

    pub fn backoff(mut self, backoff: Duration) -> Self {
        self.backoff = Some(backoff);
        self
    }
}

impl fmt::Debug for CheckConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckConfig")
            .field("timeout", &self.timeout)
            .field("retries", &self.retries)
            .field("critical", &self.critical)
            .field("weight", &self.weight)
            .field("backoff", &self.backoff)
            .finish_non_exhaustive()
    }
}

/// Second layer of defaults, between the per-check value and the built-in constant.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckDefaults {
    pub timeout: Option<Duration>,
    pub retries: Option<u32>,
    pub backoff: Option<Duration>,
}

impl CheckDefaults {
    pub fn timeout_for(&self, config: &CheckConfig) -> Duration {
        config
            .timeout
            .or(self.timeout)
            .unwrap_or(DEFAULT_TIMEOUT)
    }

    pub fn retries_for(&self, config: &CheckConfig) -> u32 {
        config
            .retries
            .or(self.retries)
            .unwrap_or(DEFAULT_RETRIES)
    }

    pub fn backoff_for(&self, config: &CheckConfig) -> Option<Duration> {
        config.backoff.or(self.backoff)
    }

    pub fn critical_for(&self, config: &CheckConfig) -> bool {
        config.critical.unwrap_or(false)
    }

    /// Weight is never defaulted here so the aggregator can tell zero from unset.
    pub fn weight_for(&self, config: &CheckConfig) -> Option<f64> {
        config.weight
    }
}
