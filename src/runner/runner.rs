// src/runner/runner.rs
use crate::health::{CheckConfig, CheckDefaults, CheckHandler, CheckOutcome, CheckResult};
use crate::retry::{RetryConfig, RetryStrategy};
use chrono::Utc;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CheckError {
    #[error("check `{name}` timed out after {}ms", .timeout.as_millis())]
    Timeout { name: String, timeout: Duration },

    #[error("check `{name}` failed: {message}")]
    Handler { name: String, message: String },
}

impl CheckError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, CheckError::Timeout { .. })
    }

    pub fn check_name(&self) -> &str {
        match self {
            CheckError::Timeout { name, .. } | CheckError::Handler { name, .. } => name,
        }
    }
}

/// Result of [`CheckRunner::run`] plus wall-clock time across all attempts.
#[derive(Debug, Clone)]
pub struct CheckRun {
    pub result: CheckResult,
    pub duration: Duration,
}

impl CheckRun {
    pub fn duration_ms(&self) -> f64 {
        self.duration.as_secs_f64() * 1_000.0
    }
}

/// Runs one check handler under a timeout and a retry policy.
///
/// Each attempt spawns the handler as its own task and races it against a
/// timer. When the timer wins, the task is detached rather than aborted: it
/// keeps running until it finishes on its own and whatever it returns is
/// dropped. Handlers that must not outlive their timeout have to enforce
/// that themselves.
#[derive(Debug, Clone, Default)]
pub struct CheckRunner {
    defaults: CheckDefaults,
}

impl CheckRunner {
    pub fn new(defaults: CheckDefaults) -> Self {
        Self { defaults }
    }

    pub fn defaults(&self) -> &CheckDefaults {
        &self.defaults
    }

    pub async fn run(&self, name: &str, config: &CheckConfig) -> Result<CheckRun, CheckError> {
        let check_timeout = self.defaults.timeout_for(config);
        let retries = self.defaults.retries_for(config);

        let mut retry = RetryConfig::immediate(retries);
        if let Some(backoff) = self.defaults.backoff_for(config) {
            retry = retry.with_backoff(backoff);
        }
        let strategy = RetryStrategy::new(retry);

        let started = Instant::now();
        let outcome = strategy
            .execute(|| attempt(name, config.handler.clone(), check_timeout))
            .await;
        let duration = started.elapsed();

        match outcome {
            Ok(outcome) => {
                debug!(check = name, ?duration, status = %outcome.status, "check completed");
                let result = CheckResult::from_outcome(
                    outcome,
                    self.defaults.critical_for(config),
                    self.defaults.weight_for(config),
                    Utc::now(),
                );
                Ok(CheckRun { result, duration })
            }
            Err(error) => {
                warn!(check = name, ?duration, %error, "check failed");
                Err(error)
            }
        }
    }
}

async fn attempt(
    name: &str,
    handler: Arc<dyn CheckHandler>,
    check_timeout: Duration,
) -> Result<CheckOutcome, CheckError> {
    let task = tokio::spawn(async move { handler.check().await });

    // Dropping the JoinHandle on timeout detaches the task; it is not cancelled.
    match timeout(check_timeout, task).await {
        Err(_) => Err(CheckError::Timeout {
            name: name.to_string(),
            timeout: check_timeout,
        }),
        Ok(Err(join_error)) => Err(CheckError::Handler {
            name: name.to_string(),
            message: join_error.to_string(),
        }),
        Ok(Ok(Err(error))) => Err(CheckError::Handler {
            name: name.to_string(),
            message: format!("{:#}", error),
        }),
        Ok(Ok(Ok(outcome))) => Ok(outcome),
    }
}
