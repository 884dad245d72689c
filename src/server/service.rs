// src/server/service.rs
use super::router::{Route, Router};
use crate::aggregator::Aggregator;
use crate::health::{CheckConfig, CheckResult, HealthStatus, Status};
use crate::history::HealthHistory;
use crate::interval;
use crate::kernel::{events, ErrorRouter, EventBus, HealthContext, KernelError};
use crate::metrics::{render_json, render_prometheus, MetricsCollector};
use crate::plugins::http as http_plugin;
use crate::runner::CheckRunner;
use anyhow::Result;
use arc_swap::ArcSwapOption;
use chrono::Utc;
use futures::future::join_all;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::{Body, Method, Response, StatusCode, Uri};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::{debug, info, warn};

const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4";

/// Runs the registered checks and answers the health routes.
pub struct HealthService {
    checks: BTreeMap<String, CheckConfig>,
    runner: Arc<CheckRunner>,
    aggregator: Arc<Aggregator>,
    events: EventBus,
    errors: ErrorRouter,
    history: Option<Arc<HealthHistory>>,
    metrics: Option<Arc<MetricsCollector>>,
    router: Router,
    started_at: Instant,
    latest: ArcSwapOption<HealthStatus>,
}

impl HealthService {
    /// Build from the slots the runner and aggregator plugins installed.
    pub fn from_context(ctx: &HealthContext) -> Result<Self, KernelError> {
        Ok(Self {
            checks: ctx.options.checks.clone(),
            runner: ctx.require_runner()?,
            aggregator: ctx.require_aggregator()?,
            events: ctx.events.clone(),
            errors: ctx.errors.clone(),
            history: ctx.history.clone(),
            metrics: ctx.metrics.clone(),
            router: Router::new(&ctx.options.config.server.base_path),
            started_at: ctx.started_at,
            latest: ArcSwapOption::empty(),
        })
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn check_names(&self) -> impl Iterator<Item = &str> {
        self.checks.keys().map(String::as_str)
    }

    pub fn uptime(&self) -> f64 {
        self.started_at.elapsed().as_secs_f64()
    }

    /// The last status produced by [`HealthService::status`], if any.
    pub fn latest(&self) -> Option<Arc<HealthStatus>> {
        self.latest.load_full()
    }

    /// Run every check concurrently. A runner error becomes an unhealthy result.
    pub async fn run_all_checks(&self) -> BTreeMap<String, CheckResult> {
        let runs = self.checks.iter().map(|(name, config)| async move {
            let started = Instant::now();
            let result = match self.runner.run(name, config).await {
                Ok(run) => {
                    let duration_ms = run.duration_ms();
                    let mut result = run.result;
                    if result.latency.is_none() {
                        result.latency = Some(duration_ms);
                    }
                    self.events.emit(
                        events::CHECK_COMPLETE,
                        &json!({
                            "name": name,
                            "status": result.status,
                            "duration": duration_ms,
                        }),
                    );
                    result
                }
                Err(err) => {
                    warn!(check = %name, error = %err, "check failed");
                    self.events.emit(
                        events::CHECK_ERROR,
                        &json!({
                            "name": name,
                            "error": err.to_string(),
                            "timeout": err.is_timeout(),
                        }),
                    );
                    let defaults = self.runner.defaults();
                    CheckResult {
                        status: Status::Unhealthy,
                        latency: Some(started.elapsed().as_secs_f64() * 1000.0),
                        metadata: None,
                        error: Some(err.to_string()),
                        critical: defaults.critical_for(config),
                        weight: defaults.weight_for(config),
                        last_check: Utc::now(),
                    }
                }
            };
            (name.clone(), result)
        });

        join_all(runs).await.into_iter().collect()
    }

    /// One full cycle: run, aggregate, remember, emit `health:checked`.
    pub async fn status(&self) -> HealthStatus {
        let results = self.run_all_checks().await;
        let status = self.aggregator.aggregate(results, self.uptime());
        debug!(status = %status.status, score = status.score, "health checked");

        self.latest.store(Some(Arc::new(status.clone())));
        match serde_json::to_value(&status) {
            Ok(payload) => {
                self.events.emit(events::HEALTH_CHECKED, &payload);
            }
            Err(err) => warn!(%err, "failed to serialize health status"),
        }
        status
    }

    pub async fn handle(&self, method: &Method, uri: &Uri) -> Result<Response<Body>> {
        let route = match self.router.resolve(method, uri.path()) {
            Some(route) => route,
            None => return Ok(not_found()),
        };

        match route {
            Route::Status => {
                let status = self.status().await;
                Ok(json_response(
                    status_code(status.status),
                    &serde_json::to_value(&status)?,
                ))
            }
            Route::Readiness => {
                let status = self.status().await;
                let failing: Vec<&str> = status.critical_failures().collect();
                if failing.is_empty() {
                    Ok(json_response(
                        StatusCode::OK,
                        &json!({ "status": "ready", "timestamp": status.timestamp }),
                    ))
                } else {
                    Ok(json_response(
                        StatusCode::SERVICE_UNAVAILABLE,
                        &json!({
                            "status": "not_ready",
                            "failing": failing,
                            "timestamp": status.timestamp,
                        }),
                    ))
                }
            }
            Route::Liveness => Ok(json_response(
                StatusCode::OK,
                &json!({
                    "status": "alive",
                    "uptime": self.uptime(),
                    "timestamp": Utc::now(),
                }),
            )),
            Route::Metrics => {
                let status = self.status().await;
                if wants_json(uri) {
                    return Ok(json_response(StatusCode::OK, &render_json(&status)));
                }

                let mut body = render_prometheus(&status)?;
                if let Some(metrics) = &self.metrics {
                    body.push_str(&metrics.gather()?);
                }
                Ok(text_response(StatusCode::OK, body))
            }
            Route::History => match &self.history {
                Some(history) => Ok(json_response(
                    StatusCode::OK,
                    &json!({
                        "capacity": history.capacity(),
                        "availability": history.availability(),
                        "entries": history.entries(),
                    }),
                )),
                None => Ok(not_found()),
            },
        }
    }

    /// Hand a request-time failure to the http plugin.
    pub fn report_error(&self, err: &anyhow::Error) {
        self.errors.report(http_plugin::NAME, err);
    }

    /// Re-run the checks every `every` until `shutdown` flips to true.
    pub async fn run_scheduler(self: Arc<Self>, every: Duration, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(every);
        info!(
            "Starting health check scheduler with interval: {}",
            interval::format(every.as_millis() as u64)
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let status = self.status().await;
                    info!(
                        "Scheduled check complete: {} (score {})",
                        status.status, status.score
                    );
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("Health check scheduler shutting down");
                        break;
                    }
                }
            }
        }
    }
}

fn wants_json(uri: &Uri) -> bool {
    uri.query()
        .map(|q| q.split('&').any(|pair| pair == "format=json"))
        .unwrap_or(false)
}

pub(crate) fn status_code(status: Status) -> StatusCode {
    match status {
        Status::Healthy | Status::Degraded => StatusCode::OK,
        Status::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    }
}

pub(crate) fn json_response(status: StatusCode, body: &Value) -> Response<Body> {
    let mut response = Response::new(Body::from(body.to_string()));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

fn text_response(status: StatusCode, body: String) -> Response<Body> {
    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(PROMETHEUS_CONTENT_TYPE));
    response
}

fn not_found() -> Response<Body> {
    json_response(StatusCode::NOT_FOUND, &json!({ "error": "not found" }))
}
