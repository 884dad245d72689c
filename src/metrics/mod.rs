// src/metrics/mod.rs
mod collector;
mod exposition;

pub use collector::MetricsCollector;
pub use exposition::{render_json, render_prometheus};
