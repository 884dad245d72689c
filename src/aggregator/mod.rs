// src/aggregator/mod.rs
mod aggregator;
mod thresholds;

pub use aggregator::Aggregator;
pub use thresholds::{
    ThresholdConfig, ThresholdUpdate, ValidationError, DEFAULT_DEGRADED_THRESHOLD,
    DEFAULT_HEALTHY_THRESHOLD,
};
