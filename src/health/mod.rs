// src/health/mod.rs
mod check;
mod status;

pub use check::{
    check_fn, CheckConfig, CheckDefaults, CheckHandler, FnCheck, DEFAULT_RETRIES, DEFAULT_TIMEOUT,
};
pub use status::{CheckOutcome, CheckResult, HealthStatus, Status};
