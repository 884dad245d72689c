// src/lib.rs
pub mod aggregator;
pub mod checks;
pub mod cli;
pub mod config;
pub mod health;
pub mod history;
pub mod interval;
pub mod kernel;
pub mod metrics;
pub mod plugins;
pub mod retry;
pub mod runner;
pub mod server;

pub use config::HealthOptions;
pub use health::{check_fn, CheckConfig, CheckHandler, CheckOutcome, HealthStatus, Status};
pub use kernel::{Kernel, Plugin};
pub use plugins::default_kernel;
