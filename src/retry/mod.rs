// src/retry/mod.rs
mod strategy;

pub use strategy::{RetryConfig, RetryStrategy};
