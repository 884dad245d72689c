// src/history/mod.rs
mod window;

pub use window::{HealthHistory, HistoryEntry};
