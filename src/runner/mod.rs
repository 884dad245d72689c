// src/runner/mod.rs
mod runner;

pub use runner::{CheckError, CheckRun, CheckRunner};
