// src/interval/mod.rs
mod parser;

pub use parser::{format, parse, Interval, IntervalError, IntervalUnit};
