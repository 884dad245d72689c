// src/interval/parser.rs
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

const MS_PER_SECOND: u64 = 1_000;
const MS_PER_MINUTE: u64 = 60 * MS_PER_SECOND;
const MS_PER_HOUR: u64 = 60 * MS_PER_MINUTE;
const MS_PER_DAY: u64 = 24 * MS_PER_HOUR;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IntervalError {
    #[error("invalid interval `{input}`: {reason}")]
    Invalid { input: String, reason: &'static str },
}

impl IntervalError {
    fn invalid(input: &str, reason: &'static str) -> Self {
        IntervalError::Invalid {
            input: input.to_string(),
            reason,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntervalUnit {
    Milliseconds,
    Seconds,
    Minutes,
    Hours,
    Days,
}

impl IntervalUnit {
    pub fn suffix(&self) -> &'static str {
        match self {
            IntervalUnit::Milliseconds => "ms",
            IntervalUnit::Seconds => "s",
            IntervalUnit::Minutes => "m",
            IntervalUnit::Hours => "h",
            IntervalUnit::Days => "d",
        }
    }

    pub fn millis(&self) -> u64 {
        match self {
            IntervalUnit::Milliseconds => 1,
            IntervalUnit::Seconds => MS_PER_SECOND,
            IntervalUnit::Minutes => MS_PER_MINUTE,
            IntervalUnit::Hours => MS_PER_HOUR,
            IntervalUnit::Days => MS_PER_DAY,
        }
    }
}

/// A human-authored duration such as `30s` or `1.5h`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Interval {
    pub value: f64,
    pub unit: IntervalUnit,
}

impl Interval {
    pub fn new(value: f64, unit: IntervalUnit) -> Self {
        Self { value, unit }
    }

    pub fn from_millis(ms: u64) -> Self {
        Self::new(ms as f64, IntervalUnit::Milliseconds)
    }

    pub fn to_millis(&self) -> f64 {
        self.value * self.unit.millis() as f64
    }

    /// Saturates at [`Duration::MAX`]; parsed intervals always fit.
    pub fn as_duration(&self) -> Duration {
        Duration::try_from_secs_f64(self.to_millis() / 1_000.0).unwrap_or(Duration::MAX)
    }
}

impl FromStr for Interval {
    type Err = IntervalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s)
    }
}

impl TryFrom<String> for Interval {
    type Error = IntervalError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        parse(&value)
    }
}

impl From<Interval> for String {
    fn from(interval: Interval) -> Self {
        interval.to_string()
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.value, self.unit.suffix())
    }
}

/// Parse an interval string (e.g., "100ms", "30s", "2m", "1h", "1d").
pub fn parse(text: &str) -> Result<Interval, IntervalError> {
    if text.is_empty() {
        return Err(IntervalError::invalid(text, "empty input"));
    }

    // "ms" must be tried before "m" and "s"
    let (num_str, unit) = if let Some(num) = text.strip_suffix("ms") {
        (num, IntervalUnit::Milliseconds)
    } else if let Some(num) = text.strip_suffix('s') {
        (num, IntervalUnit::Seconds)
    } else if let Some(num) = text.strip_suffix('m') {
        (num, IntervalUnit::Minutes)
    } else if let Some(num) = text.strip_suffix('h') {
        (num, IntervalUnit::Hours)
    } else if let Some(num) = text.strip_suffix('d') {
        (num, IntervalUnit::Days)
    } else {
        return Err(IntervalError::invalid(text, "unknown unit"));
    };

    let value: f64 = num_str
        .parse()
        .map_err(|_| IntervalError::invalid(text, "not a number"))?;

    if !value.is_finite() {
        return Err(IntervalError::invalid(text, "not a finite number"));
    }
    if value < 0.0 {
        return Err(IntervalError::invalid(text, "negative value"));
    }

    let interval = Interval { value, unit };
    if Duration::try_from_secs_f64(interval.to_millis() / 1_000.0).is_err() {
        return Err(IntervalError::invalid(text, "out of range"));
    }
    Ok(interval)
}

/// Format milliseconds using the largest units that apply, e.g. `1h 30m 45s`.
pub fn format(ms: u64) -> String {
    if ms < MS_PER_SECOND {
        return format!("{}ms", ms);
    }

    let mut remaining = ms;
    let mut parts = Vec::with_capacity(4);

    for (size, suffix) in [
        (MS_PER_DAY, "d"),
        (MS_PER_HOUR, "h"),
        (MS_PER_MINUTE, "m"),
        (MS_PER_SECOND, "s"),
    ] {
        let count = remaining / size;
        remaining %= size;
        if count > 0 {
            parts.push(format!("{}{}", count, suffix));
        }
    }

    parts.join(" ")
}
