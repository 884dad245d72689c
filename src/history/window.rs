// src/history/window.rs
use crate::health::{HealthStatus, Status};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub timestamp: DateTime<Utc>,
    pub status: Status,
    pub score: u8,
    pub failing: Vec<String>,
}

impl From<&HealthStatus> for HistoryEntry {
    fn from(status: &HealthStatus) -> Self {
        Self {
            timestamp: status.timestamp,
            status: status.status,
            score: status.score,
            failing: status
                .checks
                .iter()
                .filter(|(_, r)| r.status == Status::Unhealthy)
                .map(|(name, _)| name.clone())
                .collect(),
        }
    }
}

/// Bounded in-memory window of past aggregation cycles, oldest first.
#[derive(Debug)]
pub struct HealthHistory {
    capacity: usize,
    entries: Mutex<VecDeque<HistoryEntry>>,
}

impl HealthHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn record(&self, status: &HealthStatus) {
        let mut entries = self.lock();
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(HistoryEntry::from(status));
    }

    pub fn entries(&self) -> Vec<HistoryEntry> {
        self.lock().iter().cloned().collect()
    }

    pub fn latest(&self) -> Option<HistoryEntry> {
        self.lock().back().cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Share of recorded cycles whose overall status was healthy.
    pub fn availability(&self) -> Option<f64> {
        let entries = self.lock();
        if entries.is_empty() {
            return None;
        }
        let healthy = entries.iter().filter(|e| e.status == Status::Healthy).count();
        Some(healthy as f64 / entries.len() as f64)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<HistoryEntry>> {
        // a poisoned window only ever holds fully-written entries
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
