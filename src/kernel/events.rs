// src/kernel/events.rs
use dashmap::DashMap;
use serde_json::Value;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

pub const PLUGIN_INSTALLED: &str = "plugin:installed";
pub const KERNEL_READY: &str = "kernel:ready";
pub const KERNEL_DESTROYED: &str = "kernel:destroyed";
pub const CHECK_COMPLETE: &str = "check:complete";
pub const CHECK_ERROR: &str = "check:error";
pub const HEALTH_CHECKED: &str = "health:checked";
pub const THRESHOLDS_UPDATE: &str = "thresholds:update";
pub const THRESHOLDS_CHANGED: &str = "thresholds:changed";
pub const ERROR: &str = "error";

pub type EventHandler = Arc<dyn Fn(&Value) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

struct Registration {
    id: HandlerId,
    once: bool,
    handler: EventHandler,
}

#[derive(Default)]
struct Inner {
    handlers: DashMap<String, Vec<Registration>>,
    next_id: AtomicU64,
}

/// Synchronous in-process publish/subscribe. Cloning shares the same handlers.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Arc<Inner>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on<F>(&self, event: impl Into<String>, handler: F) -> HandlerId
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.register(event.into(), Arc::new(handler), false)
    }

    /// Like [`EventBus::on`], but the handler is removed after its first call.
    pub fn once<F>(&self, event: impl Into<String>, handler: F) -> HandlerId
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.register(event.into(), Arc::new(handler), true)
    }

    pub fn off(&self, id: HandlerId) -> bool {
        let mut removed = false;
        for mut entry in self.inner.handlers.iter_mut() {
            let before = entry.len();
            entry.retain(|r| r.id != id);
            removed |= entry.len() != before;
        }
        removed
    }

    /// Invoke every handler for `event` in registration order; returns how many ran.
    pub fn emit(&self, event: &str, payload: &Value) -> usize {
        // Snapshot first so handlers can re-enter the bus without deadlocking.
        let snapshot: Vec<EventHandler> = match self.inner.handlers.get_mut(event) {
            Some(mut registrations) => {
                let snapshot = registrations.iter().map(|r| r.handler.clone()).collect();
                registrations.retain(|r| !r.once);
                snapshot
            }
            None => return 0,
        };

        for handler in &snapshot {
            handler(payload);
        }
        snapshot.len()
    }

    pub fn listener_count(&self, event: &str) -> usize {
        self.inner
            .handlers
            .get(event)
            .map(|registrations| registrations.len())
            .unwrap_or(0)
    }

    pub fn clear(&self) {
        self.inner.handlers.clear();
    }

    fn register(&self, event: String, handler: EventHandler, once: bool) -> HandlerId {
        let id = HandlerId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        self.inner
            .handlers
            .entry(event)
            .or_default()
            .push(Registration { id, once, handler });
        id
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let events: Vec<String> = self
            .inner
            .handlers
            .iter()
            .map(|entry| format!("{}({})", entry.key(), entry.value().len()))
            .collect();
        f.debug_struct("EventBus").field("events", &events).finish()
    }
}
