// src/kernel/mod.rs
mod context;
pub mod events;
mod kernel;
mod plugin;

pub use context::HealthContext;
pub use events::{EventBus, EventHandler, HandlerId};
pub use kernel::{DestroyReport, Kernel, KernelError, KernelState, PluginFailure, PluginState};
pub use plugin::{ErrorRouter, Plugin};
