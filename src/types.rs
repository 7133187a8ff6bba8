// src/types.rs

use std::future::Future;
use std::pin::Pin;

/// Boxed, sendable future returned by the plugin-style traits
/// (`Transform`, `TaskExecutor`, `ReloadNotifier`).
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Canonical task name type used throughout the crate.
pub type TaskName = String;

/// Why a run was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerReason {
    /// Started from the CLI (initial series or `--task`).
    Manual,
    /// Started because a watch rule matched a changed path.
    FileWatch,
}

/// Leading-edge, per-path debounce policy for watch notifications.
///
/// `window_ms == 0` means every notification is an independent trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DebouncePolicy {
    pub window_ms: u64,
}

impl DebouncePolicy {
    pub fn none() -> Self {
        Self { window_ms: 0 }
    }

    pub fn is_enabled(&self) -> bool {
        self.window_ms > 0
    }
}
