// src/engine/mod.rs

//! Runtime event loop.
//!
//! Triggers arrive from the watcher (or tests) as [`RuntimeEvent`]s. Each
//! trigger becomes one spawned scheduler run; runs proceed concurrently and
//! report back with [`RuntimeEvent::RunFinished`].

use crate::types::{TaskName, TriggerReason};

pub mod runtime;

pub use runtime::{Runtime, RuntimeSummary};

#[derive(Debug, Clone, Copy)]
pub struct RuntimeOptions {
    /// Stop once no run is in flight after at least one has finished.
    pub exit_when_idle: bool,
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Succeeded { changed: usize },
    Failed { error: String },
}

/// Events flowing into the runtime from the watcher, spawned runs and the
/// Ctrl-C handler.
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    TaskTriggered {
        task: TaskName,
        reason: TriggerReason,
    },
    RunFinished {
        task: TaskName,
        outcome: RunOutcome,
    },
    ShutdownRequested,
}
