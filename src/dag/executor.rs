// src/dag/executor.rs

//! Pluggable task executor abstraction.
//!
//! The scheduler talks to a `TaskExecutor` instead of the pipeline runner
//! directly, so tests can swap in a fake that records which tasks ran and
//! fails on demand.
//!
//! Production code uses [`crate::pipeline::PipelineRunner`].

use std::path::PathBuf;

use crate::dag::task::Task;
use crate::errors::Result;
use crate::types::BoxFuture;

/// What a single task execution produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskReport {
    /// Destination files written (or removed, for clean tasks).
    pub changed: Vec<PathBuf>,
}

/// Trait abstracting how one task is executed.
pub trait TaskExecutor: Send + Sync {
    /// Execute `task` to completion.
    ///
    /// Errors must already be tagged with the task's name
    /// (`AssetpipeError::Transform`, `Filesystem` or `Service`).
    fn execute_task<'a>(&'a self, task: &'a Task) -> BoxFuture<'a, Result<TaskReport>>;
}
