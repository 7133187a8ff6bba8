// src/dag/context.rs

use std::collections::HashSet;
use std::path::PathBuf;

use crate::types::TaskName;

/// Per-run bookkeeping.
///
/// Created for each run (one scheduler `run`, or one pass over the default
/// series) and dropped with it. Tasks completed here are not executed again
/// within the same run.
#[derive(Debug, Default, Clone)]
pub struct RunContext {
    completed: Vec<TaskName>,
    completed_set: HashSet<TaskName>,
    requested: HashSet<TaskName>,
    changed: Vec<PathBuf>,
}

impl RunContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_completed(&self, task: &str) -> bool {
        self.completed_set.contains(task)
    }

    pub(crate) fn mark_completed(&mut self, task: &str, changed: Vec<PathBuf>) {
        if self.completed_set.insert(task.to_string()) {
            self.completed.push(task.to_string());
        }
        self.changed.extend(changed);
    }

    /// Record an explicit request for `task` (a series entry). Returns
    /// `false` if it was already requested in this run.
    pub(crate) fn mark_requested(&mut self, task: &str) -> bool {
        self.requested.insert(task.to_string())
    }

    /// Tasks in the order they completed.
    pub fn completed(&self) -> &[TaskName] {
        &self.completed
    }

    /// Destination paths changed during this run.
    pub fn changed(&self) -> &[PathBuf] {
        &self.changed
    }
}
