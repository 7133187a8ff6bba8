// src/watch/patterns.rs

use std::fmt;

use anyhow::{Context, Result};
use globset::{Glob, GlobMatcher};

use crate::types::TaskName;

/// A glob over paths relative to the project root, bound to the tasks it
/// triggers.
#[derive(Clone)]
pub struct WatchRule {
    pattern: String,
    matcher: GlobMatcher,
    tasks: Vec<TaskName>,
}

impl fmt::Debug for WatchRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchRule")
            .field("pattern", &self.pattern)
            .field("tasks", &self.tasks)
            .finish()
    }
}

impl WatchRule {
    pub fn new(pattern: impl Into<String>, tasks: Vec<TaskName>) -> Result<Self> {
        let pattern = pattern.into();
        let matcher = Glob::new(&pattern)
            .with_context(|| format!("invalid glob pattern: {pattern}"))?
            .compile_matcher();
        Ok(Self {
            pattern,
            matcher,
            tasks,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Tasks to run on a match, in declared order.
    pub fn tasks(&self) -> &[TaskName] {
        &self.tasks
    }

    /// `rel_path` uses forward slashes. `*` also crosses directory
    /// separators, so `*.scss` matches `src/assets/scss/style.scss`.
    pub fn matches(&self, rel_path: &str) -> bool {
        self.matcher.is_match(rel_path)
    }
}
