// src/dag/task.rs

//! Task definitions held by the registry.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use globset::{Glob, GlobBuilder, GlobMatcher};

use crate::transform::Transform;
use crate::types::TaskName;

/// A named unit of work.
#[derive(Debug, Clone)]
pub struct Task {
    pub(crate) name: TaskName,
    pub(crate) predecessors: Vec<TaskName>,
    pub(crate) action: TaskAction,
    /// Registration order; stable tie-breaker for diagnostics.
    pub(crate) index: usize,
}

impl Task {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Predecessors in declared order, without duplicates.
    pub fn predecessors(&self) -> &[TaskName] {
        &self.predecessors
    }

    pub fn action(&self) -> &TaskAction {
        &self.action
    }

    pub fn index(&self) -> usize {
        self.index
    }
}

/// What a task does when it runs.
#[derive(Clone)]
pub enum TaskAction {
    /// Nothing of its own; only orders its predecessors.
    Group,
    /// Read sources, transform, write to each source's destination.
    Pipeline {
        sources: Vec<TaskSource>,
        transform: Arc<dyn Transform>,
        reload: bool,
    },
    /// Remove these directories.
    Clean { targets: Vec<PathBuf> },
    /// Start a long-lived command, once.
    Service { cmd: String, cwd: PathBuf },
}

impl TaskAction {
    /// Short label for logs and dry-run output.
    pub fn kind(&self) -> &str {
        match self {
            TaskAction::Group => "group",
            TaskAction::Pipeline { transform, .. } => transform.name(),
            TaskAction::Clean { .. } => "clean",
            TaskAction::Service { .. } => "service",
        }
    }
}

impl fmt::Debug for TaskAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskAction::Group => f.write_str("Group"),
            TaskAction::Pipeline {
                sources,
                transform,
                reload,
            } => f
                .debug_struct("Pipeline")
                .field("sources", sources)
                .field("transform", &transform.name())
                .field("reload", reload)
                .finish(),
            TaskAction::Clean { targets } => {
                f.debug_struct("Clean").field("targets", targets).finish()
            }
            TaskAction::Service { cmd, cwd } => f
                .debug_struct("Service")
                .field("cmd", cmd)
                .field("cwd", cwd)
                .finish(),
        }
    }
}

/// A glob over one source directory, plus where its outputs go.
#[derive(Clone)]
pub struct TaskSource {
    src_dir: PathBuf,
    pattern: String,
    matcher: GlobMatcher,
    dest_dir: PathBuf,
}

impl fmt::Debug for TaskSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskSource")
            .field("src_dir", &self.src_dir)
            .field("pattern", &self.pattern)
            .field("dest_dir", &self.dest_dir)
            .finish()
    }
}

impl TaskSource {
    pub fn new(
        src_dir: impl Into<PathBuf>,
        pattern: impl Into<String>,
        dest_dir: impl Into<PathBuf>,
    ) -> Result<Self> {
        let pattern = pattern.into();
        let matcher = source_glob(&pattern)
            .with_context(|| format!("invalid glob pattern: {pattern}"))?
            .compile_matcher();
        Ok(Self {
            src_dir: src_dir.into(),
            pattern,
            matcher,
            dest_dir: dest_dir.into(),
        })
    }

    pub fn src_dir(&self) -> &Path {
        &self.src_dir
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn dest_dir(&self) -> &Path {
        &self.dest_dir
    }

    /// `rel_path` is relative to `src_dir`, with forward slashes. `*` stays
    /// within one directory; use `**` to descend.
    pub fn matches(&self, rel_path: &str) -> bool {
        self.matcher.is_match(rel_path)
    }
}

/// Compile a source pattern. Unlike watch rules, `*` does not match `/`.
pub fn source_glob(pattern: &str) -> std::result::Result<Glob, globset::Error> {
    GlobBuilder::new(pattern).literal_separator(true).build()
}
