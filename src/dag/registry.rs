// src/dag/registry.rs

//! Task registry: the leaf layer holding named tasks and their predecessor
//! lists.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::{ConfigFile, TaskConfig};
use crate::dag::task::{Task, TaskAction, TaskSource};
use crate::errors::{AssetpipeError, Result};
use crate::fs::FileSystem;
use crate::transform::build_transform;
use crate::types::TaskName;

/// Named tasks in registration order.
///
/// Predecessors must be registered before their dependents, so a registry
/// built through [`Registry::register`] is acyclic by construction.
#[derive(Debug, Default, Clone)]
pub struct Registry {
    tasks: Vec<Arc<Task>>,
    by_name: HashMap<TaskName, usize>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a task.
    ///
    /// Fails with `DuplicateTask` if `name` exists or `UnknownPredecessor` if
    /// a predecessor is not registered yet. A predecessor listed twice is kept
    /// once.
    pub fn register(
        &mut self,
        name: impl Into<TaskName>,
        predecessors: Vec<TaskName>,
        action: TaskAction,
    ) -> Result<Arc<Task>> {
        let name = name.into();
        if self.by_name.contains_key(&name) {
            return Err(AssetpipeError::DuplicateTask(name));
        }

        let mut seen = HashSet::new();
        let mut unique = Vec::with_capacity(predecessors.len());
        for pred in predecessors {
            if !self.by_name.contains_key(&pred) {
                return Err(AssetpipeError::UnknownPredecessor {
                    task: name,
                    predecessor: pred,
                });
            }
            if seen.insert(pred.clone()) {
                unique.push(pred);
            } else {
                warn!(task = %name, predecessor = %pred, "duplicate predecessor ignored");
            }
        }

        let task = Arc::new(Task {
            name: name.clone(),
            predecessors: unique,
            action,
            index: self.tasks.len(),
        });

        debug!(task = %name, kind = task.action.kind(), "registered task");
        self.by_name.insert(name, self.tasks.len());
        self.tasks.push(Arc::clone(&task));
        Ok(task)
    }

    /// Look up a task by name.
    pub fn resolve(&self, name: &str) -> Result<Arc<Task>> {
        self.get(name)
            .cloned()
            .ok_or_else(|| AssetpipeError::TaskNotFound(name.to_string()))
    }

    pub fn get(&self, name: &str) -> Option<&Arc<Task>> {
        self.by_name.get(name).map(|&i| &self.tasks[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Tasks in registration order.
    pub fn tasks(&self) -> impl Iterator<Item = &Arc<Task>> {
        self.tasks.iter()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Build a registry from a validated config.
    ///
    /// The config may reference tasks declared further down, so tasks are
    /// registered in a stable topological order: repeatedly the first
    /// declared task whose predecessors are all registered.
    pub fn from_config(cfg: &ConfigFile, project_root: &Path, fs: Arc<dyn FileSystem>) -> Result<Self> {
        let mut registry = Registry::new();
        let mut pending: Vec<&TaskConfig> = cfg.tasks().iter().collect();

        while !pending.is_empty() {
            let ready = pending
                .iter()
                .position(|t| t.after.iter().all(|dep| registry.contains(dep)));

            let Some(pos) = ready else {
                // Unreachable for a validated config; report what is stuck.
                return Err(AssetpipeError::DagCycle {
                    members: pending.iter().map(|t| t.name.clone()).collect(),
                });
            };

            let tc = pending.remove(pos);
            let action = build_action(cfg, tc, project_root, Arc::clone(&fs))?;
            registry.register(tc.name.clone(), tc.after.clone(), action)?;
        }

        Ok(registry)
    }

    /// Insert a task without checking predecessors. Lets tests build graphs
    /// the public API refuses, such as cycles.
    #[cfg(test)]
    pub(crate) fn insert_unchecked(&mut self, name: &str, predecessors: &[&str]) {
        let task = Arc::new(Task {
            name: name.to_string(),
            predecessors: predecessors.iter().map(|p| p.to_string()).collect(),
            action: TaskAction::Group,
            index: self.tasks.len(),
        });
        self.by_name.insert(name.to_string(), self.tasks.len());
        self.tasks.push(task);
    }
}

fn build_action(
    cfg: &ConfigFile,
    tc: &TaskConfig,
    project_root: &Path,
    fs: Arc<dyn FileSystem>,
) -> Result<TaskAction> {
    let missing_root = |root: &str| {
        AssetpipeError::ConfigError(format!("task '{}': unknown root '{root}'", tc.name))
    };

    if let Some(transform) = &tc.transform {
        let mut sources = Vec::with_capacity(tc.sources.len());
        for source in tc.sources.iter() {
            let root = cfg.root(&source.root).ok_or_else(|| missing_root(&source.root))?;
            let task_source = TaskSource::new(
                project_root.join(&root.src),
                source.pattern.clone(),
                project_root.join(&root.dest),
            )
            .map_err(|e| AssetpipeError::ConfigError(format!("task '{}': {e:#}", tc.name)))?;
            sources.push(task_source);
        }

        return Ok(TaskAction::Pipeline {
            sources,
            transform: build_transform(transform, project_root, fs)?,
            reload: tc.effective_reload(),
        });
    }

    if let Some(roots) = &tc.clean {
        let mut targets = Vec::with_capacity(roots.len());
        for name in roots {
            let root = cfg.root(name).ok_or_else(|| missing_root(name))?;
            targets.push(project_root.join(&root.dest));
        }
        return Ok(TaskAction::Clean { targets });
    }

    if let Some(cmd) = &tc.service {
        return Ok(TaskAction::Service {
            cmd: cmd.clone(),
            cwd: project_root.to_path_buf(),
        });
    }

    Ok(TaskAction::Group)
}
