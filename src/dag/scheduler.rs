// src/dag/scheduler.rs

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::dag::context::RunContext;
use crate::dag::executor::TaskExecutor;
use crate::dag::registry::Registry;
use crate::dag::task::Task;
use crate::errors::{AssetpipeError, Result};
use crate::types::TaskName;

/// Resolves task names into execution orders and runs them.
///
/// Within one run tasks execute strictly one after another; each task's
/// future is awaited before the next one starts. Separate runs share nothing
/// but the registry and executor, so they may proceed concurrently.
pub struct Scheduler {
    registry: Arc<Registry>,
    executor: Arc<dyn TaskExecutor>,
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("tasks", &self.registry.len())
            .finish_non_exhaustive()
    }
}

impl Scheduler {
    pub fn new(registry: Arc<Registry>, executor: Arc<dyn TaskExecutor>) -> Self {
        Self { registry, executor }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Linearize `name` and its transitive predecessors.
    pub fn plan(&self, name: &str) -> Result<Vec<Arc<Task>>> {
        plan(&self.registry, name)
    }

    /// Run `name` with a fresh [`RunContext`].
    pub async fn run(&self, name: &str) -> Result<RunContext> {
        let mut ctx = RunContext::new();
        self.run_in(name, &mut ctx).await?;
        Ok(ctx)
    }

    /// Run `name`, skipping tasks `ctx` already completed.
    ///
    /// The first failing task aborts the run; nothing after it executes.
    pub async fn run_in(&self, name: &str, ctx: &mut RunContext) -> Result<()> {
        let order = self.plan(name)?;
        let names: Vec<&str> = order.iter().map(|t| t.name()).collect();
        debug!(target_task = %name, plan = ?names, "resolved plan");

        for task in order.iter() {
            if ctx.is_completed(task.name()) {
                debug!(task = %task.name(), "already completed in this run; skipping");
                continue;
            }

            info!(task = %task.name(), kind = task.action().kind(), "running task");
            match self.executor.execute_task(task).await {
                Ok(report) => {
                    info!(
                        task = %task.name(),
                        changed = report.changed.len(),
                        "task finished"
                    );
                    ctx.mark_completed(task.name(), report.changed);
                }
                Err(err) => {
                    error!(task = %task.name(), error = %err, "task failed; aborting run");
                    return Err(err);
                }
            }
        }

        Ok(())
    }

    /// Run each name of a series in order, sharing one [`RunContext`].
    ///
    /// A name that appears again later in the series is skipped with a
    /// warning.
    pub async fn run_series(&self, names: &[TaskName]) -> Result<RunContext> {
        // Resolve every plan up front so configuration errors surface before
        // any task runs.
        for name in names {
            self.plan(name)?;
        }

        let mut ctx = RunContext::new();
        for name in names {
            if !ctx.mark_requested(name) {
                warn!(task = %name, "task listed again in series; ignoring repeat");
                continue;
            }
            self.run_in(name, &mut ctx).await?;
        }
        Ok(ctx)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Done,
}

/// Depth-first post-order over declared predecessors.
///
/// Every predecessor lands before its dependent, each task once, and
/// predecessors of one task keep their declared order. Reaching a task that
/// is still being visited means a cycle; its members are reported and no
/// order is returned.
pub fn plan(registry: &Registry, name: &str) -> Result<Vec<Arc<Task>>> {
    let mut marks: HashMap<TaskName, Mark> = HashMap::new();
    let mut path: Vec<TaskName> = Vec::new();
    let mut order = Vec::new();
    visit(registry, name, &mut marks, &mut path, &mut order)?;
    Ok(order)
}

fn visit(
    registry: &Registry,
    name: &str,
    marks: &mut HashMap<TaskName, Mark>,
    path: &mut Vec<TaskName>,
    order: &mut Vec<Arc<Task>>,
) -> Result<()> {
    match marks.get(name) {
        Some(Mark::Done) => return Ok(()),
        Some(Mark::Visiting) => {
            let start = path.iter().position(|n| n == name).unwrap_or(0);
            return Err(AssetpipeError::DagCycle {
                members: path[start..].to_vec(),
            });
        }
        None => {}
    }

    let task = registry.resolve(name)?;
    marks.insert(name.to_string(), Mark::Visiting);
    path.push(name.to_string());

    for pred in task.predecessors() {
        visit(registry, pred, marks, path, order)?;
    }

    path.pop();
    marks.insert(name.to_string(), Mark::Done);
    order.push(task);
    Ok(())
}
