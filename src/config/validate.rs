// src/config/validate.rs

use std::collections::{HashMap, HashSet};

use globset::Glob;
use petgraph::algo::{tarjan_scc, toposort};
use petgraph::graphmap::DiGraphMap;
use tracing::warn;

use crate::config::model::{ConfigFile, RawConfigFile, TaskConfig, default_roots};
use crate::dag::task::source_glob;
use crate::errors::{AssetpipeError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = AssetpipeError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_tasks(cfg)?;
    validate_unique_names(cfg)?;
    validate_task_dependencies(cfg)?;
    validate_dag(cfg)?;
    validate_task_actions(cfg)?;
    validate_watch_rules(cfg)?;
    validate_pipeline(cfg)?;
    Ok(())
}

fn ensure_has_tasks(cfg: &RawConfigFile) -> Result<()> {
    if cfg.task.is_empty() {
        return Err(AssetpipeError::ConfigError(
            "config must contain at least one [[task]] entry".to_string(),
        ));
    }
    Ok(())
}

fn validate_unique_names(cfg: &RawConfigFile) -> Result<()> {
    let mut seen = HashSet::new();
    for task in cfg.task.iter() {
        if task.name.trim().is_empty() {
            return Err(AssetpipeError::ConfigError(
                "task names must not be empty".to_string(),
            ));
        }
        if !seen.insert(task.name.as_str()) {
            return Err(AssetpipeError::DuplicateTask(task.name.clone()));
        }
    }
    Ok(())
}

fn validate_task_dependencies(cfg: &RawConfigFile) -> Result<()> {
    let names: HashSet<&str> = cfg.task.iter().map(|t| t.name.as_str()).collect();
    for task in cfg.task.iter() {
        for dep in task.after.iter() {
            if !names.contains(dep.as_str()) {
                return Err(AssetpipeError::UnknownPredecessor {
                    task: task.name.clone(),
                    predecessor: dep.clone(),
                });
            }
        }
    }
    Ok(())
}

fn validate_dag(cfg: &RawConfigFile) -> Result<()> {
    // Edge direction: dep -> task. For
    //   [[task]]
    //   name = "B"
    //   after = ["A"]
    // we add edge A -> B.
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for task in cfg.task.iter() {
        graph.add_node(task.name.as_str());
    }

    for task in cfg.task.iter() {
        for dep in task.after.iter() {
            graph.add_edge(dep.as_str(), task.name.as_str(), ());
        }
    }

    let cycle = match toposort(&graph, None) {
        Ok(_order) => return Ok(()),
        Err(cycle) => cycle.node_id(),
    };

    // Report the whole strongly connected component the offending node
    // belongs to, in declaration order.
    let declared: HashMap<&str, usize> = cfg
        .task
        .iter()
        .enumerate()
        .map(|(i, t)| (t.name.as_str(), i))
        .collect();

    let mut members: Vec<&str> = tarjan_scc(&graph)
        .into_iter()
        .find(|scc| scc.contains(&cycle))
        .unwrap_or_else(|| vec![cycle]);
    members.sort_by_key(|name| declared.get(name).copied().unwrap_or(usize::MAX));

    Err(AssetpipeError::DagCycle {
        members: members.into_iter().map(str::to_string).collect(),
    })
}

fn validate_task_actions(cfg: &RawConfigFile) -> Result<()> {
    let mut known_roots: HashSet<&str> = cfg.paths.keys().map(String::as_str).collect();
    let defaults = default_roots();
    known_roots.extend(defaults.keys().map(String::as_str));

    for task in cfg.task.iter() {
        let actions = [
            task.transform.is_some(),
            task.clean.is_some(),
            task.service.is_some(),
        ]
        .into_iter()
        .filter(|set| *set)
        .count();

        if actions > 1 {
            return Err(task_error(
                task,
                "only one of `transform`, `clean` or `service` may be set",
            ));
        }

        match (&task.transform, task.sources.is_empty()) {
            (Some(_), true) => {
                return Err(task_error(task, "`transform` requires at least one source"));
            }
            (None, false) => {
                return Err(task_error(task, "`sources` require a `transform`"));
            }
            _ => {}
        }

        for source in task.sources.iter() {
            if !known_roots.contains(source.root.as_str()) {
                return Err(task_error(
                    task,
                    &format!("source refers to unknown root '{}'", source.root),
                ));
            }
            source_glob(&source.pattern).map_err(|e| {
                task_error(task, &format!("invalid source pattern '{}': {e}", source.pattern))
            })?;
        }

        if let Some(roots) = &task.clean {
            for root in roots {
                if !known_roots.contains(root.as_str()) {
                    return Err(task_error(
                        task,
                        &format!("`clean` refers to unknown root '{root}'"),
                    ));
                }
            }
        }

        if let Some(cmd) = &task.service {
            if cmd.trim().is_empty() {
                return Err(task_error(task, "`service` command must not be empty"));
            }
        }

        if task.after.len() != task.after.iter().collect::<HashSet<_>>().len() {
            warn!(
                task = %task.name,
                "task lists the same predecessor more than once; extra entries are ignored"
            );
        }
    }

    Ok(())
}

fn validate_watch_rules(cfg: &RawConfigFile) -> Result<()> {
    for rule in cfg.watch.iter() {
        Glob::new(&rule.pattern).map_err(|e| {
            AssetpipeError::ConfigError(format!("invalid watch pattern '{}': {e}", rule.pattern))
        })?;
        if rule.tasks.is_empty() {
            return Err(AssetpipeError::ConfigError(format!(
                "watch rule '{}' lists no tasks",
                rule.pattern
            )));
        }
        for name in rule.tasks.iter() {
            if !cfg.task.iter().any(|t| &t.name == name) {
                return Err(AssetpipeError::TaskNotFound(name.clone()));
            }
        }
    }
    Ok(())
}

fn validate_pipeline(cfg: &RawConfigFile) -> Result<()> {
    for name in cfg.pipeline.default.iter() {
        if !cfg.task.iter().any(|t| &t.name == name) {
            return Err(AssetpipeError::TaskNotFound(name.clone()));
        }
    }
    Ok(())
}

fn task_error(task: &TaskConfig, msg: &str) -> AssetpipeError {
    AssetpipeError::ConfigError(format!("task '{}': {msg}", task.name))
}
