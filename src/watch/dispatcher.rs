// src/watch/dispatcher.rs

//! Maps changed paths to task triggers.

use std::path::Path;
use std::time::Instant;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::config::ConfigFile;
use crate::engine::RuntimeEvent;
use crate::errors::{AssetpipeError, Result};
use crate::types::{DebouncePolicy, TaskName, TriggerReason};
use crate::watch::debounce::Debouncer;
use crate::watch::path_utils::relative_str;
use crate::watch::patterns::WatchRule;

#[derive(Debug, Clone)]
pub struct WatchDispatcher {
    rules: Vec<WatchRule>,
    debouncer: Debouncer,
}

impl WatchDispatcher {
    pub fn new(rules: Vec<WatchRule>, policy: DebouncePolicy) -> Self {
        Self {
            rules,
            debouncer: Debouncer::new(policy),
        }
    }

    /// Compile the `[[watch]]` rules and `[config].debounce_ms` of a
    /// validated config.
    pub fn from_config(cfg: &ConfigFile) -> Result<Self> {
        let rules = cfg
            .watch_rules()
            .iter()
            .map(|r| {
                WatchRule::new(r.pattern.clone(), r.tasks.clone())
                    .map_err(|e| AssetpipeError::ConfigError(format!("{e:#}")))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(rules, cfg.config_section().debounce()))
    }

    pub fn rules(&self) -> &[WatchRule] {
        &self.rules
    }

    /// Tasks for `rel_path`: every matching rule in registration order,
    /// each contributing its tasks in declared order.
    pub fn match_path(&self, rel_path: &str) -> Vec<TaskName> {
        self.rules
            .iter()
            .filter(|rule| rule.matches(rel_path))
            .flat_map(|rule| rule.tasks().iter().cloned())
            .collect()
    }

    /// [`match_path`](Self::match_path) behind the debounce policy.
    pub fn dispatch(&mut self, rel_path: &str, now: Instant) -> Vec<TaskName> {
        let tasks = self.match_path(rel_path);
        if tasks.is_empty() {
            return tasks;
        }
        if !self.debouncer.admit(rel_path, now) {
            debug!(path = %rel_path, "debounced");
            return Vec::new();
        }
        tasks
    }

    /// Turn one changed absolute `path` under `root` into trigger events.
    ///
    /// Returns `false` once the runtime channel is closed.
    pub async fn handle_change(
        &mut self,
        root: &Path,
        path: &Path,
        runtime_tx: &mpsc::Sender<RuntimeEvent>,
    ) -> bool {
        let Some(rel) = relative_str(root, path) else {
            warn!(path = ?path, root = ?root, "could not relativize path");
            return true;
        };

        for task in self.dispatch(&rel, Instant::now()) {
            debug!(task = %task, path = %rel, "watch match -> triggering task");
            let event = RuntimeEvent::TaskTriggered {
                task,
                reason: TriggerReason::FileWatch,
            };
            if let Err(err) = runtime_tx.send(event).await {
                warn!("failed to send RuntimeEvent::TaskTriggered: {err}");
                return false;
            }
        }
        true
    }
}
