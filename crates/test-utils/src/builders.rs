#![allow(dead_code)]

use assetpipe::config::{
    ConfigFile, PathRoot, RawConfigFile, ReloadSection, SourceConfig, TaskConfig,
    TransformConfig, WatchRuleConfig,
};
use assetpipe::errors::Result;

/// Builder for `ConfigFile` to simplify test setup.
#[derive(Default)]
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_task(mut self, task: TaskConfig) -> Self {
        self.config.task.push(task);
        self
    }

    pub fn with_root(mut self, name: &str, src: &str, dest: &str) -> Self {
        self.config
            .paths
            .insert(name.to_string(), PathRoot::new(src, dest));
        self
    }

    pub fn with_watch(mut self, pattern: &str, tasks: &[&str]) -> Self {
        self.config.watch.push(WatchRuleConfig {
            pattern: pattern.to_string(),
            tasks: tasks.iter().map(|t| t.to_string()).collect(),
        });
        self
    }

    pub fn with_default_series(mut self, tasks: &[&str]) -> Self {
        self.config.pipeline.default = tasks.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn with_reload_cmd(mut self, cmd: &str) -> Self {
        self.config.reload = Some(ReloadSection {
            cmd: cmd.to_string(),
        });
        self
    }

    pub fn with_debounce_ms(mut self, ms: u64) -> Self {
        self.config.config.debounce_ms = ms;
        self
    }

    /// Validate, returning the error instead of panicking.
    pub fn try_build(self) -> Result<ConfigFile> {
        ConfigFile::try_from(self.config)
    }

    pub fn build(self) -> ConfigFile {
        self.try_build()
            .expect("Failed to build valid config from builder")
    }
}

/// Builder for `TaskConfig`.
pub struct TaskConfigBuilder {
    task: TaskConfig,
}

impl TaskConfigBuilder {
    /// A group task with no action of its own.
    pub fn new(name: &str) -> Self {
        Self {
            task: TaskConfig {
                name: name.to_string(),
                after: vec![],
                reload: None,
                sources: vec![],
                transform: None,
                clean: None,
                service: None,
            },
        }
    }

    pub fn after(mut self, dep: &str) -> Self {
        self.task.after.push(dep.to_string());
        self
    }

    pub fn source(mut self, root: &str, pattern: &str) -> Self {
        self.task.sources.push(SourceConfig {
            root: root.to_string(),
            pattern: pattern.to_string(),
        });
        self
    }

    pub fn transform(mut self, transform: TransformConfig) -> Self {
        self.task.transform = Some(transform);
        self
    }

    pub fn copy(self) -> Self {
        self.transform(TransformConfig::Copy)
    }

    pub fn clean(mut self, roots: &[&str]) -> Self {
        self.task.clean = Some(roots.iter().map(|r| r.to_string()).collect());
        self
    }

    pub fn service(mut self, cmd: &str) -> Self {
        self.task.service = Some(cmd.to_string());
        self
    }

    pub fn reload(mut self, val: bool) -> Self {
        self.task.reload = Some(val);
        self
    }

    pub fn build(self) -> TaskConfig {
        self.task
    }
}
