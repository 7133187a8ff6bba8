// src/config/model.rs

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;

use crate::types::{DebouncePolicy, TaskName};

/// Top-level configuration as read from a TOML file, before validation.
///
/// ```toml
/// [config]
/// debounce_ms = 0
///
/// [paths.style]
/// src = "src/assets/scss"
/// dest = "dist/assets/css"
///
/// [pipeline]
/// default = ["clean", "scss:compile"]
///
/// [[task]]
/// name = "scss:compile"
/// sources = [{ root = "style", pattern = "*.scss" }]
/// transform = { kind = "command", cmd = "sass --stdin", extension = "css" }
///
/// [[watch]]
/// pattern = "src/assets/scss/**/*.scss"
/// tasks = ["scss:compile"]
/// ```
///
/// Tasks are an array of tables so that declaration order survives
/// deserialization; it is the scheduler's tie-breaker.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawConfigFile {
    #[serde(default)]
    pub config: ConfigSection,

    /// Named logical roots. Standard roots missing here fall back to
    /// [`default_roots`].
    #[serde(default)]
    pub paths: BTreeMap<String, PathRoot>,

    #[serde(default)]
    pub pipeline: PipelineSection,

    #[serde(default)]
    pub reload: Option<ReloadSection>,

    #[serde(default)]
    pub task: Vec<TaskConfig>,

    #[serde(default)]
    pub watch: Vec<WatchRuleConfig>,
}

/// Validated configuration. Only constructible through
/// `ConfigFile::try_from(RawConfigFile)`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    config: ConfigSection,
    paths: BTreeMap<String, PathRoot>,
    pipeline: PipelineSection,
    reload: Option<ReloadSection>,
    task: Vec<TaskConfig>,
    watch: Vec<WatchRuleConfig>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(raw: RawConfigFile) -> Self {
        Self {
            config: raw.config,
            paths: merge_with_default_roots(raw.paths),
            pipeline: raw.pipeline,
            reload: raw.reload,
            task: raw.task,
            watch: raw.watch,
        }
    }

    pub fn config_section(&self) -> &ConfigSection {
        &self.config
    }

    /// All roots, including defaulted ones.
    pub fn paths(&self) -> &BTreeMap<String, PathRoot> {
        &self.paths
    }

    pub fn root(&self, name: &str) -> Option<&PathRoot> {
        self.paths.get(name)
    }

    pub fn pipeline(&self) -> &PipelineSection {
        &self.pipeline
    }

    pub fn reload(&self) -> Option<&ReloadSection> {
        self.reload.as_ref()
    }

    /// Tasks in declaration order.
    pub fn tasks(&self) -> &[TaskConfig] {
        &self.task
    }

    pub fn task(&self, name: &str) -> Option<&TaskConfig> {
        self.task.iter().find(|t| t.name == name)
    }

    /// Watch rules in declaration order.
    pub fn watch_rules(&self) -> &[WatchRuleConfig] {
        &self.watch
    }
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ConfigSection {
    /// Per-path debounce window for watch notifications, in milliseconds.
    ///
    /// `0` (default) treats every notification as an independent trigger.
    #[serde(default)]
    pub debounce_ms: u64,
}

impl ConfigSection {
    pub fn debounce(&self) -> DebouncePolicy {
        DebouncePolicy {
            window_ms: self.debounce_ms,
        }
    }
}

/// Source/destination directory pair, relative to the project root.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PathRoot {
    pub src: PathBuf,
    pub dest: PathBuf,
}

impl PathRoot {
    pub fn new(src: impl Into<PathBuf>, dest: impl Into<PathBuf>) -> Self {
        Self {
            src: src.into(),
            dest: dest.into(),
        }
    }
}

/// The standard roots of an asset tree.
pub fn default_roots() -> BTreeMap<String, PathRoot> {
    [
        ("index", "src", "dist"),
        ("html", "src/html", "dist/html"),
        ("fonts", "src/assets/font", "dist/assets/font"),
        ("images", "src/assets/images", "dist/assets/images"),
        ("style", "src/assets/scss", "dist/assets/css"),
        ("script", "src/assets/js", "dist/assets/js"),
        ("lib", "src/assets/lib", "dist/assets/lib"),
    ]
    .into_iter()
    .map(|(name, src, dest)| (name.to_string(), PathRoot::new(src, dest)))
    .collect()
}

fn merge_with_default_roots(configured: BTreeMap<String, PathRoot>) -> BTreeMap<String, PathRoot> {
    let mut roots = default_roots();
    roots.extend(configured);
    roots
}

/// `[pipeline]` section.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct PipelineSection {
    /// Series run by a plain `assetpipe` invocation.
    #[serde(default)]
    pub default: Vec<TaskName>,
}

/// `[reload]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ReloadSection {
    /// Shell command run after each task that changed outputs. `{paths}` is
    /// replaced by the space-separated changed paths.
    pub cmd: String,
}

/// One `[[task]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskConfig {
    pub name: TaskName,

    /// Predecessors, run in this order before the task.
    #[serde(default)]
    pub after: Vec<TaskName>,

    /// Whether changed outputs are reported to the live-reload notifier.
    /// Defaults to `true`.
    #[serde(default)]
    pub reload: Option<bool>,

    /// File sets fed to `transform`.
    #[serde(default)]
    pub sources: Vec<SourceConfig>,

    #[serde(default)]
    pub transform: Option<TransformConfig>,

    /// Roots whose destination directories are removed.
    #[serde(default)]
    pub clean: Option<Vec<String>>,

    /// Long-lived background command.
    #[serde(default)]
    pub service: Option<String>,
}

impl TaskConfig {
    pub fn effective_reload(&self) -> bool {
        self.reload.unwrap_or(true)
    }
}

/// `{ root = "style", pattern = "*.scss" }`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SourceConfig {
    pub root: String,
    pub pattern: String,
}

/// Transform plugin selection.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransformConfig {
    Copy,
    Concat {
        output: String,
        #[serde(default = "default_separator")]
        separator: String,
    },
    Include {
        #[serde(default = "default_include_prefix")]
        prefix: String,
        #[serde(default = "default_include_basepath")]
        basepath: String,
    },
    Command {
        cmd: String,
        #[serde(default)]
        extension: Option<String>,
    },
}

fn default_separator() -> String {
    "\n".to_string()
}

fn default_include_prefix() -> String {
    "@@".to_string()
}

fn default_include_basepath() -> String {
    "@file".to_string()
}

/// One `[[watch]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WatchRuleConfig {
    /// Glob relative to the project root.
    pub pattern: String,
    pub tasks: Vec<TaskName>,
}
