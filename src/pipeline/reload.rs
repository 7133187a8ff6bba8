// src/pipeline/reload.rs

//! Live-reload notification.
//!
//! After a pipeline task with reload enabled writes new outputs, the runner
//! hands the changed paths to a [`ReloadNotifier`]. The browser side of live
//! reload belongs to whatever external tool the command invokes.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Result, bail};
use tracing::{debug, info};

use crate::config::ReloadSection;
use crate::exec::run_to_completion;
use crate::types::BoxFuture;
use crate::watch::path_utils::relative_str;

/// Placeholder replaced by the changed paths in a reload command.
pub const PATHS_PLACEHOLDER: &str = "{paths}";

pub trait ReloadNotifier: Send + Sync + fmt::Debug {
    /// Signal that `task` changed `paths`. Never called with an empty list.
    fn notify<'a>(&'a self, task: &'a str, paths: &'a [PathBuf]) -> BoxFuture<'a, Result<()>>;
}

/// Logs the changed paths and does nothing else.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

impl ReloadNotifier for LogNotifier {
    fn notify<'a>(&'a self, task: &'a str, paths: &'a [PathBuf]) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            info!(task = %task, count = paths.len(), ?paths, "reload");
            Ok(())
        })
    }
}

/// Runs a shell command, e.g. `browser-sync reload --files {paths}`.
#[derive(Debug, Clone)]
pub struct CommandNotifier {
    cmd: String,
    cwd: PathBuf,
}

impl CommandNotifier {
    pub fn new(cmd: impl Into<String>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            cmd: cmd.into(),
            cwd: cwd.into(),
        }
    }

    /// The command line for `paths`: each path relative to the working
    /// directory when possible, quoted if it contains whitespace.
    pub fn render(&self, paths: &[PathBuf]) -> String {
        let joined = paths
            .iter()
            .map(|p| quote(&display_path(&self.cwd, p)))
            .collect::<Vec<_>>()
            .join(" ");
        self.cmd.replace(PATHS_PLACEHOLDER, &joined)
    }
}

impl ReloadNotifier for CommandNotifier {
    fn notify<'a>(&'a self, task: &'a str, paths: &'a [PathBuf]) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let cmd = self.render(paths);
            debug!(task = %task, cmd = %cmd, "running reload command");
            let out = run_to_completion(&cmd, &self.cwd).await?;
            if !out.success {
                bail!(
                    "reload command `{cmd}` exited with code {}: {}",
                    out.code,
                    String::from_utf8_lossy(&out.stderr).trim()
                );
            }
            Ok(())
        })
    }
}

/// `CommandNotifier` when `[reload]` is configured, `LogNotifier` otherwise.
pub fn notifier_from_config(
    reload: Option<&ReloadSection>,
    project_root: &Path,
) -> Arc<dyn ReloadNotifier> {
    match reload {
        Some(section) => Arc::new(CommandNotifier::new(section.cmd.clone(), project_root)),
        None => Arc::new(LogNotifier),
    }
}

fn display_path(cwd: &Path, path: &Path) -> String {
    relative_str(cwd, path).unwrap_or_else(|| path.to_string_lossy().into_owned())
}

fn quote(s: &str) -> String {
    if s.chars().any(char::is_whitespace) {
        format!("'{}'", s.replace('\'', r"'\''"))
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_substitutes_relative_paths() {
        let n = CommandNotifier::new("browser-sync reload --files {paths}", "/proj");
        let cmd = n.render(&[
            PathBuf::from("/proj/dist/assets/css/style.css"),
            PathBuf::from("/proj/dist/html/my page.html"),
        ]);
        assert_eq!(
            cmd,
            "browser-sync reload --files dist/assets/css/style.css 'dist/html/my page.html'"
        );
    }

    #[test]
    fn command_without_placeholder_is_unchanged() {
        let n = CommandNotifier::new("touch .reload", "/proj");
        assert_eq!(n.render(&[PathBuf::from("/proj/a")]), "touch .reload");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failing_reload_command_is_an_error() {
        let dir = std::env::temp_dir();
        let n = CommandNotifier::new("exit 4", dir);
        let err = n.notify("html", &[PathBuf::from("a.html")]).await.unwrap_err();
        assert!(err.to_string().contains("exited with code 4"));
    }
}
