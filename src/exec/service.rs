// src/exec/service.rs

//! Long-lived background commands (dev server, browser-sync proxy, ...).

use std::collections::HashMap;
use std::path::Path;
use std::process::Stdio;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Child;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::exec::process::shell_command;
use crate::types::TaskName;

/// Keeps at most one child process per service task.
///
/// Children are spawned with `kill_on_drop(true)`, so dropping the
/// supervisor (or calling [`ServiceSupervisor::shutdown`]) stops them.
#[derive(Debug, Default)]
pub struct ServiceSupervisor {
    children: Mutex<HashMap<TaskName, Child>>,
}

impl ServiceSupervisor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start `cmd` for `task` unless it is already running.
    ///
    /// Returns `true` if a new process was spawned.
    pub async fn ensure_started(&self, task: &str, cmd: &str, cwd: &Path) -> Result<bool> {
        let mut children = self.children.lock().await;

        if let Some(child) = children.get_mut(task) {
            match child.try_wait() {
                Ok(None) => {
                    debug!(task = %task, "service already running; nothing to do");
                    return Ok(false);
                }
                Ok(Some(status)) => {
                    warn!(task = %task, %status, "service exited earlier; restarting");
                }
                Err(e) => {
                    warn!(task = %task, error = %e, "could not poll service; restarting");
                }
            }
            children.remove(task);
        }

        let mut command = shell_command(cmd);
        command
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = command
            .spawn()
            .with_context(|| format!("spawning service `{cmd}`"))?;

        if let Some(stdout) = child.stdout.take() {
            forward_lines(task.to_string(), "stdout", stdout);
        }
        if let Some(stderr) = child.stderr.take() {
            forward_lines(task.to_string(), "stderr", stderr);
        }

        info!(task = %task, cmd = %cmd, pid = ?child.id(), "service started");
        children.insert(task.to_string(), child);
        Ok(true)
    }

    /// Names of services whose process is still alive.
    pub async fn running(&self) -> Vec<TaskName> {
        let mut children = self.children.lock().await;
        let mut names: Vec<TaskName> = children
            .iter_mut()
            .filter_map(|(name, child)| matches!(child.try_wait(), Ok(None)).then(|| name.clone()))
            .collect();
        names.sort();
        names
    }

    /// Kill every running service.
    pub async fn shutdown(&self) {
        let mut children = self.children.lock().await;
        for (name, mut child) in children.drain() {
            if let Err(e) = child.kill().await {
                warn!(task = %name, error = %e, "failed to stop service");
            } else {
                info!(task = %name, "service stopped");
            }
        }
    }
}

/// Relay a service's output into the log, one line per event.
fn forward_lines<R>(task: TaskName, stream: &'static str, reader: R)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            info!(task = %task, stream, "{}", line);
        }
    });
}
