// src/exec/process.rs

//! Shell process helpers shared by the `command` transform, the reload
//! notifier and services.

use std::ffi::OsStr;
use std::process::Stdio;

use anyhow::{Context, Result};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

/// Build a shell command appropriate for the platform.
pub fn shell_command(cmd: &str) -> Command {
    if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(cmd);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(cmd);
        c
    }
}

/// Captured result of a filter process.
#[derive(Debug, Clone)]
pub struct FilterOutput {
    pub success: bool,
    pub code: i32,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

/// Run `cmd` with `input` on stdin and capture stdout/stderr.
///
/// Stdin is written from a separate task so a filter that streams output
/// before consuming all input cannot deadlock.
pub async fn run_filter<K, V>(cmd: &str, input: &[u8], envs: &[(K, V)]) -> Result<FilterOutput>
where
    K: AsRef<OsStr>,
    V: AsRef<OsStr>,
{
    let mut command = shell_command(cmd);
    for (k, v) in envs {
        command.env(k, v);
    }
    command
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = command
        .spawn()
        .with_context(|| format!("spawning `{cmd}`"))?;

    let writer = child.stdin.take().map(|mut stdin| {
        let input = input.to_vec();
        tokio::spawn(async move {
            // A filter may exit without reading its input; a broken pipe here
            // is reported through the exit status instead.
            if let Err(e) = stdin.write_all(&input).await {
                debug!(error = %e, "filter closed stdin early");
            }
        })
    });

    let output = child
        .wait_with_output()
        .await
        .with_context(|| format!("waiting for `{cmd}`"))?;

    if let Some(writer) = writer {
        let _ = writer.await;
    }

    Ok(FilterOutput {
        success: output.status.success(),
        code: output.status.code().unwrap_or(-1),
        stdout: output.stdout,
        stderr: output.stderr,
    })
}

/// Run `cmd` in `cwd` to completion and capture its output.
pub async fn run_to_completion(cmd: &str, cwd: &std::path::Path) -> Result<FilterOutput> {
    let output = shell_command(cmd)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .output()
        .await
        .with_context(|| format!("running `{cmd}`"))?;

    Ok(FilterOutput {
        success: output.status.success(),
        code: output.status.code().unwrap_or(-1),
        stdout: output.stdout,
        stderr: output.stderr,
    })
}
