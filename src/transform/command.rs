// src/transform/command.rs

use tracing::debug;

use super::{BoxFuture, OutputFile, Transform, TransformError, TransformInput};
use crate::exec::process::run_filter;

/// Environment variable holding the path of the file being filtered.
pub const FILE_ENV: &str = "ASSETPIPE_FILE";

/// External filter plugin: each input is piped through `cmd`, stdout is the
/// output.
///
/// Inputs are processed one at a time, in order. The first non-zero exit
/// fails the whole transform.
#[derive(Debug, Clone)]
pub struct CommandTransform {
    cmd: String,
    extension: Option<String>,
}

impl CommandTransform {
    pub fn new(cmd: impl Into<String>, extension: Option<String>) -> Self {
        Self {
            cmd: cmd.into(),
            extension,
        }
    }
}

impl Transform for CommandTransform {
    fn name(&self) -> &str {
        "command"
    }

    fn apply(
        &self,
        input: TransformInput,
    ) -> BoxFuture<'_, Result<Vec<OutputFile>, TransformError>> {
        Box::pin(async move {
            let mut outputs = Vec::with_capacity(input.files.len());

            for file in input.files {
                debug!(cmd = %self.cmd, file = ?file.path, "running filter");
                let out = run_filter(
                    &self.cmd,
                    &file.contents,
                    &[(FILE_ENV, file.path.as_os_str())],
                )
                .await?;

                if !out.success {
                    return Err(TransformError::Command {
                        cmd: self.cmd.clone(),
                        file: file.path,
                        code: out.code,
                        stderr: String::from_utf8_lossy(&out.stderr).trim().to_string(),
                    });
                }

                let mut rel_path = file.rel_path;
                if let Some(ext) = &self.extension {
                    rel_path.set_extension(ext);
                }
                outputs.push(OutputFile {
                    rel_path,
                    contents: out.stdout,
                });
            }

            Ok(outputs)
        })
    }
}
