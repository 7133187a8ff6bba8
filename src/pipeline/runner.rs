// src/pipeline/runner.rs

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use anyhow::anyhow;
use tracing::{debug, info, warn};

use crate::dag::{Task, TaskAction, TaskExecutor, TaskReport, TaskSource};
use crate::errors::{AssetpipeError, Result};
use crate::exec::ServiceSupervisor;
use crate::fs::FileSystem;
use crate::pipeline::hash::{content_hash, file_hash};
use crate::pipeline::reload::ReloadNotifier;
use crate::pipeline::source::collect_source_files;
use crate::transform::{OutputFile, Transform, TransformError, TransformInput};
use crate::types::BoxFuture;

/// An output computed but not yet written.
#[derive(Debug)]
struct Staged {
    dest: PathBuf,
    contents: Vec<u8>,
}

/// Executes task actions against a filesystem.
#[derive(Debug)]
pub struct PipelineRunner {
    fs: Arc<dyn FileSystem>,
    notifier: Arc<dyn ReloadNotifier>,
    services: Arc<ServiceSupervisor>,
}

impl PipelineRunner {
    pub fn new(
        fs: Arc<dyn FileSystem>,
        notifier: Arc<dyn ReloadNotifier>,
        services: Arc<ServiceSupervisor>,
    ) -> Self {
        Self {
            fs,
            notifier,
            services,
        }
    }

    /// Run a single source of a pipeline task: read, transform, write, then
    /// notify if the task has reload enabled.
    pub async fn execute(&self, task: &Task, source: &TaskSource) -> Result<TaskReport> {
        let TaskAction::Pipeline {
            transform, reload, ..
        } = task.action()
        else {
            return Err(AssetpipeError::Other(anyhow!(
                "task '{}' is a {} task, not a pipeline",
                task.name(),
                task.action().kind()
            )));
        };

        let staged = self.stage(task.name(), transform.as_ref(), source).await?;
        let changed = self.commit(task.name(), staged)?;
        self.notify(task.name(), *reload, &changed).await;
        Ok(TaskReport { changed })
    }

    /// Run whatever `task` does.
    ///
    /// Pipeline tasks stage every source before the first write, so a
    /// transform failure in any source leaves all destinations untouched.
    pub async fn run_task(&self, task: &Task) -> Result<TaskReport> {
        match task.action() {
            TaskAction::Group => Ok(TaskReport::default()),
            TaskAction::Pipeline {
                sources,
                transform,
                reload,
            } => {
                let mut staged = Vec::new();
                for source in sources {
                    staged.extend(self.stage(task.name(), transform.as_ref(), source).await?);
                }
                let changed = self.commit(task.name(), staged)?;
                self.notify(task.name(), *reload, &changed).await;
                Ok(TaskReport { changed })
            }
            TaskAction::Clean { targets } => self.clean(task.name(), targets),
            TaskAction::Service { cmd, cwd } => {
                self.services
                    .ensure_started(task.name(), cmd, cwd)
                    .await
                    .map_err(|source| AssetpipeError::Service {
                        task: task.name().to_string(),
                        source,
                    })?;
                Ok(TaskReport::default())
            }
        }
    }

    async fn stage(
        &self,
        task: &str,
        transform: &dyn Transform,
        source: &TaskSource,
    ) -> Result<Vec<Staged>> {
        let files = collect_source_files(self.fs.as_ref(), source).map_err(|source| {
            AssetpipeError::Filesystem {
                task: task.to_string(),
                source,
            }
        })?;

        if files.is_empty() {
            debug!(task = %task, pattern = %source.pattern(), "no matching source files");
        }

        let input = TransformInput {
            root: source.src_dir().to_path_buf(),
            files,
        };

        let outputs = transform
            .apply(input)
            .await
            .map_err(|source| AssetpipeError::Transform {
                task: task.to_string(),
                source,
            })?;

        outputs
            .into_iter()
            .map(|out| {
                let dest = dest_path(source.dest_dir(), &out).map_err(|source| {
                    AssetpipeError::Transform {
                        task: task.to_string(),
                        source,
                    }
                })?;
                Ok(Staged {
                    dest,
                    contents: out.contents,
                })
            })
            .collect()
    }

    fn commit(&self, task: &str, staged: Vec<Staged>) -> Result<Vec<PathBuf>> {
        let tag = |source: anyhow::Error| AssetpipeError::Filesystem {
            task: task.to_string(),
            source,
        };

        let mut changed = Vec::new();
        for out in staged {
            let existing = file_hash(self.fs.as_ref(), &out.dest).map_err(tag)?;
            if existing.as_deref() == Some(content_hash(&out.contents).as_str()) {
                debug!(task = %task, path = %out.dest.display(), "output unchanged");
                continue;
            }
            self.fs.write(&out.dest, &out.contents).map_err(tag)?;
            debug!(task = %task, path = %out.dest.display(), bytes = out.contents.len(), "wrote output");
            changed.push(out.dest);
        }
        Ok(changed)
    }

    async fn notify(&self, task: &str, reload: bool, changed: &[PathBuf]) {
        if !reload || changed.is_empty() {
            return;
        }
        if let Err(e) = self.notifier.notify(task, changed).await {
            warn!(task = %task, error = %format!("{e:#}"), "live reload failed");
        }
    }

    fn clean(&self, task: &str, targets: &[PathBuf]) -> Result<TaskReport> {
        let mut changed = Vec::new();
        for dir in targets {
            if !self.fs.exists(dir) {
                debug!(task = %task, dir = %dir.display(), "nothing to clean");
                continue;
            }
            self.fs
                .remove_dir_all(dir)
                .map_err(|source| AssetpipeError::Filesystem {
                    task: task.to_string(),
                    source,
                })?;
            info!(task = %task, dir = %dir.display(), "removed");
            changed.push(dir.clone());
        }
        Ok(TaskReport { changed })
    }
}

impl TaskExecutor for PipelineRunner {
    fn execute_task<'a>(&'a self, task: &'a Task) -> BoxFuture<'a, Result<TaskReport>> {
        Box::pin(self.run_task(task))
    }
}

/// Join an output's relative path onto `dest_dir`, refusing paths that
/// would land outside it.
fn dest_path(dest_dir: &Path, out: &OutputFile) -> std::result::Result<PathBuf, TransformError> {
    let escapes = out.rel_path.as_os_str().is_empty()
        || out
            .rel_path
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes {
        return Err(TransformError::Failed(format!(
            "output path {:?} must be relative to the destination",
            out.rel_path
        )));
    }
    Ok(dest_dir.join(&out.rel_path))
}
