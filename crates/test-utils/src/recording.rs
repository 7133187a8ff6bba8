//! Test doubles for the executor, notifier and transform seams.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use assetpipe::dag::{Task, TaskExecutor, TaskReport};
use assetpipe::errors::{AssetpipeError, Result};
use assetpipe::pipeline::ReloadNotifier;
use assetpipe::transform::{OutputFile, Transform, TransformError, TransformInput};
use assetpipe::types::BoxFuture;

/// Records which tasks ran, in order, and fails the ones it was told to.
///
/// Clones share the same record.
#[derive(Clone, Default)]
pub struct RecordingExecutor {
    executed: Arc<Mutex<Vec<String>>>,
    failing: Arc<Mutex<HashSet<String>>>,
    delay: Option<Duration>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `task` fail with a transform error.
    pub fn failing(self, task: &str) -> Self {
        self.failing.lock().unwrap().insert(task.to_string());
        self
    }

    /// Sleep this long inside every task.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }
}

impl TaskExecutor for RecordingExecutor {
    fn execute_task<'a>(&'a self, task: &'a Task) -> BoxFuture<'a, Result<TaskReport>> {
        Box::pin(async move {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.executed.lock().unwrap().push(task.name().to_string());

            if self.failing.lock().unwrap().contains(task.name()) {
                return Err(AssetpipeError::Transform {
                    task: task.name().to_string(),
                    source: TransformError::Failed("recorded failure".into()),
                });
            }
            Ok(TaskReport::default())
        })
    }
}

/// Records every reload notification.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    calls: Arc<Mutex<Vec<(String, Vec<PathBuf>)>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<(String, Vec<PathBuf>)> {
        self.calls.lock().unwrap().clone()
    }
}

impl ReloadNotifier for RecordingNotifier {
    fn notify<'a>(&'a self, task: &'a str, paths: &'a [PathBuf]) -> BoxFuture<'a, anyhow::Result<()>> {
        Box::pin(async move {
            self.calls
                .lock()
                .unwrap()
                .push((task.to_string(), paths.to_vec()));
            Ok(())
        })
    }
}

/// A transform that always fails, standing in for a broken style compiler.
#[derive(Debug, Clone)]
pub struct FailingTransform {
    message: String,
}

impl FailingTransform {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

impl Transform for FailingTransform {
    fn name(&self) -> &str {
        "failing"
    }

    fn apply(
        &self,
        _input: TransformInput,
    ) -> BoxFuture<'_, std::result::Result<Vec<OutputFile>, TransformError>> {
        Box::pin(async move { Err(TransformError::Failed(self.message.clone())) })
    }
}
