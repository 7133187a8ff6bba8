// src/errors.rs

//! Crate-wide error type.
//!
//! Configuration variants are fatal and surface before any run starts.
//! `Transform` and `Filesystem` abort the run they occur in and always carry
//! the name of the task that failed.

use thiserror::Error;

use crate::transform::TransformError;
use crate::types::TaskName;

#[derive(Error, Debug)]
pub enum AssetpipeError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Duplicate task: {0}")]
    DuplicateTask(TaskName),

    #[error("Task '{task}' has unknown predecessor '{predecessor}'")]
    UnknownPredecessor {
        task: TaskName,
        predecessor: TaskName,
    },

    #[error("Task not found: {0}")]
    TaskNotFound(TaskName),

    #[error("Cycle detected in task graph between: {}", .members.join(", "))]
    DagCycle { members: Vec<TaskName> },

    #[error("Task '{task}' transform failed: {source}")]
    Transform {
        task: TaskName,
        #[source]
        source: TransformError,
    },

    #[error("Task '{task}' filesystem error: {source:#}")]
    Filesystem {
        task: TaskName,
        #[source]
        source: anyhow::Error,
    },

    #[error("Task '{task}' service failed: {source:#}")]
    Service {
        task: TaskName,
        #[source]
        source: anyhow::Error,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AssetpipeError {
    /// Whether this error was detected while building the task graph, i.e.
    /// before any task could run.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            AssetpipeError::ConfigError(_)
                | AssetpipeError::DuplicateTask(_)
                | AssetpipeError::UnknownPredecessor { .. }
                | AssetpipeError::TaskNotFound(_)
                | AssetpipeError::DagCycle { .. }
                | AssetpipeError::TomlError(_)
        )
    }

    /// Name of the task a run-time failure is attributed to.
    pub fn task(&self) -> Option<&str> {
        match self {
            AssetpipeError::Transform { task, .. }
            | AssetpipeError::Filesystem { task, .. }
            | AssetpipeError::Service { task, .. } => Some(task),
            _ => None,
        }
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, AssetpipeError>;
