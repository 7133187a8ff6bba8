// src/transform/mod.rs

//! Transform plugins.
//!
//! A [`Transform`] turns the file set of one task source into output files.
//! The pipeline runner owns reading and writing; transforms only see and
//! return contents, so a failing transform never touches the destination.
//!
//! Built-in plugins:
//! - [`copy`]: identity.
//! - [`concat`]: join all inputs into one file.
//! - [`include`]: expand `@@include('...')` directives.
//! - [`command`]: pipe each input through an external shell filter (style
//!   compilers, image optimizers, ...).

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

use crate::config::TransformConfig;
use crate::errors::{AssetpipeError, Result};
use crate::fs::FileSystem;
use crate::types::BoxFuture;

pub mod command;
pub mod concat;
pub mod copy;
pub mod include;

pub use command::CommandTransform;
pub use concat::ConcatTransform;
pub use copy::CopyTransform;
pub use include::{IncludeBase, IncludeTransform};

/// Failure reported by a transform plugin.
#[derive(Error, Debug)]
pub enum TransformError {
    #[error("{0}")]
    Failed(String),

    #[error("`{cmd}` exited with code {code} on {file:?}: {stderr}")]
    Command {
        cmd: String,
        file: PathBuf,
        code: i32,
        stderr: String,
    },

    #[error("include cycle through {0:?}")]
    IncludeCycle(PathBuf),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// One input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Path as seen by the filesystem (source root joined with `rel_path`).
    pub path: PathBuf,
    /// Path relative to the source root; outputs usually keep it.
    pub rel_path: PathBuf,
    pub contents: Vec<u8>,
}

impl SourceFile {
    pub fn new(root: &Path, rel_path: impl Into<PathBuf>, contents: impl Into<Vec<u8>>) -> Self {
        let rel_path = rel_path.into();
        Self {
            path: root.join(&rel_path),
            rel_path,
            contents: contents.into(),
        }
    }
}

/// One output file, relative to the destination directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFile {
    pub rel_path: PathBuf,
    pub contents: Vec<u8>,
}

/// Everything a transform gets for one source.
#[derive(Debug, Clone)]
pub struct TransformInput {
    /// Source root directory the files were collected from.
    pub root: PathBuf,
    /// Matching files, sorted by relative path.
    pub files: Vec<SourceFile>,
}

/// Plugin interface for file transforms.
pub trait Transform: Send + Sync + fmt::Debug {
    /// Short plugin name for logs and dry-run output.
    fn name(&self) -> &str;

    fn apply(
        &self,
        input: TransformInput,
    ) -> BoxFuture<'_, std::result::Result<Vec<OutputFile>, TransformError>>;
}

/// Instantiate the plugin described by a `transform = { kind = ... }` entry.
///
/// `project_root` anchors explicit include base directories; `fs` is used by
/// plugins that read more than their inputs.
pub fn build_transform(
    cfg: &TransformConfig,
    project_root: &Path,
    fs: Arc<dyn FileSystem>,
) -> Result<Arc<dyn Transform>> {
    let transform: Arc<dyn Transform> = match cfg {
        TransformConfig::Copy => Arc::new(CopyTransform),
        TransformConfig::Concat { output, separator } => {
            Arc::new(ConcatTransform::new(output.clone(), separator.clone()))
        }
        TransformConfig::Include { prefix, basepath } => {
            let base = IncludeBase::parse(basepath, project_root);
            let include = IncludeTransform::new(prefix, base, fs).map_err(|e| {
                AssetpipeError::ConfigError(format!("invalid include prefix '{prefix}': {e}"))
            })?;
            Arc::new(include)
        }
        TransformConfig::Command { cmd, extension } => {
            Arc::new(CommandTransform::new(cmd.clone(), extension.clone()))
        }
    };
    Ok(transform)
}
