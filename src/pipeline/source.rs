// src/pipeline/source.rs

use std::path::Path;

use anyhow::Result;
use tracing::{debug, warn};

use crate::dag::TaskSource;
use crate::fs::FileSystem;
use crate::transform::SourceFile;
use crate::watch::path_utils::relative_str;

/// Read every file under the source's directory matching its glob.
///
/// Files come back sorted by relative path. A missing source directory
/// yields no files.
pub fn collect_source_files(fs: &dyn FileSystem, source: &TaskSource) -> Result<Vec<SourceFile>> {
    let root = source.src_dir();
    if !fs.is_dir(root) {
        warn!(dir = %root.display(), pattern = %source.pattern(), "source directory does not exist");
        return Ok(Vec::new());
    }

    let mut matched = Vec::new();
    let mut stack = vec![root.to_path_buf()];

    while let Some(dir) = stack.pop() {
        for path in fs.read_dir(&dir)? {
            if fs.is_dir(&path) {
                stack.push(path);
            } else if fs.is_file(&path) {
                if let Some(rel) = relative_str(root, &path) {
                    if source.matches(&rel) {
                        matched.push((rel, path));
                    }
                }
            }
        }
    }

    matched.sort_by(|a, b| a.0.cmp(&b.0));

    let mut files = Vec::with_capacity(matched.len());
    for (rel, path) in matched {
        let contents = fs.read(&path)?;
        files.push(SourceFile::new(root, rel, contents));
    }

    debug!(
        dir = %root.display(),
        pattern = %source.pattern(),
        count = files.len(),
        "collected source files"
    );
    Ok(files)
}
