#![allow(dead_code, unused_imports)]

pub use assetpipe_test_utils::builders::{ConfigFileBuilder, TaskConfigBuilder};
pub use assetpipe_test_utils::recording::{FailingTransform, RecordingExecutor, RecordingNotifier};
pub use assetpipe_test_utils::{init_tracing, with_timeout};

use std::path::Path;

/// Write `files` (relative path, contents) under `root`, creating
/// directories as needed.
pub fn write_tree(root: &Path, files: &[(&str, &str)]) {
    for (rel, contents) in files {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, contents).unwrap();
    }
}

pub fn names(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}
