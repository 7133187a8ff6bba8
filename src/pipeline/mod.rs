// src/pipeline/mod.rs

//! Pipeline runner: reads a task's sources, passes them through its
//! transform and writes the results.

pub mod hash;
pub mod reload;
pub mod runner;
pub mod source;

pub use reload::{CommandNotifier, LogNotifier, ReloadNotifier, notifier_from_config};
pub use runner::PipelineRunner;
pub use source::collect_source_files;
