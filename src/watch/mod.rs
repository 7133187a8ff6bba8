// src/watch/mod.rs

//! File watching.
//!
//! Compiles `[[watch]]` rules, runs a recursive `notify` watcher on the
//! project root and turns matching changes into task triggers. It knows
//! nothing about predecessors; the scheduler resolves those per run.

pub mod debounce;
pub mod dispatcher;
pub mod path_utils;
pub mod patterns;
pub mod watcher;

pub use debounce::Debouncer;
pub use dispatcher::WatchDispatcher;
pub use patterns::WatchRule;
pub use watcher::{WatcherHandle, spawn_watcher};
