// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`process`] builds platform shell commands and runs stdin/stdout
//!   filters (used by the `command` transform and the reload notifier).
//! - [`service`] supervises long-lived background commands started by
//!   `service` tasks.

pub mod process;
pub mod service;

pub use process::{FilterOutput, run_filter, run_to_completion, shell_command};
pub use service::ServiceSupervisor;
