// src/dag/mod.rs

//! Task registry and scheduling.
//!
//! - [`registry`] holds named tasks and their declared predecessors.
//! - [`scheduler`] linearizes a task's predecessors and runs the plan.
//! - [`executor`] is the seam between the scheduler and whatever performs
//!   the work.
//! - [`context`] tracks what a single run already completed.

pub mod context;
pub mod executor;
pub mod registry;
pub mod scheduler;
pub mod task;

pub use context::RunContext;
pub use executor::{TaskExecutor, TaskReport};
pub use registry::Registry;
pub use scheduler::{Scheduler, plan};
pub use task::{Task, TaskAction, TaskSource};
