// src/engine/runtime.rs

use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::dag::Scheduler;
use crate::errors::Result;
use crate::types::TaskName;

use super::{RunOutcome, RuntimeEvent, RuntimeOptions};

/// Counts of what the runtime did before it stopped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuntimeSummary {
    pub started: usize,
    pub succeeded: usize,
    /// Failed runs with the error that ended them, in completion order.
    pub failed: Vec<(TaskName, String)>,
}

/// Turns `TaskTriggered` events into concurrent scheduler runs.
///
/// The runtime keeps its own sender so spawned runs can report back; the
/// loop therefore ends on `ShutdownRequested`, or when idle if
/// `exit_when_idle` is set.
pub struct Runtime {
    scheduler: Arc<Scheduler>,
    event_rx: mpsc::Receiver<RuntimeEvent>,
    event_tx: mpsc::Sender<RuntimeEvent>,
    options: RuntimeOptions,
    in_flight: usize,
    summary: RuntimeSummary,
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("options", &self.options)
            .field("in_flight", &self.in_flight)
            .finish_non_exhaustive()
    }
}

impl Runtime {
    pub fn new(
        scheduler: Arc<Scheduler>,
        event_rx: mpsc::Receiver<RuntimeEvent>,
        event_tx: mpsc::Sender<RuntimeEvent>,
        options: RuntimeOptions,
    ) -> Self {
        Self {
            scheduler,
            event_rx,
            event_tx,
            options,
            in_flight: 0,
            summary: RuntimeSummary::default(),
        }
    }

    /// Main event loop.
    pub async fn run(mut self) -> Result<RuntimeSummary> {
        info!("assetpipe runtime started");

        while let Some(event) = self.event_rx.recv().await {
            debug!(?event, "runtime received event");

            match event {
                RuntimeEvent::TaskTriggered { task, reason } => {
                    info!(task = %task, ?reason, "run triggered");
                    self.spawn_run(task);
                }
                RuntimeEvent::RunFinished { task, outcome } => {
                    self.in_flight = self.in_flight.saturating_sub(1);
                    match outcome {
                        RunOutcome::Succeeded { changed } => {
                            info!(task = %task, changed, "run succeeded");
                            self.summary.succeeded += 1;
                        }
                        RunOutcome::Failed { error } => {
                            error!(task = %task, error = %error, "run failed");
                            self.summary.failed.push((task, error));
                        }
                    }

                    if self.options.exit_when_idle && self.in_flight == 0 {
                        info!("no runs in flight; stopping runtime");
                        break;
                    }
                }
                RuntimeEvent::ShutdownRequested => {
                    if self.in_flight > 0 {
                        warn!(in_flight = self.in_flight, "shutting down with runs in flight");
                    }
                    info!("shutdown requested; stopping runtime");
                    break;
                }
            }
        }

        info!("runtime exiting");
        Ok(self.summary)
    }

    fn spawn_run(&mut self, task: TaskName) {
        self.in_flight += 1;
        self.summary.started += 1;

        let scheduler = Arc::clone(&self.scheduler);
        let tx = self.event_tx.clone();
        tokio::spawn(async move {
            let outcome = match scheduler.run(&task).await {
                Ok(ctx) => RunOutcome::Succeeded {
                    changed: ctx.changed().len(),
                },
                Err(e) => RunOutcome::Failed {
                    error: e.to_string(),
                },
            };
            if let Err(err) = tx.send(RuntimeEvent::RunFinished { task, outcome }).await {
                debug!("runtime gone before run finished: {err}");
            }
        });
    }
}
