// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod pipeline;
pub mod transform;
pub mod types;
pub mod watch;

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::cli::CliArgs;
use crate::config::{ConfigFile, load_and_validate};
use crate::dag::{Registry, RunContext, Scheduler};
use crate::engine::{Runtime, RuntimeEvent, RuntimeOptions};
use crate::exec::ServiceSupervisor;
use crate::fs::{FileSystem, RealFileSystem};
use crate::pipeline::{PipelineRunner, ReloadNotifier, notifier_from_config};
use crate::types::{TaskName, TriggerReason};
use crate::watch::{WatchDispatcher, spawn_watcher};

/// Build the registry from `cfg` and put a scheduler backed by a
/// [`PipelineRunner`] on top of it.
pub fn build_scheduler(
    cfg: &ConfigFile,
    project_root: &Path,
    fs: Arc<dyn FileSystem>,
    notifier: Arc<dyn ReloadNotifier>,
    services: Arc<ServiceSupervisor>,
) -> errors::Result<Scheduler> {
    let registry = Registry::from_config(cfg, project_root, Arc::clone(&fs))?;
    let runner = PipelineRunner::new(fs, notifier, services);
    Ok(Scheduler::new(Arc::new(registry), Arc::new(runner)))
}

/// High-level entry point used by `main.rs`.
///
/// Loads and validates the config, runs the default series (or `--task`)
/// once, then, unless `--once`, watches the project root and re-runs tasks
/// on change until Ctrl-C.
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = load_and_validate(&args.config)?;
    let root = config_root_dir(&args.config);

    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let services = Arc::new(ServiceSupervisor::new());
    let notifier = notifier_from_config(cfg.reload(), &root);
    let scheduler = Arc::new(build_scheduler(
        &cfg,
        &root,
        fs,
        notifier,
        Arc::clone(&services),
    )?);

    let initial = initial_series(&cfg, args.task.as_deref());
    for name in &initial {
        scheduler.plan(name)?;
    }

    if args.dry_run {
        print_dry_run(&cfg, &root, &scheduler, &initial)?;
        return Ok(());
    }

    // Built before any run so an invalid rule fails fast.
    let dispatcher = WatchDispatcher::from_config(&cfg)?;

    let initial_result = run_initial(&scheduler, &initial).await;

    if args.once {
        services.shutdown().await;
        initial_result?;
        return Ok(());
    }

    if let Err(e) = initial_result {
        error!(error = %e, "initial build failed; watching for changes anyway");
    }

    if dispatcher.rules().is_empty() {
        warn!("no [[watch]] rules configured; only services will keep running");
    }

    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);
    let _watcher_handle = spawn_watcher(root, dispatcher, rt_tx.clone())?;

    {
        let tx = rt_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            let _ = tx.send(RuntimeEvent::ShutdownRequested).await;
        });
    }

    let options = RuntimeOptions {
        exit_when_idle: false,
    };
    let summary = Runtime::new(scheduler, rt_rx, rt_tx, options).run().await?;
    info!(
        started = summary.started,
        succeeded = summary.succeeded,
        failed = summary.failed.len(),
        "watch session finished"
    );

    services.shutdown().await;
    Ok(())
}

/// `--task` if given, else `[pipeline].default`.
fn initial_series(cfg: &ConfigFile, task: Option<&str>) -> Vec<TaskName> {
    match task {
        Some(name) => vec![name.to_string()],
        None => cfg.pipeline().default.clone(),
    }
}

async fn run_initial(scheduler: &Scheduler, series: &[TaskName]) -> errors::Result<RunContext> {
    if series.is_empty() {
        warn!("nothing to run: no --task given and [pipeline].default is empty");
        return Ok(RunContext::new());
    }
    info!(?series, reason = ?TriggerReason::Manual, "running initial series");
    let ctx = scheduler.run_series(series).await?;
    info!(
        completed = ctx.completed().len(),
        changed = ctx.changed().len(),
        "initial series finished"
    );
    Ok(ctx)
}

/// Directory roots are resolved against: the config file's parent, or the
/// current directory for a bare file name.
pub fn config_root_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

fn print_dry_run(
    cfg: &ConfigFile,
    root: &Path,
    scheduler: &Scheduler,
    series: &[TaskName],
) -> errors::Result<()> {
    println!("assetpipe dry-run");
    println!("  project root = {}", root.display());
    println!("  config.debounce_ms = {}", cfg.config_section().debounce_ms);
    println!();

    println!("roots ({}):", cfg.paths().len());
    for (name, path_root) in cfg.paths() {
        println!(
            "  - {name}: {} -> {}",
            path_root.src.display(),
            path_root.dest.display()
        );
    }
    println!();

    println!("tasks ({}):", scheduler.registry().len());
    for task in scheduler.registry().tasks() {
        println!("  - {} [{}]", task.name(), task.action().kind());
        if !task.predecessors().is_empty() {
            println!("      after: {:?}", task.predecessors());
        }
    }
    println!();

    if !cfg.watch_rules().is_empty() {
        println!("watch ({}):", cfg.watch_rules().len());
        for rule in cfg.watch_rules() {
            println!("  - {} -> {:?}", rule.pattern, rule.tasks);
        }
        println!();
    }

    println!("plan:");
    let mut requested: HashSet<&str> = HashSet::new();
    let mut done: HashSet<String> = HashSet::new();
    for name in series {
        if !requested.insert(name.as_str()) {
            println!("  {name}: (repeated, skipped)");
            continue;
        }
        let plan = scheduler.plan(name)?;
        let steps: Vec<&str> = plan
            .iter()
            .map(|t| t.name())
            .filter(|n| !done.contains(*n))
            .collect();
        if steps.is_empty() {
            println!("  {name}: (already done)");
        } else {
            println!("  {name}: {}", steps.join(" -> "));
        }
        done.extend(plan.iter().map(|t| t.name().to_string()));
    }

    Ok(())
}
