// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::default_config_path;

/// Command-line arguments for `assetpipe`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "assetpipe",
    version,
    about = "Build and watch front-end assets from a declarative task file.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML). Roots are resolved relative to its
    /// directory.
    #[arg(long, value_name = "PATH", default_value_os_t = default_config_path())]
    pub config: PathBuf,

    /// Run the default series (or `--task`) once and exit; no watching.
    #[arg(long)]
    pub once: bool,

    /// Run this task's plan instead of the default series.
    #[arg(long, value_name = "NAME")]
    pub task: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `ASSETPIPE_LOG` or `info` is used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Validate the config and print the resolved plans without running
    /// anything.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let args = CliArgs::try_parse_from(["assetpipe"]).unwrap();
        assert_eq!(args.config, PathBuf::from("Assetpipe.toml"));
        assert!(!args.once);
        assert!(!args.dry_run);
        assert!(args.task.is_none());
        assert!(args.log_level.is_none());
    }

    #[test]
    fn all_flags() {
        let args = CliArgs::try_parse_from([
            "assetpipe",
            "--config",
            "site/Assetpipe.toml",
            "--once",
            "--task",
            "scss:compile",
            "--dry-run",
            "--log-level",
            "debug",
        ])
        .unwrap();
        assert_eq!(args.config, PathBuf::from("site/Assetpipe.toml"));
        assert!(args.once && args.dry_run);
        assert_eq!(args.task.as_deref(), Some("scss:compile"));
        assert_eq!(args.log_level, Some(LogLevel::Debug));
    }
}
