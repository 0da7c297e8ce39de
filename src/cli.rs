// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `playlog`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "playlog",
    version,
    about = "Run a playbook, classify every task outcome and keep rotated run logs.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// A missing file at the default location is not an error; built-in
    /// defaults are used instead.
    #[arg(long, value_name = "PATH", default_value = "Playlog.toml")]
    pub config: String,

    /// Playbook to run.
    #[arg(
        long,
        value_name = "PATH",
        required_unless_present_any = ["list_runs", "delete_run"]
    )]
    pub playbook: Option<String>,

    /// Read engine events from this JSON-lines file ("-" for stdin) instead
    /// of spawning the configured engine command.
    #[arg(long, value_name = "FILE")]
    pub events: Option<String>,

    /// Host to include in the run (repeatable).
    #[arg(long = "host", value_name = "HOST")]
    pub hosts: Vec<String>,

    /// Inventory group to include in the run (repeatable).
    #[arg(long = "group", value_name = "GROUP")]
    pub groups: Vec<String>,

    /// Parallelism hint passed through to the engine.
    #[arg(long, value_name = "N")]
    pub forks: Option<u32>,

    /// Print the trailing counters line after the summary.
    #[arg(long, short)]
    pub verbose: bool,

    /// Do not write the per-run log directory.
    #[arg(long)]
    pub no_persist: bool,

    /// Override `[logging].logs_root`.
    #[arg(long, value_name = "DIR")]
    pub logs_root: Option<String>,

    /// List recorded run directories and exit.
    #[arg(long, conflicts_with = "delete_run")]
    pub list_runs: bool,

    /// Delete one recorded run directory and exit.
    #[arg(long, value_name = "NAME")]
    pub delete_run: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `PLAYLOG_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
