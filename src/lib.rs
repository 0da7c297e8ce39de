// src/lib.rs

pub mod classify;
pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod event;
pub mod fs;
pub mod logging;
pub mod report;
pub mod store;
pub mod types;

use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, error, info, warn};

use crate::cli::CliArgs;
use crate::config::loader::{default_config_path, load_from_path};
use crate::config::model::{ConfigFile, RawConfigFile};
use crate::engine::{Persistence, RunOptions, RunReport, Runner};
use crate::event::{CommandSource, EventSource, JsonLinesSource};
use crate::fs::{FileSystem, RealFileSystem};
use crate::report::{render_summary, Summary};
use crate::store::{
    with_log, Facility, LogEntry, LogFile, RunLogStore, Severity, StructuredLog, WriteMode,
};
use crate::types::HostSelection;

/// Basename of the synchronous audit stream (`audit{N}.yml`).
pub const AUDIT_LOG: &str = "audit";
/// Basename of the buffered debug stream (`debug{N}.yml`).
pub const DEBUG_LOG: &str = "debug";
pub const LOG_SUFFIX: &str = ".yml";

/// High-level entry point used by `main.rs`. Returns the process exit code.
///
/// This wires together:
/// - config loading and CLI overrides
/// - run log management (`--list-runs`, `--delete-run`)
/// - the event source (JSON lines or the engine command)
/// - the run itself, its logs and the console summary
pub fn run(args: CliArgs) -> Result<i32> {
    let cfg = load_config(&args)?;
    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);

    if args.list_runs {
        let store = RunLogStore::new(cfg.logs_root(), fs);
        for name in store.list_runs()? {
            println!("{name}");
        }
        return Ok(0);
    }
    if let Some(name) = args.delete_run.as_deref() {
        RunLogStore::new(cfg.logs_root(), fs).delete_run(name)?;
        return Ok(0);
    }

    let playbook = args
        .playbook
        .as_deref()
        .map(PathBuf::from)
        .context("--playbook is required")?;
    let selection = HostSelection::new(args.hosts.clone(), args.groups.clone());

    let mut source = build_source(&args, &cfg)?;
    let (report, summary) = run_playbook(&cfg, &playbook, &selection, &mut source, fs)?;

    if let Some(summary) = summary {
        print!("{summary}");
    }
    Ok(exit_code(&report))
}

/// Config file plus CLI overrides.
///
/// A missing file at the default location means built-in defaults; any
/// other path must exist.
pub fn load_config(args: &CliArgs) -> Result<ConfigFile> {
    let path = PathBuf::from(&args.config);
    let mut raw = if path == default_config_path() && !path.exists() {
        debug!(path = %path.display(), "no config file; using defaults");
        RawConfigFile::default()
    } else {
        load_from_path(&path).with_context(|| format!("loading config {:?}", path))?
    };

    apply_overrides(&mut raw, args);
    Ok(ConfigFile::try_from(raw)?)
}

fn apply_overrides(raw: &mut RawConfigFile, args: &CliArgs) {
    if let Some(forks) = args.forks {
        raw.run.forks = forks;
    }
    if args.verbose {
        raw.run.verbose = true;
    }
    if args.no_persist {
        raw.logging.persist = false;
    }
    if let Some(root) = &args.logs_root {
        raw.logging.logs_root = root.clone();
    }
}

fn build_source(args: &CliArgs, cfg: &ConfigFile) -> Result<Box<dyn EventSource>> {
    match args.events.as_deref() {
        Some("-") => Ok(Box::new(JsonLinesSource::new(io::stdin().lock()))),
        Some(path) => {
            let file = File::open(path).with_context(|| format!("opening events {path:?}"))?;
            Ok(Box::new(JsonLinesSource::new(BufReader::new(file))))
        }
        None => Ok(Box::new(CommandSource::new(
            cfg.engine.command.clone(),
            cfg.engine.args.clone(),
        ))),
    }
}

fn open_stream(
    cfg: &ConfigFile,
    name: &str,
    mode: WriteMode,
    fs: &Arc<dyn FileSystem>,
) -> Result<StructuredLog> {
    let file = LogFile::new(cfg.logs_root(), name, LOG_SUFFIX, cfg.logging.max_size_bytes);
    Ok(StructuredLog::open(name, file, mode, cfg.rate_limit(), Arc::clone(fs))?)
}

/// Run one playbook and produce its summary.
///
/// With persistence enabled the audit stream gets a start and a finish
/// entry, the run directory is written, and the rendered summary goes to the
/// debug stream. The summary is `None` only when the run never started.
///
/// Failed audit and debug writes never discard the run: they are collected
/// in [`RunReport::log_errors`]. After a failed start entry the audit stream
/// is not written again for this run.
pub fn run_playbook<S>(
    cfg: &ConfigFile,
    playbook: &Path,
    selection: &HostSelection,
    source: &mut S,
    fs: Arc<dyn FileSystem>,
) -> Result<(RunReport, Option<Summary>)>
where
    S: EventSource + ?Sized,
{
    let persist = cfg.logging.persist;
    let mut audit = if persist {
        Some(open_stream(cfg, AUDIT_LOG, WriteMode::Synchronous, &fs)?)
    } else {
        None
    };
    let mut log_errors = Vec::new();

    let start_failed = audit.as_mut().and_then(|log| {
        log.append(LogEntry::plain(
            Severity::Info,
            Facility::Audit,
            call_site!("run_playbook"),
            [
                format!("run started: {}", playbook.display()),
                format!("hosts: {}", selection.hosts.join(",")),
                format!("groups: {}", selection.groups.join(",")),
            ],
        ))
        .err()
    });
    if let Some(e) = start_failed {
        error!(error = %e, "failed to write run start to audit log");
        log_errors.push(e.to_string());
        audit = None;
    }

    let store = persist.then(|| RunLogStore::new(cfg.logs_root(), Arc::clone(&fs)));
    let runner = Runner::new(RunOptions { forks: cfg.run.forks }, store);
    let mut report = runner.run(playbook, selection, source);

    if let Some(reason) = &report.aborted {
        warn!(reason = %reason, retval = report.retval, "run did not complete normally");
    }

    let summary = report
        .result
        .as_ref()
        .map(|result| render_summary(result, cfg.run.verbose));

    if let Some(log) = audit.as_mut() {
        let severity = if report.retval == 0 {
            Severity::Info
        } else {
            Severity::Warning
        };
        let mut lines = vec![
            format!("run finished: {}", playbook.display()),
            format!("retval: {}", report.retval),
        ];
        if let Some(reason) = &report.aborted {
            lines.push(format!("aborted: {reason}"));
        }
        if let Persistence::Written(dir) = &report.persistence {
            lines.push(format!("logs: {}", dir.display()));
        }
        let finished = log.append(LogEntry::plain(
            severity,
            Facility::Audit,
            call_site!("run_playbook"),
            lines,
        ));
        if let Err(e) = finished {
            error!(error = %e, "failed to write run finish to audit log");
            log_errors.push(e.to_string());
        }
    }

    if let (true, Some(summary)) = (persist, summary.as_ref()) {
        if let Err(e) = write_debug_summary(cfg, &fs, summary) {
            error!(error = %e, "failed to write summary to debug log");
            log_errors.push(e.to_string());
        }
    }

    report.log_errors = log_errors;
    info!(retval = report.retval, "run complete");
    Ok((report, summary))
}

fn write_debug_summary(
    cfg: &ConfigFile,
    fs: &Arc<dyn FileSystem>,
    summary: &Summary,
) -> Result<()> {
    let mut debug_log = open_stream(cfg, DEBUG_LOG, WriteMode::Buffered, fs)?;
    with_log(&mut debug_log, |log| {
        log.append(LogEntry::styled(
            Severity::Info,
            Facility::Summary,
            call_site!("write_debug_summary"),
            summary.lines.clone(),
        ))
    })?;
    Ok(())
}

/// Process exit code for a run: 0 when it completed with retval 0 and every
/// log write succeeded, 2 when it could not start, 1 otherwise (including
/// aborted runs).
pub fn exit_code(report: &RunReport) -> i32 {
    if !report.started() {
        return 2;
    }
    if report.retval == 0 && report.aborted.is_none() && report.log_errors.is_empty() {
        0
    } else {
        1
    }
}
