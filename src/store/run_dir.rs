// src/store/run_dir.rs

//! Per-run log directories.
//!
//! Layout under `logs_root`:
//!
//! ```text
//! {start_timestamp}_{playbook}/
//!     metadata.yml
//!     01-{host}_{task}.yml
//!     02-{host}_{task}.yml
//!     ...
//! ```
//!
//! Outcome files are numbered in the order the outcomes were accepted,
//! starting at 1. Every file is created once (mode 0600) and never rewritten;
//! the only removal is [`RunLogStore::delete_run`] of a whole directory.
//!
//! `metadata.yml` is written last and lists any outcome files that could not
//! be written, so an incomplete directory is recognisable on disk.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::anyhow;
use chrono::{DateTime, Local, SecondsFormat};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::classify::TaskOutcome;
use crate::engine::RunResult;
use crate::errors::{PlaylogError, Result};
use crate::fs::FileSystem;
use crate::store::rotation::natural_cmp;
use crate::types::HostSelection;

pub const METADATA_FILE: &str = "metadata.yml";
pub const RUN_FILE_EXT: &str = "yml";

/// Host label used in file names for host-less sentinel outcomes.
pub const NO_HOST: &str = "no_host";

const RUN_DIR_TIME_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// Byte cap on the `{host}_{task}` part of an outcome file name. Keeps the
/// whole name below the usual 255-byte component limit.
pub const MAX_OUTCOME_STEM_BYTES: usize = 200;

/// Replace characters that must not appear in a single path component.
pub fn sanitize_component(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            ' ' | '/' | '\\' => '_',
            other => other,
        })
        .collect()
}

/// `{start_timestamp}_{playbook_basename}` with spaces replaced.
pub fn run_dir_name(started_at: &DateTime<Local>, playbook: &Path) -> String {
    let base = playbook
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "playbook".to_string());
    sanitize_component(&format!(
        "{}_{}",
        started_at.format(RUN_DIR_TIME_FORMAT),
        base
    ))
}

/// `{sequence:02}-{host}_{task}.yml`, with `{host}_{task}` cut to
/// [`MAX_OUTCOME_STEM_BYTES`] on a char boundary. The sequence prefix keeps
/// cut names unique.
pub fn outcome_file_name(sequence: usize, host: &str, task: &str) -> String {
    let stem = sanitize_component(&format!("{host}_{task}"));
    format!(
        "{:02}-{}.{}",
        sequence,
        truncate_on_char_boundary(&stem, MAX_OUTCOME_STEM_BYTES),
        RUN_FILE_EXT
    )
}

fn truncate_on_char_boundary(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Everything recorded about one finished run.
#[derive(Debug, Clone, Copy)]
pub struct RunRecord<'a> {
    pub playbook: &'a Path,
    pub started_at: DateTime<Local>,
    pub selection: &'a HostSelection,
    pub retval: i32,
    pub result: &'a RunResult,
    pub aborted: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct RunMetadata<'a> {
    playbook: String,
    created: String,
    hosts: &'a [String],
    groups: &'a [String],
    retval: i32,
    outcomes: usize,
    aborted: Option<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    missing: Vec<String>,
}

#[derive(Debug, Serialize)]
struct OutcomeDocument<'a> {
    host: Option<&'a str>,
    #[serde(flatten)]
    outcome: &'a TaskOutcome,
}

/// Reads and writes run directories under one root.
#[derive(Debug, Clone)]
pub struct RunLogStore {
    root: PathBuf,
    fs: Arc<dyn FileSystem>,
}

impl RunLogStore {
    pub fn new(root: impl Into<PathBuf>, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            root: root.into(),
            fs,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Pick a directory for a new run; a clash (same second, same playbook)
    /// gets a numeric suffix.
    fn fresh_run_dir(&self, name: &str) -> PathBuf {
        let mut candidate = self.root.join(name);
        let mut n = 2;
        while self.fs.is_dir(&candidate) {
            candidate = self.root.join(format!("{name}-{n}"));
            n += 1;
        }
        candidate
    }

    /// Write the directory for one run and return its path.
    ///
    /// Every outcome is attempted even when an earlier one fails. Failed
    /// files are listed under `missing` in the metadata and the call returns
    /// an error naming them.
    pub fn record_run(&self, record: &RunRecord<'_>) -> Result<PathBuf> {
        let dir = self.fresh_run_dir(&run_dir_name(&record.started_at, record.playbook));
        self.fs.create_dir_all(&dir)?;

        let mut missing = Vec::new();
        for (index, (host, outcome)) in record.result.in_arrival_order().enumerate() {
            let sequence = index + 1;
            let name = outcome_file_name(sequence, host.unwrap_or(NO_HOST), &outcome.task);
            let document = OutcomeDocument { host, outcome };
            match self.write_outcome(&dir.join(&name), &document) {
                Ok(()) => debug!(file = %name, retval = outcome.retval, "outcome logged"),
                Err(e) => {
                    warn!(file = %name, error = %e, "outcome not logged");
                    missing.push(name);
                }
            }
        }

        let metadata = RunMetadata {
            playbook: record.playbook.display().to_string(),
            created: Local::now().to_rfc3339_opts(SecondsFormat::Secs, false),
            hosts: &record.selection.hosts,
            groups: &record.selection.groups,
            retval: record.retval,
            outcomes: record.result.outcome_count(),
            aborted: record.aborted,
            missing: missing.clone(),
        };
        self.fs.create_new(
            &dir.join(METADATA_FILE),
            serde_yaml::to_string(&metadata)?.as_bytes(),
        )?;

        if !missing.is_empty() {
            return Err(PlaylogError::Other(anyhow!(
                "{} of {} outcome files not written under {:?}: {}",
                missing.len(),
                record.result.outcome_count(),
                dir,
                missing.join(", ")
            )));
        }

        info!(
            dir = %dir.display(),
            outcomes = record.result.outcome_count(),
            "run logs written"
        );
        Ok(dir)
    }

    fn write_outcome(&self, path: &Path, document: &OutcomeDocument<'_>) -> Result<()> {
        self.fs
            .create_new(path, serde_yaml::to_string(document)?.as_bytes())?;
        Ok(())
    }

    /// Names of recorded run directories, oldest first.
    pub fn list_runs(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self
            .fs
            .list_dir(&self.root)?
            .into_iter()
            .filter(|p| self.fs.is_dir(p))
            .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
            .collect();
        names.sort_by(|a, b| natural_cmp(a, b));
        Ok(names)
    }

    /// Delete one whole run directory.
    pub fn delete_run(&self, name: &str) -> Result<()> {
        if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
            return Err(PlaylogError::ConfigError(format!(
                "invalid run name {name:?}"
            )));
        }
        let dir = self.root.join(name);
        if !self.fs.is_dir(&dir) {
            return Err(PlaylogError::Other(anyhow!(
                "no run named {name:?} under {:?}",
                self.root
            )));
        }
        self.fs.remove_dir_all(&dir)?;
        info!(dir = %dir.display(), "run logs deleted");
        Ok(())
    }
}
