// src/engine/runner.rs

//! IO shell around [`RunAggregator`].
//!
//! The runner starts the event source, pulls events until the stream ends
//! (cleanly or not), and hands the collected outcomes to the run log store.
//! It never fails as a whole: every problem ends up in the [`RunReport`].

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tracing::{error, info, warn};

use crate::engine::aggregator::{RunAggregator, RunResult};
use crate::event::EventSource;
use crate::store::{RunLogStore, RunRecord};
use crate::types::{HostSelection, RunRequest};

/// Overall retval when the engine could not be started at all.
pub const RUN_START_FAILED: i32 = 255;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    /// Parallelism hint passed to the event source.
    pub forks: u32,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self { forks: 5 }
    }
}

/// What happened to the run directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Persistence {
    /// Persistence switched off.
    Disabled,
    /// The run never started, so there was nothing to record.
    Skipped,
    Written(PathBuf),
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub retval: i32,
    /// `None` only when the run could not start.
    pub result: Option<RunResult>,
    /// Set when the event source ended abnormally (or never started).
    pub aborted: Option<String>,
    pub persistence: Persistence,
    pub started_at: DateTime<Local>,
    /// Failed writes to the audit or debug stream, in the order they happened.
    pub log_errors: Vec<String>,
}

impl RunReport {
    pub fn started(&self) -> bool {
        self.result.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct Runner {
    options: RunOptions,
    store: Option<RunLogStore>,
}

impl Runner {
    /// `store: None` disables persistence.
    pub fn new(options: RunOptions, store: Option<RunLogStore>) -> Self {
        Self { options, store }
    }

    pub fn options(&self) -> RunOptions {
        self.options
    }

    /// Execute one run against `source`.
    pub fn run<S>(&self, playbook: &Path, selection: &HostSelection, source: &mut S) -> RunReport
    where
        S: EventSource + ?Sized,
    {
        let started_at = Local::now();
        let request = RunRequest {
            playbook: playbook.to_path_buf(),
            selection: selection.clone(),
            forks: self.options.forks,
        };

        if let Err(e) = source.start(&request) {
            error!(playbook = %playbook.display(), error = %e, "run could not start");
            return RunReport {
                retval: RUN_START_FAILED,
                result: None,
                aborted: Some(e.to_string()),
                persistence: if self.store.is_some() {
                    Persistence::Skipped
                } else {
                    Persistence::Disabled
                },
                started_at,
                log_errors: Vec::new(),
            };
        }
        info!(playbook = %playbook.display(), forks = self.options.forks, "run started");

        let mut aggregator = RunAggregator::new();
        let mut aborted = None;
        loop {
            match source.next_event() {
                Ok(Some(event)) => {
                    aggregator.step(&event);
                }
                Ok(None) => break,
                Err(e) => {
                    warn!(
                        error = %e,
                        collected = aggregator.result().outcome_count(),
                        "event source ended abnormally; keeping collected outcomes"
                    );
                    aborted = Some(e.to_string());
                    break;
                }
            }
        }

        let events_seen = aggregator.events_seen();
        let (retval, result) = aggregator.finish();
        info!(
            retval,
            events = events_seen,
            hosts = result.host_count(),
            outcomes = result.outcome_count(),
            "run finished"
        );

        let persistence = match &self.store {
            None => Persistence::Disabled,
            Some(store) => {
                let record = RunRecord {
                    playbook,
                    started_at,
                    selection,
                    retval,
                    result: &result,
                    aborted: aborted.as_deref(),
                };
                match store.record_run(&record) {
                    Ok(dir) => Persistence::Written(dir),
                    Err(e) => {
                        error!(error = %e, "failed to persist run logs");
                        Persistence::Failed(e.to_string())
                    }
                }
            }
        };

        RunReport {
            retval,
            result: Some(result),
            aborted,
            persistence,
            started_at,
            log_errors: Vec::new(),
        }
    }
}
