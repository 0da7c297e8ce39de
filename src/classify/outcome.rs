// src/classify/outcome.rs

//! Normalization of one raw [`RunEvent`] into at most one [`TaskOutcome`].

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::trace;

use crate::classify::failure::{classify_failure, StatusLabel};
use crate::event::{EventKind, RunEvent};
use crate::types::TaskName;

/// Task-name prefix asking for the task to be hidden when it succeeds.
pub const HIDE_ON_SUCCESS_MARKER: &str = "[hide-on-success]";

/// Name the engine gives its implicit fact-gathering step.
pub const GATHERING_FACTS_TASK: &str = "Gathering Facts";

/// Placeholder shown when a task produced no output at all.
pub const NO_OUTPUT: &str = "<no output>";

/// Task name reported for a host-less no-hosts-matched sentinel.
pub const NO_HOSTS_MATCHED_TASK: &str = "no hosts matched";

/// Normalized, classified result of one (host, task) event.
///
/// Suppressed events (null retval) never become outcomes, so `retval` is
/// always concrete here.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskOutcome {
    pub task: TaskName,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub retval: i32,
    pub status: StatusLabel,
    pub skipped: bool,
    pub unreachable: bool,
    pub no_hosts_matched: bool,
    pub stdout_lines: Vec<String>,
    pub stderr_lines: Vec<String>,
    pub msg_lines: Vec<String>,
    pub facts: Map<String, Value>,
}

impl TaskOutcome {
    /// Synthetic outcome for a no-hosts-matched sentinel.
    pub fn no_hosts_matched(event: &RunEvent) -> Self {
        Self {
            task: event
                .task
                .clone()
                .unwrap_or_else(|| NO_HOSTS_MATCHED_TASK.to_string()),
            start_date: event.start.clone(),
            end_date: event.end.clone(),
            retval: -1,
            status: StatusLabel::NoHostsMatched,
            skipped: false,
            unreachable: false,
            no_hosts_matched: true,
            stdout_lines: Vec::new(),
            stderr_lines: Vec::new(),
            msg_lines: Vec::new(),
            facts: Map::new(),
        }
    }

    /// True when stdout holds only the `<no output>` placeholder.
    pub fn has_no_output(&self) -> bool {
        self.stderr_lines.is_empty()
            && self.msg_lines.is_empty()
            && self.stdout_lines.len() == 1
            && self.stdout_lines[0] == NO_OUTPUT
    }
}

/// Retval implied by the event, before suppression. `None` means the engine
/// reported no return code for a kind that does not imply one.
fn event_retval(event: &RunEvent, unreachable: bool) -> Option<i32> {
    if unreachable {
        return Some(-1);
    }
    match event.kind {
        EventKind::Skipped | EventKind::Ok => Some(0),
        EventKind::Failed => Some(-1),
        _ => event.result.return_code(),
    }
}

/// Apply the suppression rules. Returns the name to report, or `None` when
/// the event must not surface.
fn visible_task_name(task: &str, retval: i32) -> Option<String> {
    if let Some(rest) = task.strip_prefix(HIDE_ON_SUCCESS_MARKER) {
        if retval == 0 {
            return None;
        }
        return Some(rest.trim_start().to_string());
    }
    if task == GATHERING_FACTS_TASK && retval == 0 {
        return None;
    }
    Some(task.to_string())
}

/// Turn one event into zero or one outcome.
///
/// - The no-hosts-matched sentinel always yields a synthetic outcome.
/// - Events without host or task are bookkeeping and yield nothing.
/// - Successful fact gathering and successful hide-on-success tasks are
///   suppressed, as is anything without a retval.
pub fn classify_event(event: &RunEvent) -> Option<TaskOutcome> {
    if event.kind == EventKind::NoHostsMatched {
        return Some(TaskOutcome::no_hosts_matched(event));
    }

    let (Some(_host), Some(task)) = (event.host.as_deref(), event.task.as_deref()) else {
        trace!(kind = %event.kind, "event without host/task ignored");
        return None;
    };

    let payload = &event.result;
    let unreachable = payload.is_unreachable() || event.kind == EventKind::Unreachable;
    let skipped = payload.is_skipped() || event.kind == EventKind::Skipped;

    let Some(retval) = event_retval(event, unreachable) else {
        trace!(task, kind = %event.kind, "event without retval suppressed");
        return None;
    };
    let Some(task) = visible_task_name(task, retval) else {
        trace!(task, "successful hidden task suppressed");
        return None;
    };

    let mut stdout_lines = payload.stdout_lines();
    let mut stderr_lines = payload.stderr_lines();
    let mut msg_lines = payload.msg_lines();

    if stdout_lines.is_empty() && stderr_lines.is_empty() && retval != 0 {
        stderr_lines = std::mem::take(&mut msg_lines);
    }

    let diagnostics: Vec<&String> = stderr_lines
        .iter()
        .chain(msg_lines.iter())
        .chain(stdout_lines.iter())
        .collect();
    let status = classify_failure(retval, &diagnostics, skipped, unreachable);

    if stdout_lines.is_empty() && stderr_lines.is_empty() && msg_lines.is_empty() {
        stdout_lines.push(NO_OUTPUT.to_string());
    }

    Some(TaskOutcome {
        task,
        start_date: event.start.clone(),
        end_date: event.end.clone(),
        retval,
        status,
        skipped,
        unreachable,
        no_hosts_matched: false,
        stdout_lines,
        stderr_lines,
        msg_lines,
        facts: payload.facts(),
    })
}
