// src/report/summary.rs

//! Task-by-task run summary.

use std::fmt;

use serde::Serialize;

use crate::classify::{StatusLabel, TaskOutcome};
use crate::engine::RunResult;
use crate::report::{Style, StyledLine};

/// Running totals over everything the renderer visited.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Counters {
    pub hosts: usize,
    pub tasks: usize,
    pub success: usize,
    pub failed: usize,
    pub skipped: usize,
    pub unreachable: usize,
    pub no_hosts_matched: usize,
}

impl Counters {
    fn count(&mut self, status: StatusLabel) {
        match status {
            StatusLabel::Success => self.success += 1,
            StatusLabel::Skipped => self.skipped += 1,
            StatusLabel::Unreachable(_) => self.unreachable += 1,
            StatusLabel::Failed(_) => self.failed += 1,
            StatusLabel::NoHostsMatched => self.no_hosts_matched += 1,
        }
    }
}

impl fmt::Display for Counters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "hosts: {}, tasks: {}, success: {}, failed: {}, skipped: {}, unreachable: {}, no hosts matched: {}",
            self.hosts,
            self.tasks,
            self.success,
            self.failed,
            self.skipped,
            self.unreachable,
            self.no_hosts_matched
        )
    }
}

/// Rendered summary: styled lines for the console plus the counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    pub lines: Vec<StyledLine>,
    pub counters: Counters,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            writeln!(f, "{}", line.text())?;
        }
        Ok(())
    }
}

fn status_style(status: StatusLabel) -> Style {
    match status {
        StatusLabel::Success => Style::Success,
        StatusLabel::Skipped => Style::Skipped,
        StatusLabel::Unreachable(_) => Style::Unreachable,
        StatusLabel::Failed(_) => Style::Failed,
        StatusLabel::NoHostsMatched => Style::NoHostsMatched,
    }
}

/// Header style from a host's aggregate condition.
///
/// no-hosts-matched > unreachable > all skipped > all successful > failure.
pub fn host_style(outcomes: &[TaskOutcome]) -> Style {
    if outcomes.iter().any(|o| o.no_hosts_matched) {
        Style::NoHostsMatched
    } else if outcomes.iter().any(|o| o.unreachable) {
        Style::Unreachable
    } else if !outcomes.is_empty() && outcomes.iter().all(|o| o.skipped) {
        Style::Skipped
    } else if outcomes.iter().all(|o| o.retval == 0) {
        Style::Success
    } else {
        Style::Failed
    }
}

fn push_section(lines: &mut Vec<StyledLine>, title: &str, body: &[String], style: Style) {
    if body.is_empty() {
        return;
    }
    lines.push(StyledLine::new(format!("    {title}:"), Style::Dim));
    lines.extend(
        body.iter()
            .map(|line| StyledLine::new(format!("      {line}"), style)),
    );
}

fn render_outcome(lines: &mut Vec<StyledLine>, outcome: &TaskOutcome) {
    lines.push(StyledLine::new(
        format!("  {}: {}", outcome.task, outcome.status),
        status_style(outcome.status),
    ));

    if outcome.has_no_output() {
        lines.push(StyledLine::new(format!("    {}", outcome.stdout_lines[0]), Style::Dim));
    } else {
        push_section(lines, "stdout", &outcome.stdout_lines, Style::Stdout);
        push_section(lines, "stderr", &outcome.stderr_lines, Style::Stderr);
        push_section(lines, "msg", &outcome.msg_lines, Style::Plain);
    }

    if outcome.retval != 0 {
        lines.push(StyledLine::new(
            format!("    retval: {}", outcome.retval),
            Style::Dim,
        ));
    }
}

/// Render `result`. Pure: the same input always gives the same summary.
///
/// An unreachable outcome ends the listing for its host; later outcomes of
/// that host are neither shown nor counted. `verbose` appends a line with
/// all counters.
pub fn render_summary(result: &RunResult, verbose: bool) -> Summary {
    let mut lines = Vec::new();
    let mut counters = Counters::default();

    for (host, outcomes) in result.hosts() {
        counters.hosts += 1;
        lines.push(StyledLine::new(host, host_style(outcomes)));

        for (index, outcome) in outcomes.iter().enumerate() {
            counters.count(outcome.status);
            if outcome.no_hosts_matched {
                lines.push(StyledLine::new(
                    format!("  {}", outcome.task),
                    Style::NoHostsMatched,
                ));
                continue;
            }
            counters.tasks += 1;
            render_outcome(&mut lines, outcome);

            if outcome.unreachable {
                let hidden = outcomes.len() - index - 1;
                if hidden > 0 {
                    lines.push(StyledLine::new(
                        format!("  ({hidden} more not shown: host unreachable)"),
                        Style::Dim,
                    ));
                }
                break;
            }
        }
    }

    for outcome in result.unmatched() {
        counters.count(outcome.status);
        lines.push(StyledLine::new(outcome.task.clone(), Style::NoHostsMatched));
    }

    if verbose {
        lines.push(StyledLine::new(counters.to_string(), Style::Summary));
    }

    Summary { lines, counters }
}
