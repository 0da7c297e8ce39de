// src/classify/failure.rs

//! Status classification from a retval and diagnostic text.
//!
//! The engine does not report *why* a host was unreachable or a task failed in
//! any structured way, so the reason is sniffed from well-known substrings.
//! The tables below are the whole matching vocabulary; extend them here.

use std::fmt;

use serde::{Serialize, Serializer};

/// Why a host was unreachable or a task failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reason {
    CouldNotResolve,
    PermissionDenied,
    NoRouteToHost,
    ConnectionTimedOut,
    MissingInterpreter,
    /// Diagnostics were present but matched nothing known.
    UnknownError,
    /// No diagnostics at all.
    UnknownReason,
}

impl Reason {
    pub fn as_str(self) -> &'static str {
        match self {
            Reason::CouldNotResolve => "COULD_NOT_RESOLVE",
            Reason::PermissionDenied => "PERMISSION_DENIED",
            Reason::NoRouteToHost => "NO_ROUTE_TO_HOST",
            Reason::ConnectionTimedOut => "CONNECTION_TIMED_OUT",
            Reason::MissingInterpreter => "MISSING_INTERPRETER",
            Reason::UnknownError => "UNKNOWN_ERROR",
            Reason::UnknownReason => "UNKNOWN_REASON",
        }
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Closed classification of a task outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusLabel {
    Success,
    Skipped,
    Unreachable(Reason),
    Failed(Reason),
    NoHostsMatched,
}

impl StatusLabel {
    pub fn reason(self) -> Option<Reason> {
        match self {
            StatusLabel::Unreachable(r) | StatusLabel::Failed(r) => Some(r),
            _ => None,
        }
    }

    pub fn is_success(self) -> bool {
        self == StatusLabel::Success
    }

    pub fn is_unreachable(self) -> bool {
        matches!(self, StatusLabel::Unreachable(_))
    }

    pub fn is_failed(self) -> bool {
        matches!(self, StatusLabel::Failed(_))
    }

    /// Label without the reason, e.g. `UNREACHABLE`.
    pub fn kind_str(self) -> &'static str {
        match self {
            StatusLabel::Success => "SUCCESS",
            StatusLabel::Skipped => "SKIPPED",
            StatusLabel::Unreachable(_) => "UNREACHABLE",
            StatusLabel::Failed(_) => "FAILED",
            StatusLabel::NoHostsMatched => "NO_HOSTS_MATCHED",
        }
    }
}

/// `SUCCESS`, `UNREACHABLE_NO_ROUTE_TO_HOST`, `FAILED_UNKNOWN_ERROR`, ...
impl fmt::Display for StatusLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.reason() {
            Some(reason) => write!(f, "{}_{}", self.kind_str(), reason),
            None => f.write_str(self.kind_str()),
        }
    }
}

impl Serialize for StatusLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Connection-level causes, checked when the host was unreachable.
pub const UNREACHABLE_PATTERNS: &[(&str, Reason)] = &[
    ("Name or service not known", Reason::CouldNotResolve),
    ("Permission denied", Reason::PermissionDenied),
    ("No route to host", Reason::NoRouteToHost),
    ("Connection timed out", Reason::ConnectionTimedOut),
];

/// Task-level causes, checked when the task returned non-zero.
pub const FAILED_PATTERNS: &[(&str, Reason)] = &[(
    "module failed to execute correctly",
    Reason::MissingInterpreter,
)];

/// First table match, scanning lines in order.
fn match_reason<S: AsRef<str>>(lines: &[S], table: &[(&str, Reason)]) -> Option<Reason> {
    lines.iter().find_map(|line| {
        let line = line.as_ref();
        table
            .iter()
            .find(|(needle, _)| line.contains(needle))
            .map(|(_, reason)| *reason)
    })
}

fn reason_or_unknown<S: AsRef<str>>(lines: &[S], table: &[(&str, Reason)]) -> Reason {
    match match_reason(lines, table) {
        Some(reason) => reason,
        None if lines.is_empty() => Reason::UnknownReason,
        None => Reason::UnknownError,
    }
}

/// Decide the status of one task.
///
/// Precedence, first match wins: unreachable, skipped, non-zero retval,
/// success. Always yields a label.
pub fn classify_failure<S: AsRef<str>>(
    retval: i32,
    diagnostic_lines: &[S],
    skipped: bool,
    unreachable: bool,
) -> StatusLabel {
    if unreachable {
        return StatusLabel::Unreachable(reason_or_unknown(diagnostic_lines, UNREACHABLE_PATTERNS));
    }
    if skipped {
        return StatusLabel::Skipped;
    }
    if retval != 0 {
        return StatusLabel::Failed(reason_or_unknown(diagnostic_lines, FAILED_PATTERNS));
    }
    StatusLabel::Success
}
