// src/store/entry.rs

//! Persisted log records.

use chrono::{DateTime, Local, SecondsFormat};
use serde::Serialize;

use crate::report::StyledLine;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

/// Subsystem an entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Facility {
    Audit,
    Runner,
    Summary,
    Store,
}

/// Where an entry was produced, supplied explicitly by the caller.
///
/// Use [`call_site!`](crate::call_site) to capture file and line at compile
/// time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallSite {
    pub file: &'static str,
    pub function: &'static str,
    pub line: u32,
}

impl CallSite {
    pub const fn new(file: &'static str, function: &'static str, line: u32) -> Self {
        Self {
            file,
            function,
            line,
        }
    }
}

/// Build a [`CallSite`] for the current location.
///
/// `call_site!()` records the module path as the function; pass a name to be
/// precise: `call_site!("record_run")`.
#[macro_export]
macro_rules! call_site {
    () => {
        $crate::store::CallSite::new(file!(), module_path!(), line!())
    };
    ($function:expr) => {
        $crate::store::CallSite::new(file!(), $function, line!())
    };
}

/// Payload of an entry: plain lines or styled `(text, style)` pairs.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogBody {
    Lines(Vec<String>),
    StyledLines(Vec<StyledLine>),
}

/// One append-only record in a log stream.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntry {
    pub timestamp: String,
    pub severity: Severity,
    pub facility: Facility,
    pub source_file: String,
    pub source_function: String,
    pub source_line: u32,
    pub parent_process_id: Option<u32>,
    #[serde(flatten)]
    pub body: LogBody,
}

impl LogEntry {
    pub fn new(severity: Severity, facility: Facility, site: CallSite, body: LogBody) -> Self {
        Self::at(Local::now(), severity, facility, site, body)
    }

    /// Same as [`LogEntry::new`] with an explicit timestamp.
    pub fn at(
        timestamp: DateTime<Local>,
        severity: Severity,
        facility: Facility,
        site: CallSite,
        body: LogBody,
    ) -> Self {
        Self {
            timestamp: timestamp.to_rfc3339_opts(SecondsFormat::Millis, false),
            severity,
            facility,
            source_file: site.file.to_string(),
            source_function: site.function.to_string(),
            source_line: site.line,
            parent_process_id: parent_process_id(),
            body,
        }
    }

    pub fn plain<I, S>(severity: Severity, facility: Facility, site: CallSite, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let lines = lines.into_iter().map(Into::into).collect();
        Self::new(severity, facility, site, LogBody::Lines(lines))
    }

    pub fn styled(
        severity: Severity,
        facility: Facility,
        site: CallSite,
        lines: Vec<StyledLine>,
    ) -> Self {
        Self::new(severity, facility, site, LogBody::StyledLines(lines))
    }
}

#[cfg(unix)]
fn parent_process_id() -> Option<u32> {
    Some(std::os::unix::process::parent_id())
}

#[cfg(not(unix))]
fn parent_process_id() -> Option<u32> {
    None
}
