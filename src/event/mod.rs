// src/event/mod.rs

//! Raw engine events and the sources that produce them.
//!
//! - [`RunEvent`] is one record as emitted by the automation engine. Its
//!   payload is kept opaque ([`Payload`]) and only interpreted through
//!   tolerant accessors, because engines disagree on field shapes.
//! - [`source`] defines the [`EventSource`] seam and a JSON-lines reader.
//! - [`command`] wraps an engine process whose stdout is a JSON-lines stream.

pub mod command;
pub mod source;

pub use command::CommandSource;
pub use source::{EventSource, JsonLinesSource};

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::{HostName, TaskName};

/// Kind tag of an engine event.
///
/// Both the short tags and the engine's long callback names are accepted.
/// Anything else is kept verbatim in [`EventKind::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventKind {
    Start,
    Ok,
    Failed,
    Unreachable,
    Skipped,
    NoHostsMatched,
    Other(String),
}

impl EventKind {
    pub fn as_str(&self) -> &str {
        match self {
            EventKind::Start => "start",
            EventKind::Ok => "ok",
            EventKind::Failed => "failed",
            EventKind::Unreachable => "unreachable",
            EventKind::Skipped => "skipped",
            EventKind::NoHostsMatched => "no_hosts_matched",
            EventKind::Other(s) => s.as_str(),
        }
    }
}

impl FromStr for EventKind {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = match s.trim().to_lowercase().replace('-', "_").as_str() {
            "start" | "runner_on_start" => EventKind::Start,
            "ok" | "runner_on_ok" => EventKind::Ok,
            "failed" | "runner_on_failed" => EventKind::Failed,
            "unreachable" | "runner_on_unreachable" => EventKind::Unreachable,
            "skipped" | "runner_on_skipped" => EventKind::Skipped,
            "no_hosts_matched" | "playbook_on_no_hosts_matched" => EventKind::NoHostsMatched,
            _ => EventKind::Other(s.to_string()),
        };
        Ok(kind)
    }
}

impl From<String> for EventKind {
    fn from(s: String) -> Self {
        match s.parse() {
            Ok(kind) => kind,
            Err(never) => match never {},
        }
    }
}

impl From<EventKind> for String {
    fn from(kind: EventKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One record from the event source. Never mutated once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunEvent {
    #[serde(alias = "event")]
    pub kind: EventKind,

    #[serde(default)]
    pub host: Option<HostName>,

    #[serde(default)]
    pub task: Option<TaskName>,

    #[serde(default, alias = "res")]
    pub result: Payload,

    #[serde(default)]
    pub start: Option<String>,

    #[serde(default)]
    pub end: Option<String>,
}

impl RunEvent {
    pub fn new(kind: EventKind) -> Self {
        Self {
            kind,
            host: None,
            task: None,
            result: Payload::default(),
            start: None,
            end: None,
        }
    }
}

/// Opaque structured result payload of an event.
///
/// Accessors never fail: a field of the wrong shape reads as absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Payload(pub Value);

impl Payload {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    fn field(&self, key: &str) -> Option<&Value> {
        self.0.as_object().and_then(|obj| obj.get(key))
    }

    /// Return code as reported by the engine (`rc`, or `return_code`).
    ///
    /// Accepts integers and numeric strings. Codes outside the `i32` range
    /// saturate, so they still read as a failure.
    pub fn return_code(&self) -> Option<i32> {
        let value = self.field("rc").or_else(|| self.field("return_code"))?;
        match value {
            Value::Number(n) => n
                .as_i64()
                .map(saturate_code)
                .or_else(|| n.as_u64().map(|_| i32::MAX)),
            Value::String(s) => {
                let s = s.trim();
                s.parse::<i64>().ok().map(saturate_code).or_else(|| {
                    let digits = s.strip_prefix('-').unwrap_or(s);
                    (!digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
                        .then(|| if s.starts_with('-') { i32::MIN } else { i32::MAX })
                })
            }
            _ => None,
        }
    }

    /// Boolean flag; only a literal `true` counts.
    pub fn flag(&self, key: &str) -> bool {
        matches!(self.field(key), Some(Value::Bool(true)))
    }

    pub fn is_unreachable(&self) -> bool {
        self.flag("unreachable")
    }

    pub fn is_skipped(&self) -> bool {
        self.flag("skipped")
    }

    /// A field that is an array made only of strings.
    fn string_array(&self, key: &str) -> Option<Vec<String>> {
        let items = self.field(key)?.as_array()?;
        items
            .iter()
            .map(|item| item.as_str().map(str::to_string))
            .collect()
    }

    fn text(&self, key: &str) -> Option<&str> {
        self.field(key).and_then(Value::as_str)
    }

    /// Explicit `{stream}_lines` array if present, otherwise the raw
    /// `{stream}` text split on newlines.
    fn stream_lines(&self, stream: &str) -> Vec<String> {
        if let Some(lines) = self.string_array(&format!("{stream}_lines")) {
            return lines;
        }
        self.text(stream).map(split_lines).unwrap_or_default()
    }

    pub fn stdout_lines(&self) -> Vec<String> {
        self.stream_lines("stdout")
    }

    pub fn stderr_lines(&self) -> Vec<String> {
        self.stream_lines("stderr")
    }

    /// `msg` as lines; engines send either a string or a list of strings.
    pub fn msg_lines(&self) -> Vec<String> {
        if let Some(lines) = self.string_array("msg") {
            return lines;
        }
        self.text("msg").map(split_lines).unwrap_or_default()
    }

    /// Gathered facts (`ansible_facts`, or `facts`).
    pub fn facts(&self) -> Map<String, Value> {
        self.field("ansible_facts")
            .or_else(|| self.field("facts"))
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default()
    }
}

fn split_lines(text: &str) -> Vec<String> {
    text.lines().map(str::to_string).collect()
}

fn saturate_code(code: i64) -> i32 {
    i32::try_from(code).unwrap_or(if code < 0 { i32::MIN } else { i32::MAX })
}
