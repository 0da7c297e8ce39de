// src/report/mod.rs

//! Human-readable run reporting.
//!
//! Output is a list of styled lines (text plus a style tag). Turning a tag
//! into colours is left to whoever prints the lines; the same lines are also
//! stored verbatim in the debug log.

use serde::Serialize;

pub mod summary;

pub use summary::{host_style, render_summary, Counters, Summary};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Style {
    Success,
    Skipped,
    Unreachable,
    Failed,
    NoHostsMatched,
    Stdout,
    Stderr,
    Plain,
    Dim,
    Summary,
}

/// One line of text with its style tag. Serializes as `[text, style]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StyledLine(pub String, pub Style);

impl StyledLine {
    pub fn new(text: impl Into<String>, style: Style) -> Self {
        Self(text.into(), style)
    }

    pub fn text(&self) -> &str {
        &self.0
    }

    pub fn style(&self) -> Style {
        self.1
    }
}
