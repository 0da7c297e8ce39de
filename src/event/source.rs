// src/event/source.rs

//! Pluggable event source abstraction.
//!
//! The runner pulls events one at a time from an `EventSource`. Production
//! code uses [`JsonLinesSource`] over a file, stdin or an engine process
//! ([`super::CommandSource`]); tests provide scripted sources.

use std::io::BufRead;

use tracing::trace;

use crate::errors::{PlaylogError, Result};
use crate::event::RunEvent;
use crate::types::RunRequest;

/// Trait abstracting where run events come from.
pub trait EventSource {
    /// Begin the run. An error here means the run never started.
    fn start(&mut self, _request: &RunRequest) -> Result<()> {
        Ok(())
    }

    /// Block until the next event arrives.
    ///
    /// `Ok(None)` is a clean end of stream; `Err` is an abnormal termination
    /// of the underlying run.
    fn next_event(&mut self) -> Result<Option<RunEvent>>;
}

impl<S: EventSource + ?Sized> EventSource for Box<S> {
    fn start(&mut self, request: &RunRequest) -> Result<()> {
        (**self).start(request)
    }

    fn next_event(&mut self) -> Result<Option<RunEvent>> {
        (**self).next_event()
    }
}

/// Reads one JSON-encoded [`RunEvent`] per line.
///
/// Blank lines are skipped. A line that does not parse ends the stream with
/// an error, since later lines can no longer be trusted to belong to the run.
#[derive(Debug)]
pub struct JsonLinesSource<R> {
    reader: R,
    line_no: usize,
    buf: String,
}

impl<R: BufRead> JsonLinesSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line_no: 0,
            buf: String::new(),
        }
    }
}

impl<R: BufRead> EventSource for JsonLinesSource<R> {
    fn next_event(&mut self) -> Result<Option<RunEvent>> {
        loop {
            self.buf.clear();
            let read = self.reader.read_line(&mut self.buf)?;
            if read == 0 {
                return Ok(None);
            }
            self.line_no += 1;

            let line = self.buf.trim();
            if line.is_empty() {
                continue;
            }

            let event: RunEvent = serde_json::from_str(line).map_err(|e| {
                PlaylogError::EventSource(format!("line {}: {}", self.line_no, e))
            })?;
            trace!(line = self.line_no, kind = %event.kind, "read event");
            return Ok(Some(event));
        }
    }
}
