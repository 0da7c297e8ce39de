// src/event/command.rs

//! Engine process wrapper.
//!
//! Spawns the configured engine command and reads its stdout as a JSON-lines
//! event stream. The engine's stderr is inherited so its own diagnostics stay
//! visible.

use std::io::BufReader;
use std::process::{Child, ChildStdout, Command, Stdio};

use tracing::{debug, info, warn};

use crate::errors::{PlaylogError, Result};
use crate::event::{EventSource, JsonLinesSource, RunEvent};
use crate::types::RunRequest;

#[derive(Debug)]
pub struct CommandSource {
    program: String,
    args: Vec<String>,
    child: Option<Child>,
    events: Option<JsonLinesSource<BufReader<ChildStdout>>>,
    started: bool,
}

impl CommandSource {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            child: None,
            events: None,
            started: false,
        }
    }

    /// Full argument list for one run:
    /// `{args} {playbook} [--limit {selection}] --forks {n}`.
    pub fn command_args(&self, request: &RunRequest) -> Vec<String> {
        let mut args = self.args.clone();
        args.push(request.playbook.display().to_string());
        if let Some(limit) = request.selection.limit_pattern() {
            args.push("--limit".to_string());
            args.push(limit);
        }
        args.push("--forks".to_string());
        args.push(request.forks.to_string());
        args
    }

    /// Reap the engine once its stream is exhausted.
    ///
    /// A non-zero exit code is normal when tasks failed; only death by signal
    /// counts as an abnormal end.
    fn finish(&mut self) -> Result<()> {
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };
        let status = child.wait()?;
        match status.code() {
            Some(code) => {
                debug!(program = %self.program, exit_code = code, "engine exited");
                Ok(())
            }
            None => Err(PlaylogError::EventSource(format!(
                "engine '{}' terminated abnormally ({status})",
                self.program
            ))),
        }
    }
}

impl EventSource for CommandSource {
    fn start(&mut self, request: &RunRequest) -> Result<()> {
        let args = self.command_args(request);
        info!(program = %self.program, ?args, "starting engine");

        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| PlaylogError::RunStart(format!("spawning '{}': {e}", self.program)))?;

        let stdout = child.stdout.take().ok_or_else(|| {
            PlaylogError::RunStart(format!("no stdout pipe for '{}'", self.program))
        })?;

        self.events = Some(JsonLinesSource::new(BufReader::new(stdout)));
        self.child = Some(child);
        self.started = true;
        Ok(())
    }

    fn next_event(&mut self) -> Result<Option<RunEvent>> {
        let Some(events) = self.events.as_mut() else {
            if self.started {
                return Ok(None);
            }
            return Err(PlaylogError::EventSource(
                "engine was not started".to_string(),
            ));
        };
        match events.next_event()? {
            Some(event) => Ok(Some(event)),
            None => {
                self.events = None;
                self.finish()?;
                Ok(None)
            }
        }
    }
}

impl Drop for CommandSource {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.kill() {
                debug!(error = %e, "engine already gone on drop");
            }
            if let Err(e) = child.wait() {
                warn!(error = %e, "failed to reap engine process");
            }
        }
    }
}
