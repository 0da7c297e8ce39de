use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use playlog::errors::{PlaylogError, Result};
use playlog::event::{EventSource, RunEvent};
use playlog::types::RunRequest;
use tracing::debug;

/// A scripted event source that:
/// - records the request it was started with
/// - replays a fixed list of events
/// - can refuse to start, or abort after a number of events.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    events: VecDeque<RunEvent>,
    fail_start: Option<String>,
    abort_after: Option<(usize, String)>,
    delivered: usize,
    requests: Arc<Mutex<Vec<RunRequest>>>,
}

impl ScriptedSource {
    pub fn new(events: Vec<RunEvent>) -> Self {
        Self {
            events: events.into(),
            ..Self::default()
        }
    }

    /// `start` fails with a run-start error.
    pub fn failing_start(mut self, reason: &str) -> Self {
        self.fail_start = Some(reason.to_string());
        self
    }

    /// After `count` events, `next_event` fails instead of continuing.
    pub fn abort_after(mut self, count: usize, reason: &str) -> Self {
        self.abort_after = Some((count, reason.to_string()));
        self
    }

    /// Shared handle on the requests passed to `start`.
    pub fn requests(&self) -> Arc<Mutex<Vec<RunRequest>>> {
        Arc::clone(&self.requests)
    }
}

impl EventSource for ScriptedSource {
    fn start(&mut self, request: &RunRequest) -> Result<()> {
        self.requests.lock().unwrap().push(request.clone());
        match &self.fail_start {
            Some(reason) => Err(PlaylogError::RunStart(reason.clone())),
            None => Ok(()),
        }
    }

    fn next_event(&mut self) -> Result<Option<RunEvent>> {
        if let Some((count, reason)) = &self.abort_after {
            if self.delivered >= *count {
                debug!(delivered = self.delivered, reason = %reason, "scripted source aborting");
                return Err(PlaylogError::EventSource(reason.clone()));
            }
        }
        let next = self.events.pop_front();
        match &next {
            Some(event) => {
                self.delivered += 1;
                debug!(kind = ?event.kind, delivered = self.delivered, "scripted event");
            }
            None => debug!(delivered = self.delivered, "scripted source exhausted"),
        }
        Ok(next)
    }
}
