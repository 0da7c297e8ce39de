// src/engine/aggregator.rs

//! Pure core of a run.
//!
//! [`RunAggregator`] consumes [`RunEvent`]s one at a time and builds the
//! [`RunResult`]. It has no event source, no filesystem and no clock; the
//! IO shell ([`super::runner::Runner`]) drives it.

use indexmap::IndexMap;
use serde::Serialize;
use tracing::debug;

use crate::classify::{classify_event, TaskOutcome};
use crate::event::RunEvent;
use crate::types::HostName;

/// Where an accepted outcome was stored, in arrival order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Host { host: usize, position: usize },
    Unmatched { position: usize },
}

/// Outcomes of one run, grouped per host.
///
/// Hosts iterate in the order they were first seen. Sentinel outcomes that
/// name no host are kept apart in [`RunResult::unmatched`], so a run where
/// nothing matched has no hosts at all.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunResult {
    hosts: IndexMap<HostName, Vec<TaskOutcome>>,
    unmatched: Vec<TaskOutcome>,
    #[serde(skip)]
    arrival: Vec<Slot>,
}

impl RunResult {
    /// True when no host produced an outcome.
    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    pub fn host_count(&self) -> usize {
        self.hosts.len()
    }

    /// Every accepted outcome, host-less sentinels included.
    pub fn outcome_count(&self) -> usize {
        self.arrival.len()
    }

    pub fn hosts(&self) -> impl Iterator<Item = (&str, &[TaskOutcome])> + '_ {
        self.hosts
            .iter()
            .map(|(host, outcomes)| (host.as_str(), outcomes.as_slice()))
    }

    pub fn outcomes(&self, host: &str) -> Option<&[TaskOutcome]> {
        self.hosts.get(host).map(Vec::as_slice)
    }

    /// Sentinel outcomes not attributed to any host.
    pub fn unmatched(&self) -> &[TaskOutcome] {
        &self.unmatched
    }

    /// All outcomes in the order they were accepted, with their host.
    pub fn in_arrival_order(&self) -> impl Iterator<Item = (Option<&str>, &TaskOutcome)> + '_ {
        self.arrival.iter().filter_map(|slot| match *slot {
            Slot::Host { host, position } => {
                let (name, outcomes) = self.hosts.get_index(host)?;
                Some((Some(name.as_str()), outcomes.get(position)?))
            }
            Slot::Unmatched { position } => Some((None, self.unmatched.get(position)?)),
        })
    }

    /// Record one outcome; `None` host means run level.
    pub fn push(&mut self, host: Option<&str>, outcome: TaskOutcome) {
        let slot = match host {
            Some(host) => {
                let entry = self.hosts.entry(host.to_string());
                let index = entry.index();
                let outcomes = entry.or_default();
                outcomes.push(outcome);
                Slot::Host {
                    host: index,
                    position: outcomes.len() - 1,
                }
            }
            None => {
                self.unmatched.push(outcome);
                Slot::Unmatched {
                    position: self.unmatched.len() - 1,
                }
            }
        };
        self.arrival.push(slot);
    }
}

/// Incremental builder of a [`RunResult`] and the run's overall retval.
#[derive(Debug, Default)]
pub struct RunAggregator {
    result: RunResult,
    retval: i32,
    events_seen: usize,
}

impl RunAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one event. Returns `true` when it produced an outcome.
    pub fn step(&mut self, event: &RunEvent) -> bool {
        self.events_seen += 1;
        let Some(outcome) = classify_event(event) else {
            return false;
        };

        if self.retval == 0 && outcome.retval != 0 {
            self.retval = outcome.retval;
        }

        debug!(
            host = event.host.as_deref().unwrap_or("-"),
            task = %outcome.task,
            retval = outcome.retval,
            status = %outcome.status,
            "outcome accepted"
        );
        self.result.push(event.host.as_deref(), outcome);
        true
    }

    /// First non-zero outcome retval so far, or 0.
    pub fn retval(&self) -> i32 {
        self.retval
    }

    pub fn events_seen(&self) -> usize {
        self.events_seen
    }

    pub fn result(&self) -> &RunResult {
        &self.result
    }

    pub fn finish(self) -> (i32, RunResult) {
        (self.retval, self.result)
    }
}
