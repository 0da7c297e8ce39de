// src/types.rs

//! Small shared types handed between the pipeline and its collaborators.

use std::path::PathBuf;

/// Canonical host name type.
pub type HostName = String;

/// Canonical task name type.
pub type TaskName = String;

/// Subset of the inventory a run targets, as supplied by the inventory
/// collaborator.
///
/// An empty selection means "every host the playbook addresses".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostSelection {
    pub hosts: Vec<HostName>,
    pub groups: Vec<String>,
}

impl HostSelection {
    pub fn new(hosts: Vec<HostName>, groups: Vec<String>) -> Self {
        Self { hosts, groups }
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty() && self.groups.is_empty()
    }

    /// Comma-separated limit pattern understood by the engine, hosts first.
    ///
    /// Returns `None` for an empty selection.
    pub fn limit_pattern(&self) -> Option<String> {
        if self.is_empty() {
            return None;
        }
        let parts: Vec<&str> = self
            .hosts
            .iter()
            .chain(self.groups.iter())
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(","))
        }
    }
}

/// Everything an event source needs to start one run.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub playbook: PathBuf,
    pub selection: HostSelection,
    /// Parallelism hint passed straight through to the engine.
    pub forks: u32,
}
