#![allow(dead_code)]

use std::path::Path;

use playlog::config::{ConfigFile, RawConfigFile};
use playlog::event::{EventKind, Payload, RunEvent};
use serde_json::{json, Map, Value};

/// Builder for `RunEvent` to simplify test setup.
pub struct EventBuilder {
    event: RunEvent,
}

impl EventBuilder {
    pub fn new(kind: EventKind) -> Self {
        Self {
            event: RunEvent::new(kind),
        }
    }

    pub fn ok(host: &str, task: &str) -> Self {
        Self::new(EventKind::Ok).host(host).task(task)
    }

    pub fn failed(host: &str, task: &str) -> Self {
        Self::new(EventKind::Failed).host(host).task(task)
    }

    pub fn unreachable(host: &str, task: &str) -> Self {
        Self::new(EventKind::Unreachable).host(host).task(task)
    }

    pub fn skipped(host: &str, task: &str) -> Self {
        Self::new(EventKind::Skipped).host(host).task(task)
    }

    pub fn no_hosts_matched() -> Self {
        Self::new(EventKind::NoHostsMatched)
    }

    pub fn host(mut self, host: &str) -> Self {
        self.event.host = Some(host.to_string());
        self
    }

    pub fn task(mut self, task: &str) -> Self {
        self.event.task = Some(task.to_string());
        self
    }

    pub fn payload(mut self, payload: PayloadBuilder) -> Self {
        self.event.result = payload.build();
        self
    }

    pub fn times(mut self, start: &str, end: &str) -> Self {
        self.event.start = Some(start.to_string());
        self.event.end = Some(end.to_string());
        self
    }

    pub fn build(self) -> RunEvent {
        self.event
    }
}

/// Builder for the opaque event payload.
#[derive(Default)]
pub struct PayloadBuilder {
    fields: Map<String, Value>,
}

impl PayloadBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, key: &str, value: Value) -> Self {
        self.fields.insert(key.to_string(), value);
        self
    }

    pub fn rc(self, rc: i32) -> Self {
        self.set("rc", json!(rc))
    }

    pub fn stdout(self, text: &str) -> Self {
        self.set("stdout", json!(text))
    }

    pub fn stdout_lines(self, lines: &[&str]) -> Self {
        self.set("stdout_lines", json!(lines))
    }

    pub fn stderr(self, text: &str) -> Self {
        self.set("stderr", json!(text))
    }

    pub fn stderr_lines(self, lines: &[&str]) -> Self {
        self.set("stderr_lines", json!(lines))
    }

    pub fn msg(self, text: &str) -> Self {
        self.set("msg", json!(text))
    }

    pub fn unreachable(self) -> Self {
        self.set("unreachable", json!(true))
    }

    pub fn skipped(self) -> Self {
        self.set("skipped", json!(true))
    }

    pub fn fact(mut self, key: &str, value: Value) -> Self {
        let facts = self
            .fields
            .entry("ansible_facts")
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(map) = facts {
            map.insert(key.to_string(), value);
        }
        self
    }

    pub fn build(self) -> Payload {
        Payload::new(Value::Object(self.fields))
    }
}

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    pub fn logs_root(mut self, root: impl AsRef<Path>) -> Self {
        self.config.logging.logs_root = root.as_ref().display().to_string();
        self
    }

    pub fn persist(mut self, persist: bool) -> Self {
        self.config.logging.persist = persist;
        self
    }

    pub fn max_size_bytes(mut self, bytes: u64) -> Self {
        self.config.logging.max_size_bytes = bytes;
        self
    }

    pub fn rate_limit(mut self, writes: u32, window_secs: u64) -> Self {
        self.config.logging.rate_limit = writes;
        self.config.logging.rate_window_secs = window_secs;
        self
    }

    pub fn forks(mut self, forks: u32) -> Self {
        self.config.run.forks = forks;
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.config.run.verbose = verbose;
        self
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}
