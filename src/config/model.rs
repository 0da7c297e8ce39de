// src/config/model.rs

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::errors::PlaylogError;
use crate::store::RateLimit;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [logging]
/// persist = true
/// logs_root = "logs"
/// max_size_bytes = 1048576
/// rate_limit = 10
/// rate_window_secs = 60
///
/// [run]
/// forks = 5
/// verbose = false
///
/// [engine]
/// command = "ansible-playbook-events"
/// args = []
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawConfigFile {
    #[serde(default)]
    pub logging: LoggingSection,

    #[serde(default)]
    pub run: RunSection,

    #[serde(default)]
    pub engine: EngineSection,
}

/// Validated configuration.
///
/// Only obtainable through `TryFrom<RawConfigFile>`, so holders can rely on
/// the checks in [`crate::config::validate`].
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub logging: LoggingSection,
    pub run: RunSection,
    pub engine: EngineSection,
}

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = PlaylogError;

    fn try_from(raw: RawConfigFile) -> Result<Self, Self::Error> {
        crate::config::validate::validate_config(&raw)?;
        Ok(Self {
            logging: raw.logging,
            run: raw.run,
            engine: raw.engine,
        })
    }
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            logging: LoggingSection::default(),
            run: RunSection::default(),
            engine: EngineSection::default(),
        }
    }
}

impl ConfigFile {
    pub fn logs_root(&self) -> PathBuf {
        PathBuf::from(&self.logging.logs_root)
    }

    /// Rate limit shared by the audit and debug log streams.
    pub fn rate_limit(&self) -> RateLimit {
        RateLimit {
            max_writes: self.logging.rate_limit,
            window: Duration::from_secs(self.logging.rate_window_secs),
        }
    }
}

/// `[logging]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSection {
    /// Write the per-run log directory when a run completes.
    #[serde(default = "default_persist")]
    pub persist: bool,

    /// Root directory for run directories and the audit/debug streams.
    #[serde(default = "default_logs_root")]
    pub logs_root: String,

    /// Size at which the audit/debug streams rotate to a new file.
    ///
    /// This is a soft bound: concurrent writers may overshoot it.
    #[serde(default = "default_max_size_bytes")]
    pub max_size_bytes: u64,

    /// Writes accepted per rate window on each log stream.
    #[serde(default = "default_rate_limit")]
    pub rate_limit: u32,

    #[serde(default = "default_rate_window_secs")]
    pub rate_window_secs: u64,
}

fn default_persist() -> bool {
    true
}

fn default_logs_root() -> String {
    "logs".to_string()
}

fn default_max_size_bytes() -> u64 {
    1024 * 1024
}

fn default_rate_limit() -> u32 {
    10
}

fn default_rate_window_secs() -> u64 {
    60
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            persist: default_persist(),
            logs_root: default_logs_root(),
            max_size_bytes: default_max_size_bytes(),
            rate_limit: default_rate_limit(),
            rate_window_secs: default_rate_window_secs(),
        }
    }
}

/// `[run]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct RunSection {
    /// Parallelism hint handed to the engine; the pipeline itself is
    /// single-threaded.
    #[serde(default = "default_forks")]
    pub forks: u32,

    /// Print the trailing counters line after the summary.
    #[serde(default)]
    pub verbose: bool,
}

fn default_forks() -> u32 {
    5
}

impl Default for RunSection {
    fn default() -> Self {
        Self {
            forks: default_forks(),
            verbose: false,
        }
    }
}

/// `[engine]` section.
///
/// The engine command must print one JSON event per line on stdout.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineSection {
    #[serde(default = "default_engine_command")]
    pub command: String,

    /// Extra arguments placed before the playbook path.
    #[serde(default)]
    pub args: Vec<String>,
}

fn default_engine_command() -> String {
    "ansible-playbook-events".to_string()
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            command: default_engine_command(),
            args: Vec::new(),
        }
    }
}
