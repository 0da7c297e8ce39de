// src/store/mod.rs

//! Durable run logs.
//!
//! - [`entry`]: the persisted record type and call-site metadata.
//! - [`rate`]: per-stream write rate limiting.
//! - [`rotation`]: choosing the current numbered file of a stream.
//! - [`writer`]: synchronous and buffered streams built from the above.
//! - [`run_dir`]: one directory of outcome files per finished run.
//!
//! Every file goes through the [`crate::fs::FileSystem`] seam and is written
//! append-only with owner-only permissions.

pub mod entry;
pub mod rate;
pub mod rotation;
pub mod run_dir;
pub mod writer;

pub use entry::{CallSite, Facility, LogBody, LogEntry, Severity};
pub use rate::{RateLimit, RateLimiter};
pub use rotation::{natural_cmp, LogFile};
pub use run_dir::{RunLogStore, RunRecord};
pub use writer::{with_log, StructuredLog, WriteMode};
