// src/store/writer.rs

//! Rotating, rate-limited structured log streams.
//!
//! A [`StructuredLog`] is an explicitly constructed handle; nothing about it
//! is global. Its lifecycle is `open` → `append`* → `close` (or scope it with
//! [`with_log`], which flushes on every exit path).
//!
//! Two write disciplines:
//! - [`WriteMode::Synchronous`]: every accepted entry is appended to disk
//!   immediately. Exceeding the rate limit is fatal.
//! - [`WriteMode::Buffered`]: entries stay in memory until [`StructuredLog::flush`].
//!   Exceeding the rate limit drops the entry.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::call_site;
use crate::errors::{PlaylogError, Result};
use crate::fs::FileSystem;
use crate::store::entry::{Facility, LogEntry, Severity};
use crate::store::rate::{RateLimit, RateLimiter};
use crate::store::rotation::LogFile;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    Synchronous,
    Buffered,
}

#[derive(Debug)]
pub struct StructuredLog {
    name: String,
    file: LogFile,
    mode: WriteMode,
    limiter: RateLimiter,
    buffer: Vec<LogEntry>,
    dropped: u64,
    fs: Arc<dyn FileSystem>,
}

impl StructuredLog {
    /// Open a stream, creating its directory if needed.
    pub fn open(
        name: impl Into<String>,
        file: LogFile,
        mode: WriteMode,
        limit: RateLimit,
        fs: Arc<dyn FileSystem>,
    ) -> Result<Self> {
        fs.create_dir_all(&file.directory)?;
        Ok(Self {
            name: name.into(),
            file,
            mode,
            limiter: RateLimiter::new(limit),
            buffer: Vec::new(),
            dropped: 0,
            fs,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mode(&self) -> WriteMode {
        self.mode
    }

    pub fn log_file(&self) -> &LogFile {
        &self.file
    }

    /// Entries waiting for the next flush.
    pub fn pending(&self) -> &[LogEntry] {
        &self.buffer
    }

    /// Entries discarded by the rate limiter (buffered streams only).
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Accept one entry.
    ///
    /// Synchronous streams write it right away and fail with
    /// [`PlaylogError::RateLimitExceeded`] once the window is full. Buffered
    /// streams queue it, or silently drop it when the window is full.
    pub fn append(&mut self, entry: LogEntry) -> Result<()> {
        if !self.limiter.try_acquire() {
            return self.reject(entry);
        }

        match self.mode {
            WriteMode::Synchronous => {
                self.write_batch(std::slice::from_ref(&entry))?;
            }
            WriteMode::Buffered => self.buffer.push(entry),
        }
        Ok(())
    }

    fn reject(&mut self, entry: LogEntry) -> Result<()> {
        let limit = self.limiter.limit();
        match self.mode {
            WriteMode::Synchronous => {
                error!(
                    stream = %self.name,
                    limit = limit.max_writes,
                    window_secs = limit.window.as_secs(),
                    "synchronous log flooded; refusing write"
                );
                Err(PlaylogError::RateLimitExceeded {
                    stream: self.name.clone(),
                    limit: limit.max_writes,
                    window_secs: limit.window.as_secs(),
                })
            }
            WriteMode::Buffered => {
                self.dropped += 1;
                debug!(
                    stream = %self.name,
                    severity = ?entry.severity,
                    dropped = self.dropped,
                    "rate limit reached; entry dropped"
                );
                Ok(())
            }
        }
    }

    /// Write out buffered entries as one append, then clear the buffer.
    ///
    /// On a synchronous stream there is nothing to flush; the misuse is
    /// recorded as a warning entry in the stream itself instead of failing.
    /// If the write fails the buffer is kept.
    pub fn flush(&mut self) -> Result<()> {
        match self.mode {
            WriteMode::Synchronous => {
                warn!(stream = %self.name, "flush called on a synchronous log");
                let entry = LogEntry::plain(
                    Severity::Warning,
                    Facility::Store,
                    call_site!("flush"),
                    [format!(
                        "flush requested on synchronous log '{}'; entries are already on disk",
                        self.name
                    )],
                );
                self.write_batch(std::slice::from_ref(&entry))?;
                Ok(())
            }
            WriteMode::Buffered => {
                if self.buffer.is_empty() {
                    return Ok(());
                }
                self.write_batch(&self.buffer)?;
                self.buffer.clear();
                Ok(())
            }
        }
    }

    /// Flush what is pending and release the handle.
    pub fn close(mut self) -> Result<()> {
        match self.mode {
            WriteMode::Synchronous => Ok(()),
            WriteMode::Buffered => self.flush(),
        }
    }

    fn write_batch(&self, entries: &[LogEntry]) -> Result<PathBuf> {
        let target = self.file.resolve_target(self.fs.as_ref())?;
        let bytes = serde_yaml::to_string(entries)?;
        self.fs.append(&target, bytes.as_bytes())?;
        debug!(
            stream = %self.name,
            path = %target.display(),
            entries = entries.len(),
            "log entries appended"
        );
        Ok(target)
    }
}

/// Run `f` against `log`, then flush a buffered log whatever `f` returned.
///
/// An error from `f` wins over a flush error; the flush error is still
/// reported through tracing.
pub fn with_log<T, F>(log: &mut StructuredLog, f: F) -> Result<T>
where
    F: FnOnce(&mut StructuredLog) -> Result<T>,
{
    let result = f(log);
    let flushed = match log.mode() {
        WriteMode::Synchronous => Ok(()),
        WriteMode::Buffered => log.flush(),
    };

    match (result, flushed) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(flush_err)) => Err(flush_err),
        (Err(err), Ok(())) => Err(err),
        (Err(err), Err(flush_err)) => {
            error!(stream = %log.name(), error = %flush_err, "flush failed after error");
            Err(err)
        }
    }
}
