// src/store/rate.rs

//! Per-stream write rate limiting.

use std::time::{Duration, Instant};

/// Ceiling of writes accepted per window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    pub max_writes: u32,
    pub window: Duration,
}

impl Default for RateLimit {
    fn default() -> Self {
        Self {
            max_writes: 10,
            window: Duration::from_secs(60),
        }
    }
}

/// Counts writes on one log stream.
///
/// The window restarts once more than `window` has elapsed since the last
/// accepted write. Rejected writes leave the state untouched. State is local
/// to one handle; there is no cross-process coordination.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    limit: RateLimit,
    last_write: Option<Instant>,
    writes_in_window: u32,
}

impl RateLimiter {
    pub fn new(limit: RateLimit) -> Self {
        Self {
            limit,
            last_write: None,
            writes_in_window: 0,
        }
    }

    pub fn limit(&self) -> RateLimit {
        self.limit
    }

    pub fn writes_in_window(&self) -> u32 {
        self.writes_in_window
    }

    /// Try to account for one write at `now`. Returns `false` when the
    /// ceiling is already reached.
    pub fn try_acquire_at(&mut self, now: Instant) -> bool {
        if let Some(last) = self.last_write {
            if now.saturating_duration_since(last) > self.limit.window {
                self.writes_in_window = 0;
            }
        }

        if self.writes_in_window >= self.limit.max_writes {
            return false;
        }

        self.writes_in_window += 1;
        self.last_write = Some(now);
        true
    }

    pub fn try_acquire(&mut self) -> bool {
        self.try_acquire_at(Instant::now())
    }
}
