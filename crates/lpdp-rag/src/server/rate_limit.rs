//! Per-session cooldown between accepted questions

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::time::Duration;
use tokio::time::Instant;

use crate::error::{Error, Result};

pub const RATE_LIMITED: &str = "Silakan tunggu sebentar sebelum mengirim pertanyaan lagi";

/// Accepts at most one request per key per window
pub struct RateLimiter {
    window: Duration,
    last_accepted: DashMap<String, Instant>,
}

impl RateLimiter {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_accepted: DashMap::new(),
        }
    }

    pub fn from_secs(secs: f64) -> Self {
        let window = Duration::try_from_secs_f64(secs.max(0.0)).unwrap_or(Duration::MAX);
        Self::new(window)
    }

    /// Record an accepted request for `key`, or fail with `RateLimited` if
    /// the previous one is still inside the window
    pub fn check(&self, key: &str) -> Result<()> {
        let now = Instant::now();
        match self.last_accepted.entry(key.to_string()) {
            Entry::Occupied(mut entry) => {
                if now.duration_since(*entry.get()) < self.window {
                    return Err(Error::RateLimited(RATE_LIMITED.to_string()));
                }
                entry.insert(now);
            }
            Entry::Vacant(entry) => {
                entry.insert(now);
            }
        }
        Ok(())
    }
}
