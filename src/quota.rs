//! # Quota Tracker
//! Per-identity request allowance over a fixed window (default 60s).
//!
//! State lives in memory for the process lifetime. Entries are created lazily on
//! the first request of an identity and never evicted.

use std::{
    collections::HashMap,
    sync::Mutex,
    time::{Duration, Instant},
};

use crate::error::RateLimited;

pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy)]
struct QuotaState {
    remaining: u32,
    window_start: Instant,
}

/// Thread-safe quota store. One lock guards the whole check-and-decrement, so two
/// concurrent requests for the same identity can never both spend the last unit.
#[derive(Debug)]
pub struct QuotaTracker {
    inner: Mutex<HashMap<String, QuotaState>>,
    limit: u32,
    window: Duration,
}

impl QuotaTracker {
    pub fn new(limit: u32) -> Self {
        Self::with_window(limit, DEFAULT_WINDOW)
    }

    pub fn with_window(limit: u32, window: Duration) -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
            limit,
            window,
        }
    }

    /// Spend one unit of `identity`'s allowance.
    pub fn consume(&self, identity: &str) -> Result<(), RateLimited> {
        self.consume_at(identity, Instant::now())
    }

    /// Same as [`consume`](Self::consume) with an explicit clock reading.
    pub fn consume_at(&self, identity: &str, now: Instant) -> Result<(), RateLimited> {
        let mut map = self.inner.lock().unwrap_or_else(|p| p.into_inner());
        let state = map.entry(identity.to_string()).or_insert(QuotaState {
            remaining: self.limit,
            window_start: now,
        });

        if now.saturating_duration_since(state.window_start) >= self.window {
            state.remaining = self.limit;
            state.window_start = now;
        }

        if state.remaining == 0 {
            return Err(RateLimited);
        }
        state.remaining -= 1;
        Ok(())
    }

    /// Units left in the current window; `None` if the identity was never seen.
    pub fn remaining(&self, identity: &str) -> Option<u32> {
        let map = self.inner.lock().unwrap_or_else(|p| p.into_inner());
        map.get(identity).map(|s| s.remaining)
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn window_secs(&self) -> u64 {
        self.window.as_secs()
    }
}
