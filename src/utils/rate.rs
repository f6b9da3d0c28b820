// src/utils/rate.rs

//! Outbound call rate limiting.
//!
//! Throttles upstream API calls to a configured maximum per minute by
//! spacing call slots evenly. `acquire` blocks the caller until its slot
//! comes up; the first call goes through immediately.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{Instant, sleep_until};

/// Evenly-spaced per-minute rate limiter.
pub struct RateLimiter {
    interval: Duration,
    next_slot: Mutex<Instant>,
}

impl RateLimiter {
    /// Create a limiter allowing `calls` acquisitions per minute.
    pub fn per_minute(calls: u32) -> Self {
        let calls = calls.max(1);
        Self {
            interval: Duration::from_secs(60) / calls,
            next_slot: Mutex::new(Instant::now()),
        }
    }

    /// Spacing between two consecutive slots.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Wait until the next call slot is available.
    pub async fn acquire(&self) {
        let slot = {
            let mut next = self.next_slot.lock().await;
            let slot = (*next).max(Instant::now());
            *next = slot + self.interval;
            slot
        };
        sleep_until(slot).await;
    }
}
