//! Sliding-window rate limiter for outbound calls.

use std::collections::VecDeque;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// Allows at most `max_calls` within any rolling `window`.
///
/// Callers over quota are delayed, never rejected: [`RateLimiter::acquire`]
/// sleeps until the oldest recorded call leaves the window and tries again.
#[derive(Debug)]
pub struct RateLimiter {
    max_calls: usize,
    window: Duration,
    calls: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    pub fn new(max_calls: usize, window: Duration) -> Self {
        Self {
            max_calls: max_calls.max(1),
            window,
            calls: Mutex::new(VecDeque::with_capacity(max_calls.max(1))),
        }
    }

    pub fn from_config(cfg: &dispatch_core::RateLimitConfig) -> Self {
        Self::new(cfg.max_calls, cfg.window())
    }

    pub fn max_calls(&self) -> usize {
        self.max_calls
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Wait until a call is permitted, then record it.
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut calls = self.calls.lock().await;
                let now = Instant::now();
                self.evict_expired(&mut calls, now);

                if calls.len() < self.max_calls {
                    calls.push_back(now);
                    return;
                }

                // Full window: the front entry is the oldest call.
                match calls.front() {
                    Some(&oldest) => (oldest + self.window).saturating_duration_since(now),
                    None => Duration::ZERO,
                }
            };

            tracing::debug!(
                wait_ms = wait.as_millis() as u64,
                max_calls = self.max_calls,
                "rate limit reached, waiting for a free slot"
            );
            tokio::time::sleep(wait).await;
        }
    }

    /// Record a call if a slot is free right now.
    pub async fn try_acquire(&self) -> bool {
        let mut calls = self.calls.lock().await;
        let now = Instant::now();
        self.evict_expired(&mut calls, now);

        if calls.len() < self.max_calls {
            calls.push_back(now);
            true
        } else {
            false
        }
    }

    /// Free slots in the current window.
    pub async fn remaining(&self) -> usize {
        let mut calls = self.calls.lock().await;
        self.evict_expired(&mut calls, Instant::now());
        self.max_calls.saturating_sub(calls.len())
    }

    fn evict_expired(&self, calls: &mut VecDeque<Instant>, now: Instant) {
        while let Some(&first) = calls.front() {
            if now.saturating_duration_since(first) >= self.window {
                calls.pop_front();
            } else {
                break;
            }
        }
    }
}
