use std::time::{Duration, Instant};

use dashmap::DashMap;

const LOGIN_WINDOW: Duration = Duration::from_secs(15 * 60);
const MAX_LOGIN_FAILURES: u32 = 5;

/// How often expired login windows are swept from memory.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Per-email login brute force limiter: 5 failures per 15 minutes.
pub struct LoginRateLimiter {
    /// lowercased email -> (failed_count, window_start)
    entries: DashMap<String, (u32, Instant)>,
}

impl Default for LoginRateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

impl LoginRateLimiter {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Err carries the seconds until the window resets. Does not count the
    /// attempt; call `record_failure` when the password is wrong.
    pub fn check(&self, email: &str) -> Result<(), u64> {
        self.check_at(email, Instant::now())
    }

    pub fn record_failure(&self, email: &str) {
        self.record_failure_at(email, Instant::now());
    }

    /// Forget failures after a successful login.
    pub fn clear(&self, email: &str) {
        self.entries.remove(&email.to_lowercase());
    }

    /// Drop entries whose window has closed. Failures for unknown emails would
    /// otherwise accumulate until restart.
    pub fn cleanup(&self) {
        self.cleanup_at(Instant::now());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn cleanup_at(&self, now: Instant) {
        self.entries
            .retain(|_, (_, start)| now.duration_since(*start) <= LOGIN_WINDOW);
    }

    fn check_at(&self, email: &str, now: Instant) -> Result<(), u64> {
        let Some(entry) = self.entries.get(&email.to_lowercase()) else {
            return Ok(());
        };
        let (count, start) = *entry.value();

        let elapsed = now.duration_since(start);
        if elapsed > LOGIN_WINDOW || count < MAX_LOGIN_FAILURES {
            return Ok(());
        }
        Err(LOGIN_WINDOW.saturating_sub(elapsed).as_secs())
    }

    fn record_failure_at(&self, email: &str, now: Instant) {
        let mut entry = self.entries.entry(email.to_lowercase()).or_insert((0, now));
        let (count, start) = entry.value_mut();

        if now.duration_since(*start) > LOGIN_WINDOW {
            *count = 1;
            *start = now;
        } else {
            *count += 1;
        }
    }
}
