//! Sliding-window rate limiter for the public ingestion endpoints.
//!
//! Keys are client addresses. State is in-memory and resets on restart;
//! share it via `Arc<RateLimiter>`.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Result of a rejected check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Throttled {
    /// Time until the oldest attempt in the window expires
    pub retry_after: Duration,
}

impl Throttled {
    /// Whole seconds, rounded up, never zero
    pub fn retry_after_secs(&self) -> u64 {
        let secs = self.retry_after.as_secs();
        if self.retry_after.subsec_nanos() > 0 || secs == 0 {
            secs + 1
        } else {
            secs
        }
    }
}

pub struct RateLimiter {
    attempts: Mutex<HashMap<String, Vec<Instant>>>,
    max_requests: usize,
    window: Duration,
}

impl RateLimiter {
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            attempts: Mutex::new(HashMap::new()),
            max_requests,
            window,
        }
    }

    /// Record a request for `key`, or reject it when the window is full.
    pub fn check(&self, key: &str) -> Result<(), Throttled> {
        self.check_at(key, Instant::now())
    }

    fn check_at(&self, key: &str, now: Instant) -> Result<(), Throttled> {
        let mut attempts = self.attempts.lock();
        let entry = attempts.entry(key.to_string()).or_default();
        entry.retain(|t| now.duration_since(*t) < self.window);

        if entry.len() >= self.max_requests {
            let oldest = entry.first().copied().unwrap_or(now);
            return Err(Throttled {
                retry_after: self.window.saturating_sub(now.duration_since(oldest)),
            });
        }
        entry.push(now);
        Ok(())
    }

    /// Drop keys with no attempts left in the window
    pub fn cleanup(&self) {
        let now = Instant::now();
        let mut attempts = self.attempts.lock();
        attempts.retain(|_, entries| {
            entries.retain(|t| now.duration_since(*t) < self.window);
            !entries.is_empty()
        });
    }

    pub fn tracked_keys(&self) -> usize {
        self.attempts.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_up_to_limit_then_blocks() {
        let limiter = RateLimiter::new(3, Duration::from_secs(60));
        for _ in 0..3 {
            assert!(limiter.check("10.0.0.1").is_ok());
        }
        let throttled = limiter.check("10.0.0.1").unwrap_err();
        assert!(throttled.retry_after <= Duration::from_secs(60));
        assert!(throttled.retry_after_secs() >= 1);
    }

    #[test]
    fn keys_are_independent() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        assert!(limiter.check("a").is_ok());
        assert!(limiter.check("a").is_err());
        assert!(limiter.check("b").is_ok());
    }

    #[test]
    fn window_slides() {
        let limiter = RateLimiter::new(2, Duration::from_secs(10));
        let start = Instant::now();
        assert!(limiter.check_at("k", start).is_ok());
        assert!(limiter.check_at("k", start + Duration::from_secs(4)).is_ok());

        let blocked = limiter.check_at("k", start + Duration::from_secs(6)).unwrap_err();
        assert_eq!(blocked.retry_after, Duration::from_secs(4));
        assert_eq!(blocked.retry_after_secs(), 4);

        // first attempt has left the window
        assert!(limiter.check_at("k", start + Duration::from_secs(10)).is_ok());
    }

    #[test]
    fn cleanup_drops_idle_keys() {
        let limiter = RateLimiter::new(5, Duration::from_millis(1));
        limiter.check("idle").unwrap();
        std::thread::sleep(Duration::from_millis(5));
        limiter.cleanup();
        assert_eq!(limiter.tracked_keys(), 0);
    }
}
