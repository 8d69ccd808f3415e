//! Login throttling using Governor.
//!
//! One token bucket per mobile number; a successful login clears the bucket.
//! Buckets idle long enough to have refilled are swept once the map reaches
//! its size limit.

use dashmap::DashMap;
use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
};
use std::{
    num::NonZeroU32,
    sync::Arc,
    time::{Duration, Instant},
};

type Limiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

const DEFAULT_MAX_KEYS: usize = 10_000;

struct Bucket {
    limiter: Arc<Limiter>,
    last_attempt: Instant,
}

/// Per-key rate limiters shared across requests.
pub struct RateLimiterState {
    limiters: DashMap<String, Bucket>,
    quota: Quota,
    max_keys: usize,
}

impl Default for RateLimiterState {
    fn default() -> Self {
        Self::new(5, Duration::from_secs(60))
    }
}

impl RateLimiterState {
    /// Allows `attempts` per `period`, all of which may be spent at once.
    ///
    /// Zero attempts or a zero period fall back to one attempt per minute.
    pub fn new(attempts: u32, period: Duration) -> Self {
        let burst = NonZeroU32::new(attempts).unwrap_or(NonZeroU32::MIN);
        let quota = Quota::with_period(period / burst.get())
            .unwrap_or_else(|| Quota::per_minute(burst))
            .allow_burst(burst);

        Self {
            limiters: DashMap::new(),
            quota,
            max_keys: DEFAULT_MAX_KEYS,
        }
    }

    /// Caps the number of tracked keys.
    pub fn with_max_keys(mut self, max_keys: usize) -> Self {
        self.max_keys = max_keys.max(1);
        self
    }

    /// Returns true if the attempt is allowed, false if `key` is throttled.
    ///
    /// When the map is full of keys still inside their window, new keys are
    /// refused rather than evicting a bucket that is still counting.
    pub fn check(&self, key: &str) -> bool {
        if !self.limiters.contains_key(key) && self.limiters.len() >= self.max_keys {
            self.evict_refilled();
            if self.limiters.len() >= self.max_keys {
                tracing::warn!(tracked = self.limiters.len(), "Login throttle full");
                return false;
            }
        }

        let now = Instant::now();
        let limiter = {
            let mut bucket = self.limiters.entry(key.to_string()).or_insert_with(|| Bucket {
                limiter: Arc::new(RateLimiter::direct(self.quota)),
                last_attempt: now,
            });
            bucket.last_attempt = now;
            Arc::clone(&bucket.limiter)
        };

        limiter.check().is_ok()
    }

    /// Forgets the attempts made for `key`.
    pub fn reset(&self, key: &str) {
        self.limiters.remove(key);
    }

    /// Number of keys currently tracked.
    pub fn tracked(&self) -> usize {
        self.limiters.len()
    }

    /// Time for an empty bucket to fill up again.
    fn refill_period(&self) -> Duration {
        self.quota.replenish_interval() * self.quota.burst_size().get()
    }

    fn evict_refilled(&self) {
        let refill = self.refill_period();
        let now = Instant::now();
        self.limiters
            .retain(|_, bucket| now.duration_since(bucket.last_attempt) < refill);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_throttles_after_quota() {
        let limiter = RateLimiterState::new(3, Duration::from_secs(60));
        assert!(limiter.check("9876543210"));
        assert!(limiter.check("9876543210"));
        assert!(limiter.check("9876543210"));
        assert!(!limiter.check("9876543210"));
    }

    #[test]
    fn test_keys_are_isolated() {
        let limiter = RateLimiterState::new(1, Duration::from_secs(60));
        assert!(limiter.check("9876543210"));
        assert!(!limiter.check("9876543210"));
        assert!(limiter.check("9876543211"));
    }

    #[test]
    fn test_reset_restores_quota() {
        let limiter = RateLimiterState::new(1, Duration::from_secs(60));
        assert!(limiter.check("9876543210"));
        assert!(!limiter.check("9876543210"));
        limiter.reset("9876543210");
        assert!(limiter.check("9876543210"));
        assert_eq!(limiter.tracked(), 1);
    }

    #[test]
    fn test_tracked_keys_stay_bounded() {
        let limiter = RateLimiterState::new(5, Duration::from_secs(60)).with_max_keys(100);

        for i in 0..5_000 {
            limiter.check(&format!("98{i:08}"));
        }

        assert_eq!(limiter.tracked(), 100);
        // Keys already tracked keep their own quota.
        assert!(limiter.check("9800000000"));
    }

    #[test]
    fn test_refilled_buckets_are_evicted() {
        let limiter = RateLimiterState::new(1, Duration::from_millis(20)).with_max_keys(3);
        assert!(limiter.check("9000000001"));
        assert!(limiter.check("9000000002"));
        assert!(limiter.check("9000000003"));
        assert!(!limiter.check("9000000004"));

        std::thread::sleep(Duration::from_millis(50));

        assert!(limiter.check("9000000004"));
        assert_eq!(limiter.tracked(), 1);
    }
}
