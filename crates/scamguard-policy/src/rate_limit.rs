//! Rate limiter
//!
//! Two gates in front of the classifier: a per-channel cooldown and a
//! global token bucket with continuous refill. Both must pass.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::config::RateLimitConfig;

/// Why a message was not admitted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Admitted,
    ChannelCooldown,
    BucketEmpty,
}

impl RateDecision {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Self::Admitted)
    }
}

/// Continuous-refill token bucket.
///
/// Capacity is `max_calls_per_minute`, refilled at capacity/60 tokens per
/// second, lazily on each check. A non-positive capacity admits everything.
#[derive(Debug, Clone)]
pub struct TokenBucket {
    capacity: f64,
    tokens: f64,
    last_refill: Instant,
}

impl TokenBucket {
    /// A full bucket
    pub fn new(max_calls_per_minute: i64, now: Instant) -> Self {
        let capacity = max_calls_per_minute.max(0) as f64;
        Self {
            capacity,
            tokens: capacity,
            last_refill: now,
        }
    }

    pub fn is_unlimited(&self) -> bool {
        self.capacity <= 0.0
    }

    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    /// Tokens available at `now`, after refill
    pub fn available(&mut self, now: Instant) -> f64 {
        self.refill(now);
        self.tokens
    }

    /// Take one token if available
    pub fn try_take(&mut self, now: Instant) -> bool {
        if self.is_unlimited() {
            return true;
        }

        self.refill(now);
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    fn refill(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();
        let rate = self.capacity / 60.0;
        self.tokens = (self.tokens + elapsed * rate).min(self.capacity);
        // Clock going backwards must not rewind the refill point
        if now > self.last_refill {
            self.last_refill = now;
        }
    }
}

struct RateState {
    last_scan: HashMap<String, Instant>,
    bucket: TokenBucket,
}

/// Shared cooldown map and token bucket
pub struct RateLimiter {
    cooldown: Duration,
    state: Mutex<RateState>,
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self::with_clock(config, Instant::now())
    }

    /// Create with an explicit starting instant
    pub fn with_clock(config: &RateLimitConfig, now: Instant) -> Self {
        Self {
            cooldown: Duration::from_secs(config.per_channel_cooldown_sec),
            state: Mutex::new(RateState {
                last_scan: HashMap::new(),
                bucket: TokenBucket::new(config.max_calls_per_minute, now),
            }),
        }
    }

    pub fn check(&self, channel_id: &str) -> RateDecision {
        self.check_at(channel_id, Instant::now())
    }

    /// Check both gates at `now`.
    ///
    /// The channel's last-scan time is recorded as soon as the cooldown gate
    /// passes, even when the bucket then refuses.
    pub fn check_at(&self, channel_id: &str, now: Instant) -> RateDecision {
        let mut state = self.state.lock();

        if !self.cooldown.is_zero() {
            if let Some(last) = state.last_scan.get(channel_id) {
                if now.saturating_duration_since(*last) < self.cooldown {
                    return RateDecision::ChannelCooldown;
                }
            }
            state.last_scan.insert(channel_id.to_string(), now);
        }

        if state.bucket.try_take(now) {
            RateDecision::Admitted
        } else {
            RateDecision::BucketEmpty
        }
    }

    /// Tokens available at `now`
    pub fn available_tokens_at(&self, now: Instant) -> f64 {
        self.state.lock().bucket.available(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn limiter(per_minute: i64, cooldown: u64, now: Instant) -> RateLimiter {
        RateLimiter::with_clock(
            &RateLimitConfig {
                max_calls_per_minute: per_minute,
                per_channel_cooldown_sec: cooldown,
            },
            now,
        )
    }

    #[test]
    fn test_channel_cooldown() {
        let t0 = Instant::now();
        let limiter = limiter(0, 30, t0);

        assert_eq!(limiter.check_at("c1", t0), RateDecision::Admitted);
        assert_eq!(
            limiter.check_at("c1", t0 + Duration::from_secs(5)),
            RateDecision::ChannelCooldown
        );
        assert_eq!(
            limiter.check_at("c2", t0 + Duration::from_secs(5)),
            RateDecision::Admitted
        );
        assert_eq!(
            limiter.check_at("c1", t0 + Duration::from_secs(30)),
            RateDecision::Admitted
        );
    }

    #[test]
    fn test_bucket_exhaustion_and_refill() {
        let t0 = Instant::now();
        let limiter = limiter(2, 0, t0);

        assert!(limiter.check_at("a", t0).is_admitted());
        assert!(limiter.check_at("b", t0).is_admitted());
        assert_eq!(limiter.check_at("c", t0), RateDecision::BucketEmpty);

        // 2 per minute refills one token every 30s
        assert_eq!(
            limiter.check_at("d", t0 + Duration::from_secs(29)),
            RateDecision::BucketEmpty
        );
        assert!(limiter.check_at("e", t0 + Duration::from_secs(31)).is_admitted());
    }

    #[test]
    fn test_zero_or_negative_capacity_is_unlimited() {
        let t0 = Instant::now();
        for capacity in [0, -5] {
            let limiter = limiter(capacity, 0, t0);
            for i in 0..1000 {
                assert!(limiter.check_at(&format!("c{}", i), t0).is_admitted());
            }
        }
    }

    #[test]
    fn test_cooldown_recorded_even_when_bucket_refuses() {
        let t0 = Instant::now();
        let limiter = limiter(1, 10, t0);

        assert!(limiter.check_at("a", t0).is_admitted());
        assert_eq!(limiter.check_at("b", t0), RateDecision::BucketEmpty);
        assert_eq!(
            limiter.check_at("b", t0 + Duration::from_secs(1)),
            RateDecision::ChannelCooldown
        );
    }

    #[test]
    fn test_concurrent_callers_share_bucket_exactly() {
        let t0 = Instant::now();
        let limiter = std::sync::Arc::new(limiter(25, 0, t0));

        let handles: Vec<_> = (0..16)
            .map(|t| {
                let limiter = limiter.clone();
                std::thread::spawn(move || {
                    (0..10)
                        .filter(|i| limiter.check_at(&format!("{}-{}", t, i), t0).is_admitted())
                        .count()
                })
            })
            .collect();
        let admitted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();

        assert_eq!(admitted, 25);
        assert!(limiter.available_tokens_at(t0) < 1.0);
    }

    #[test]
    fn test_concurrent_callers_single_channel_cooldown() {
        let t0 = Instant::now();
        let limiter = std::sync::Arc::new(limiter(0, 30, t0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let limiter = limiter.clone();
                std::thread::spawn(move || limiter.check_at("c1", t0).is_admitted())
            })
            .collect();
        let admitted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|admitted| *admitted)
            .count();

        assert_eq!(admitted, 1);
    }

    proptest! {
        #[test]
        fn prop_refill_is_linear_and_capped(
            capacity in 1i64..600,
            taken in 0usize..600,
            idle_ms in 0u64..300_000,
        ) {
            let t0 = Instant::now();
            let mut bucket = TokenBucket::new(capacity, t0);
            let mut before = bucket.available(t0);
            for _ in 0..taken {
                if bucket.try_take(t0) {
                    before -= 1.0;
                }
            }

            let idle = Duration::from_millis(idle_ms);
            let expected = (before + idle.as_secs_f64() * capacity as f64 / 60.0).min(capacity as f64);
            let actual = bucket.available(t0 + idle);

            prop_assert!(actual >= 0.0);
            prop_assert!(actual <= capacity as f64);
            prop_assert!((actual - expected).abs() < 1e-6);
        }

        #[test]
        fn prop_never_admits_more_than_capacity_at_once(capacity in 1i64..200, attempts in 0usize..400) {
            let t0 = Instant::now();
            let mut bucket = TokenBucket::new(capacity, t0);
            let admitted = (0..attempts).filter(|_| bucket.try_take(t0)).count();
            prop_assert_eq!(admitted, attempts.min(capacity as usize));
        }
    }
}
