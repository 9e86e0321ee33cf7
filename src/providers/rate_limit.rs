//! Outbound call rate limiting
//!
//! Uniform-spacing limiter shared by every provider client in the process:
//! at most N calls per minute, spaced evenly. Callers wait instead of
//! receiving 429-style rejections. No burst allowance.

use parking_lot::Mutex;
use std::time::{Duration, Instant};

/// Uniform-spacing rate limiter
///
/// Constructed once at startup and injected into every provider client as an
/// `Arc<RateLimiter>` so the quota is shared process-wide.
pub struct RateLimiter {
    period: Duration,
    next_allowed: Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// Create a limiter allowing `calls_per_minute` evenly spaced calls
    ///
    /// # Panics
    ///
    /// Panics if `calls_per_minute` is zero.
    pub fn new(calls_per_minute: u32) -> Self {
        assert!(calls_per_minute > 0, "calls_per_minute must be > 0");
        Self {
            period: Duration::from_secs_f64(60.0 / f64::from(calls_per_minute)),
            next_allowed: Mutex::new(None),
        }
    }

    /// Spacing between consecutive calls
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Wait until the next call is allowed to proceed
    ///
    /// The slot reservation (read of `next_allowed`, advance by one period)
    /// happens atomically under the mutex; the sleep happens outside it so
    /// concurrent callers queue up behind distinct slots rather than the lock.
    pub async fn acquire(&self) {
        let wait = self.reserve_slot();
        if !wait.is_zero() {
            tokio::time::sleep(wait).await;
        }
    }

    fn reserve_slot(&self) -> Duration {
        let mut next_allowed = self.next_allowed.lock();
        let now = Instant::now();
        let slot = match *next_allowed {
            Some(at) if at > now => at,
            _ => now,
        };
        *next_allowed = Some(slot + self.period);
        slot.saturating_duration_since(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_period_from_quota() {
        let limiter = RateLimiter::new(5);
        assert_eq!(limiter.period(), Duration::from_secs(12));
    }

    #[test]
    fn test_first_slot_is_immediate() {
        let limiter = RateLimiter::new(5);
        assert_eq!(limiter.reserve_slot(), Duration::ZERO);
    }

    #[test]
    fn test_slots_are_uniformly_spaced() {
        let limiter = RateLimiter::new(5);
        limiter.reserve_slot();

        // Second and third callers get waits one and two periods out.
        let second = limiter.reserve_slot();
        let third = limiter.reserve_slot();
        assert!(second > Duration::from_secs(11));
        assert!(second <= Duration::from_secs(12));
        assert!(third > second);
        assert!(third <= Duration::from_secs(24));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sequential_calls_take_at_least_spacing() {
        let limiter = RateLimiter::new(5);
        let started = tokio::time::Instant::now();

        for _ in 0..3 {
            limiter.acquire().await;
        }

        // 3 calls at 5/min: at least (3 - 1) * 12s of wall-clock.
        assert!(started.elapsed() >= Duration::from_secs(24));
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_callers_never_share_a_slot() {
        let limiter = Arc::new(RateLimiter::new(60));
        let started = tokio::time::Instant::now();

        let tasks: Vec<_> = (0..4)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                tokio::spawn(async move { limiter.acquire().await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        // 4 concurrent callers at 60/min span three gaps, minus real-clock skew.
        assert!(started.elapsed() >= Duration::from_millis(2_900));
    }
}
