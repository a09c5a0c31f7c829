//! Rate limiting for connection attempts.
//!
//! Token bucket shared by all scan workers so a large fleet is not hit with
//! a burst of logins.

use governor::{Quota, RateLimiter as GovLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;

type DirectLimiter = GovLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Limits connection attempts per second across all workers.
pub struct RateLimiter {
    limiter: Arc<DirectLimiter>,
}

impl RateLimiter {
    /// Create a limiter allowing `rate` attempts per second.
    ///
    /// Returns `None` for a rate of 0, meaning unlimited.
    pub fn new(rate: u32) -> Option<Self> {
        let rate = NonZeroU32::new(rate)?;
        Some(Self {
            limiter: Arc::new(GovLimiter::direct(Quota::per_second(rate))),
        })
    }

    /// Wait until another attempt is allowed.
    pub async fn wait(&self) {
        self.limiter.until_ready().await;
    }

    /// Take a token without waiting. Returns `false` if none is available.
    pub fn try_acquire(&self) -> bool {
        self.limiter.check().is_ok()
    }
}

impl Clone for RateLimiter {
    fn clone(&self) -> Self {
        Self {
            limiter: Arc::clone(&self.limiter),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_is_unlimited() {
        assert!(RateLimiter::new(0).is_none());
    }

    #[tokio::test]
    async fn test_rate_limiter_wait() {
        let limiter = RateLimiter::new(1000).unwrap();
        assert!(limiter.try_acquire());
        limiter.wait().await;
    }

    #[test]
    fn test_clones_share_state() {
        let limiter = RateLimiter::new(1).unwrap();
        let clone = limiter.clone();

        assert!(limiter.try_acquire());
        assert!(!clone.try_acquire());
    }
}
