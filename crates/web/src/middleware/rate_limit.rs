//! Sign-in throttling using governor.
//!
//! Attempts are keyed by normalized email rather than client IP, so a
//! password-guessing run against one account is cut off no matter how many
//! addresses it comes from.

use std::num::NonZeroU32;

use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};

/// Sign-in attempts allowed per email per minute (also the burst size).
pub const SIGN_IN_ATTEMPTS_PER_MINUTE: u32 = 5;

/// Keyed rate limiter for sign-in attempts.
///
/// Configuration: burst of 5, one token replenished every 12 seconds.
pub struct SignInThrottle {
    limiter: DefaultKeyedRateLimiter<String>,
}

impl SignInThrottle {
    /// Create the throttle with the default quota.
    ///
    /// # Panics
    ///
    /// This function will not panic. `SIGN_IN_ATTEMPTS_PER_MINUTE` is a
    /// positive constant.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new() -> Self {
        let per_minute = NonZeroU32::new(SIGN_IN_ATTEMPTS_PER_MINUTE)
            .expect("SIGN_IN_ATTEMPTS_PER_MINUTE is positive");
        Self {
            limiter: RateLimiter::keyed(Quota::per_minute(per_minute)),
        }
    }

    /// Take one attempt for `email`. Returns `false` when the email is over quota.
    pub fn try_attempt(&self, email: &str) -> bool {
        let allowed = self.limiter.check_key(&email.to_lowercase()).is_ok();
        if !allowed {
            tracing::warn!(email = %email, "Sign-in attempts throttled");
        }
        // Drop keys whose buckets have refilled.
        self.limiter.retain_recent();
        allowed
    }
}

impl Default for SignInThrottle {
    fn default() -> Self {
        Self::new()
    }
}
