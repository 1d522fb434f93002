//! Rate limiting middleware
//!
//! Keeps any single user from hammering the register and withdraw buttons.
//! Backed by a keyed GCRA limiter: a user gets `max_requests` in a burst and
//! regains one slot every `window_seconds / max_requests`.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use tracing::{debug, warn};
use crate::config::RateLimitSettings;
use crate::utils::errors::{RunRaceError, Result};

/// Per-user limiter for registration actions
#[derive(Clone)]
pub struct RateLimitMiddleware {
    limiter: Arc<DefaultKeyedRateLimiter<i64>>,
    admin_ids: Arc<Vec<i64>>,
    admin_exempt: bool,
}

impl RateLimitMiddleware {
    pub fn new(settings: &RateLimitSettings, admin_ids: &[i64]) -> Result<Self> {
        let quota = quota_for(settings)?;

        Ok(Self {
            limiter: Arc::new(RateLimiter::keyed(quota)),
            admin_ids: Arc::new(admin_ids.to_vec()),
            admin_exempt: settings.admin_exempt,
        })
    }

    /// Record an action by `user_id`, failing once the user is over quota
    pub fn check(&self, user_id: i64) -> Result<()> {
        if self.admin_exempt && self.admin_ids.contains(&user_id) {
            return Ok(());
        }

        match self.limiter.check_key(&user_id) {
            Ok(()) => {
                debug!(user_id = user_id, "Rate limit check passed");
                Ok(())
            }
            Err(_) => {
                warn!(user_id = user_id, "Rate limit exceeded");
                Err(RunRaceError::RateLimitExceeded)
            }
        }
    }

    /// Drop state for users whose quota has fully refilled
    pub fn cleanup(&self) {
        self.limiter.retain_recent();
        self.limiter.shrink_to_fit();
    }
}

fn quota_for(settings: &RateLimitSettings) -> Result<Quota> {
    let burst = NonZeroU32::new(settings.max_requests)
        .ok_or_else(|| RunRaceError::Config("Rate limit max_requests must be positive".to_string()))?;

    let period = Duration::from_secs(settings.window_seconds) / settings.max_requests;
    let quota = Quota::with_period(period)
        .ok_or_else(|| RunRaceError::Config("Rate limit window must be positive".to_string()))?;

    Ok(quota.allow_burst(burst))
}
