use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Limit applied per client key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    pub max_requests: u32,
    pub window: Duration,
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self {
            max_requests: 100,
            window: Duration::from_secs(60),
        }
    }
}

impl RateLimitPolicy {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
        }
    }

    pub fn window_chrono(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.window).unwrap_or_else(|_| chrono::Duration::days(365))
    }
}

/// Counter state for one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub count: u32,
    pub resets_at: DateTime<Utc>,
}

impl Window {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.resets_at
    }

    /// Apply one hit to an optional existing window.
    ///
    /// A missing or expired window is replaced by a fresh one with count 1.
    /// A full window is left untouched and the hit is denied.
    pub fn register(
        existing: Option<Window>,
        policy: &RateLimitPolicy,
        now: DateTime<Utc>,
    ) -> (Window, RateLimitDecision) {
        let mut window = match existing {
            Some(w) if !w.is_expired(now) => w,
            _ => Window {
                count: 0,
                resets_at: now + policy.window_chrono(),
            },
        };

        let allowed = window.count < policy.max_requests;
        if allowed {
            window.count += 1;
        }

        let decision = RateLimitDecision::from_count(policy, window.count, allowed, window.resets_at, now);
        (window, decision)
    }
}

/// Outcome of a single hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    pub resets_at: DateTime<Utc>,
    /// Set when denied: time until the window resets.
    #[serde(skip)]
    pub retry_after: Option<Duration>,
}

impl RateLimitDecision {
    /// Build a decision from an observed counter value.
    ///
    /// Shared stores that keep counting past the limit report `count > limit`;
    /// `remaining` saturates at zero in that case.
    pub fn from_count(
        policy: &RateLimitPolicy,
        count: u32,
        allowed: bool,
        resets_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Self {
        let retry_after = if allowed {
            None
        } else {
            Some((resets_at - now).to_std().unwrap_or(Duration::ZERO))
        };
        Self {
            allowed,
            limit: policy.max_requests,
            remaining: policy.max_requests.saturating_sub(count),
            resets_at,
            retry_after,
        }
    }

    /// A decision used when the store is unavailable.
    pub fn fail_open(policy: &RateLimitPolicy, now: DateTime<Utc>) -> Self {
        Self {
            allowed: true,
            limit: policy.max_requests,
            remaining: policy.max_requests,
            resets_at: now + policy.window_chrono(),
            retry_after: None,
        }
    }
}
