use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::store::RateLimitStore;
use crate::window::{RateLimitDecision, RateLimitPolicy};

/// Policy plus store, as used by request middleware.
#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn RateLimitStore>,
    policy: RateLimitPolicy,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn RateLimitStore>, policy: RateLimitPolicy) -> Self {
        Self { store, policy }
    }

    pub fn backend(&self) -> &'static str {
        self.store.backend()
    }

    pub fn store(&self) -> &Arc<dyn RateLimitStore> {
        &self.store
    }

    /// Count a request for `key`.
    ///
    /// Backend failures are logged and the request is let through.
    pub async fn check(&self, key: &str, now: DateTime<Utc>) -> RateLimitDecision {
        match self.store.hit(key, &self.policy, now).await {
            Ok(decision) => decision,
            Err(e) => {
                tracing::warn!(error = %e, backend = self.store.backend(), "rate limit check failed; allowing request");
                RateLimitDecision::fail_open(&self.policy, now)
            }
        }
    }
}
