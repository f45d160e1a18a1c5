use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::window::{RateLimitDecision, RateLimitPolicy};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RateLimitError {
    #[error("rate limit backend unavailable: {0}")]
    Backend(String),
}

/// Where per-key counters live.
#[async_trait]
pub trait RateLimitStore: Send + Sync {
    /// Count one request for `key` and report whether it is allowed.
    async fn hit(
        &self,
        key: &str,
        policy: &RateLimitPolicy,
        now: DateTime<Utc>,
    ) -> Result<RateLimitDecision, RateLimitError>;

    /// Backend label used by health reporting.
    fn backend(&self) -> &'static str;

    /// Round-trip to the backend. Local stores are always reachable.
    async fn ping(&self) -> Result<(), RateLimitError> {
        Ok(())
    }
}
