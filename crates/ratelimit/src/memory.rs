use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::store::{RateLimitError, RateLimitStore};
use crate::window::{RateLimitDecision, RateLimitPolicy, Window};

const DEFAULT_SWEEP_THRESHOLD: usize = 10_000;

/// Process-local counters.
///
/// Expired windows are dropped whenever the map grows past the sweep
/// threshold, so idle clients do not accumulate forever.
#[derive(Debug)]
pub struct InMemoryRateLimitStore {
    windows: Mutex<HashMap<String, Window>>,
    sweep_threshold: usize,
}

impl InMemoryRateLimitStore {
    pub fn new() -> Self {
        Self::with_sweep_threshold(DEFAULT_SWEEP_THRESHOLD)
    }

    pub fn with_sweep_threshold(sweep_threshold: usize) -> Self {
        Self {
            windows: Mutex::new(HashMap::new()),
            sweep_threshold,
        }
    }

    /// Remove every expired window; returns how many were dropped.
    pub fn sweep_expired(&self, now: DateTime<Utc>) -> usize {
        let mut windows = match self.windows.lock() {
            Ok(w) => w,
            Err(poisoned) => poisoned.into_inner(),
        };
        let before = windows.len();
        windows.retain(|_, w| !w.is_expired(now));
        before - windows.len()
    }

    pub fn len(&self) -> usize {
        self.windows.lock().map(|w| w.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryRateLimitStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RateLimitStore for InMemoryRateLimitStore {
    async fn hit(
        &self,
        key: &str,
        policy: &RateLimitPolicy,
        now: DateTime<Utc>,
    ) -> Result<RateLimitDecision, RateLimitError> {
        let mut windows = self
            .windows
            .lock()
            .map_err(|_| RateLimitError::Backend("rate limit map poisoned".into()))?;

        if windows.len() >= self.sweep_threshold {
            let before = windows.len();
            windows.retain(|_, w| !w.is_expired(now));
            tracing::debug!(evicted = before - windows.len(), "swept expired rate limit windows");
        }

        let existing = windows.get(key).copied();
        let (window, decision) = Window::register(existing, policy, now);
        windows.insert(key.to_string(), window);
        Ok(decision)
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
