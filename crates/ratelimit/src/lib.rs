//! `bazaar-ratelimit` — fixed-window request counting.
//!
//! The counting rule lives in [`window`]; where the counters are kept is the
//! [`RateLimitStore`] seam. The in-memory store only protects a single process;
//! multi-instance deployments plug in a shared store (see `bazaar-infra`).

pub mod limiter;
pub mod memory;
pub mod store;
pub mod window;

pub use limiter::RateLimiter;
pub use memory::InMemoryRateLimitStore;
pub use store::{RateLimitError, RateLimitStore};
pub use window::{RateLimitDecision, RateLimitPolicy, Window};
