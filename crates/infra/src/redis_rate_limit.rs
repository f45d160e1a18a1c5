//! Redis-backed rate limit counters, shared across API instances.
//!
//! One atomic pipeline per hit: create the key with the window TTL if it is
//! missing, increment it and read the remaining TTL back.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::aio::MultiplexedConnection;
use tracing::debug;

use bazaar_ratelimit::{RateLimitDecision, RateLimitError, RateLimitPolicy, RateLimitStore};

const KEY_PREFIX: &str = "bazaar:rl:";

#[derive(Clone)]
pub struct RedisRateLimitStore {
    conn: MultiplexedConnection,
}

impl RedisRateLimitStore {
    pub async fn connect(redis_url: &str) -> Result<Self, RateLimitError> {
        let client = redis::Client::open(redis_url).map_err(backend_error)?;
        let conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(backend_error)?;
        debug!("connected rate limit store to redis");
        Ok(Self { conn })
    }
}

fn backend_error(e: redis::RedisError) -> RateLimitError {
    RateLimitError::Backend(e.to_string())
}

#[async_trait]
impl RateLimitStore for RedisRateLimitStore {
    async fn hit(
        &self,
        key: &str,
        policy: &RateLimitPolicy,
        now: DateTime<Utc>,
    ) -> Result<RateLimitDecision, RateLimitError> {
        let key = format!("{KEY_PREFIX}{key}");
        let window_ms = u64::try_from(policy.window.as_millis()).unwrap_or(u64::MAX).max(1);
        let mut conn = self.conn.clone();

        let (count, pttl): (u32, i64) = redis::pipe()
            .atomic()
            .cmd("SET")
            .arg(&key)
            .arg(0)
            .arg("PX")
            .arg(window_ms)
            .arg("NX")
            .ignore()
            .cmd("INCR")
            .arg(&key)
            .cmd("PTTL")
            .arg(&key)
            .query_async(&mut conn)
            .await
            .map_err(backend_error)?;

        let resets_at = if pttl > 0 {
            now + chrono::Duration::milliseconds(pttl)
        } else {
            now + policy.window_chrono()
        };
        let allowed = count <= policy.max_requests;
        Ok(RateLimitDecision::from_count(policy, count, allowed, resets_at, now))
    }

    fn backend(&self) -> &'static str {
        "redis"
    }

    async fn ping(&self) -> Result<(), RateLimitError> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await.map_err(backend_error)?;
        Ok(())
    }
}
