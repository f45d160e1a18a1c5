//! Process configuration read from the environment (and `.env` when present).

use std::net::SocketAddr;
use std::time::Duration;

use bazaar_ratelimit::RateLimitPolicy;

const DEV_JWT_SECRET: &str = "dev-secret";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    /// Shared secret expected in `x-cron-secret`. Empty disables cron routes.
    pub cron_secret: String,
    pub database_url: Option<String>,
    pub redis_url: Option<String>,
    pub rate_limit: RateLimitPolicy,
    pub export_batch_size: usize,
    /// `None` means exports are only processed by the cron endpoint.
    pub export_poll_interval: Option<Duration>,
    pub export_ttl: chrono::Duration,
    /// Processing rows older than this are failed by the next batch.
    pub export_processing_timeout: chrono::Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            jwt_secret: DEV_JWT_SECRET.to_string(),
            cron_secret: String::new(),
            database_url: None,
            redis_url: None,
            rate_limit: RateLimitPolicy::default(),
            export_batch_size: 5,
            export_poll_interval: None,
            export_ttl: chrono::Duration::days(bazaar_exports::DEFAULT_EXPORT_TTL_DAYS),
            export_processing_timeout: chrono::Duration::minutes(bazaar_exports::DEFAULT_PROCESSING_TIMEOUT_MINS),
        }
    }
}

impl AppConfig {
    /// Load `.env` (if any) and read the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                tracing::warn!(error = %e, "failed to read .env file");
            }
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bind_addr = match get("BIND_ADDR") {
            Some(v) => parse("BIND_ADDR", &v)?,
            None => defaults.bind_addr,
        };

        let jwt_secret = get("JWT_SECRET").unwrap_or_else(|| {
            tracing::warn!("JWT_SECRET not set; using insecure dev default");
            DEV_JWT_SECRET.to_string()
        });

        let max_requests = match get("RATE_LIMIT_MAX") {
            Some(v) => positive::<u32>("RATE_LIMIT_MAX", &v)?,
            None => defaults.rate_limit.max_requests,
        };
        let window = match get("RATE_LIMIT_WINDOW_SECS") {
            Some(v) => Duration::from_secs(positive::<u64>("RATE_LIMIT_WINDOW_SECS", &v)?),
            None => defaults.rate_limit.window,
        };

        let export_batch_size = match get("EXPORT_BATCH_SIZE") {
            Some(v) => positive::<usize>("EXPORT_BATCH_SIZE", &v)?,
            None => defaults.export_batch_size,
        };
        let export_poll_interval = match get("EXPORT_POLL_SECS") {
            Some(v) => match parse::<u64>("EXPORT_POLL_SECS", &v)? {
                0 => None,
                secs => Some(Duration::from_secs(secs)),
            },
            None => defaults.export_poll_interval,
        };
        let export_ttl = match get("EXPORT_TTL_DAYS") {
            Some(v) => chrono::Duration::days(positive::<i64>("EXPORT_TTL_DAYS", &v)?),
            None => defaults.export_ttl,
        };
        let export_processing_timeout = match get("EXPORT_PROCESSING_TIMEOUT_SECS") {
            Some(v) => chrono::Duration::seconds(positive::<i64>("EXPORT_PROCESSING_TIMEOUT_SECS", &v)?),
            None => defaults.export_processing_timeout,
        };

        Ok(Self {
            bind_addr,
            jwt_secret,
            cron_secret: get("CRON_SECRET").unwrap_or_default(),
            database_url: get("DATABASE_URL"),
            redis_url: get("REDIS_URL"),
            rate_limit: RateLimitPolicy::new(max_requests, window),
            export_batch_size,
            export_poll_interval,
            export_ttl,
            export_processing_timeout,
        })
    }
}

fn parse<T>(var: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse::<T>().map_err(|e| ConfigError::Invalid {
        var,
        reason: e.to_string(),
    })
}

fn positive<T>(var: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr + PartialOrd + Default,
    T::Err: std::fmt::Display,
{
    let value = parse::<T>(var, raw)?;
    if value <= T::default() {
        return Err(ConfigError::Invalid {
            var,
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let cfg = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(cfg.bind_addr.port(), 8080);
        assert_eq!(cfg.rate_limit.max_requests, 100);
        assert_eq!(cfg.rate_limit.window, Duration::from_secs(60));
        assert_eq!(cfg.export_batch_size, 5);
        assert!(cfg.export_poll_interval.is_none());
        assert_eq!(cfg.export_ttl, chrono::Duration::days(7));
        assert_eq!(cfg.export_processing_timeout, chrono::Duration::minutes(15));
        assert!(cfg.database_url.is_none());
        assert!(cfg.cron_secret.is_empty());
    }

    #[test]
    fn values_are_parsed() {
        let cfg = AppConfig::from_lookup(lookup(&[
            ("BIND_ADDR", "127.0.0.1:9000"),
            ("RATE_LIMIT_MAX", "5"),
            ("RATE_LIMIT_WINDOW_SECS", "10"),
            ("EXPORT_POLL_SECS", "30"),
            ("EXPORT_PROCESSING_TIMEOUT_SECS", "120"),
            ("REDIS_URL", "redis://localhost:6379"),
            ("DATABASE_URL", "  "),
        ]))
        .unwrap();
        assert_eq!(cfg.bind_addr.port(), 9000);
        assert_eq!(cfg.rate_limit.max_requests, 5);
        assert_eq!(cfg.export_poll_interval, Some(Duration::from_secs(30)));
        assert_eq!(cfg.export_processing_timeout, chrono::Duration::seconds(120));
        assert_eq!(cfg.redis_url.as_deref(), Some("redis://localhost:6379"));
        assert!(cfg.database_url.is_none());
    }

    #[test]
    fn bad_numbers_are_rejected() {
        let err = AppConfig::from_lookup(lookup(&[("RATE_LIMIT_MAX", "lots")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "RATE_LIMIT_MAX", .. }));

        let err = AppConfig::from_lookup(lookup(&[("EXPORT_BATCH_SIZE", "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "EXPORT_BATCH_SIZE", .. }));
    }
}
