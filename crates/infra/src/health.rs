//! Dependency health for `/health`.
//!
//! Only backends that are actually configured are checked. An in-memory
//! export store means no database was configured, an in-memory limiter means
//! no cache was configured.

use serde::Serialize;
use tracing::warn;

use bazaar_ratelimit::RateLimitStore;

use crate::exports::ExportRequestStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyStatus {
    Ok,
    Unavailable,
    NotConfigured,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub database: DependencyStatus,
    pub cache: DependencyStatus,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        self.database != DependencyStatus::Unavailable && self.cache != DependencyStatus::Unavailable
    }
}

pub async fn check_health(exports: &dyn ExportRequestStore, cache: Option<&dyn RateLimitStore>) -> HealthReport {
    let database = if exports.backend() == "postgres" {
        match exports.ping().await {
            Ok(()) => DependencyStatus::Ok,
            Err(e) => {
                warn!(error = %e, "database health check failed");
                DependencyStatus::Unavailable
            }
        }
    } else {
        DependencyStatus::NotConfigured
    };

    let cache = match cache {
        Some(store) if store.backend() == "redis" => match store.ping().await {
            Ok(()) => DependencyStatus::Ok,
            Err(e) => {
                warn!(error = %e, "cache health check failed");
                DependencyStatus::Unavailable
            }
        },
        _ => DependencyStatus::NotConfigured,
    };

    let mut report = HealthReport {
        status: "ok",
        database,
        cache,
    };
    if !report.is_healthy() {
        report.status = "degraded";
    }
    report
}
