//! Service wiring: picks storage backends from config and builds every
//! service the handlers use.

use std::sync::Arc;

use anyhow::Context;

use bazaar_auth::CronSecret;
use bazaar_infra::AppConfig;
use bazaar_infra::campaigns::CampaignService;
use bazaar_infra::exports::{
    ExportRequestStore, ExportWorker, InMemoryExportStore, MarketplaceDataSource, PostgresExportStore,
};
use bazaar_infra::loyalty::{InMemoryLoyaltyRepository, LoyaltyService};
use bazaar_infra::orders::OrderService;
use bazaar_infra::profiles::ProfileDirectory;
use bazaar_infra::vendors::VendorService;
use bazaar_ratelimit::{InMemoryRateLimitStore, RateLimitStore, RateLimiter};

pub struct AppServices {
    pub profiles: Arc<ProfileDirectory>,
    pub loyalty: Arc<LoyaltyService>,
    pub vendors: Arc<VendorService>,
    pub orders: Arc<OrderService>,
    pub campaigns: Arc<CampaignService>,
    pub exports: Arc<dyn ExportRequestStore>,
    pub export_worker: Arc<ExportWorker>,
    pub limiter: RateLimiter,
    pub cron_secret: Arc<CronSecret>,
}

pub async fn build_services(config: &AppConfig) -> anyhow::Result<AppServices> {
    let profiles = Arc::new(ProfileDirectory::default());
    let loyalty = Arc::new(LoyaltyService::new(Arc::new(InMemoryLoyaltyRepository::new())));
    let vendors = Arc::new(VendorService::default());
    let orders = Arc::new(OrderService::new(loyalty.clone(), vendors.clone()));
    let campaigns = Arc::new(CampaignService::new(profiles.clone()));

    let exports = export_store(config).await?;
    let source = Arc::new(MarketplaceDataSource::new(
        profiles.clone(),
        loyalty.clone(),
        orders.clone(),
        vendors.clone(),
    ));
    let export_worker = Arc::new(
        ExportWorker::new(exports.clone(), source)
            .with_batch_size(config.export_batch_size)
            .with_ttl(config.export_ttl)
            .with_processing_timeout(config.export_processing_timeout),
    );

    let limiter = RateLimiter::new(rate_limit_store(config).await?, config.rate_limit);

    if config.cron_secret.is_empty() {
        tracing::warn!("CRON_SECRET not set; cron endpoints will reject every call");
    }

    tracing::info!(
        exports_backend = exports.backend(),
        rate_limit_backend = limiter.backend(),
        "services ready"
    );

    Ok(AppServices {
        profiles,
        loyalty,
        vendors,
        orders,
        campaigns,
        exports,
        export_worker,
        limiter,
        cron_secret: Arc::new(CronSecret::new(&config.cron_secret)),
    })
}

async fn export_store(config: &AppConfig) -> anyhow::Result<Arc<dyn ExportRequestStore>> {
    let Some(url) = config.database_url.as_deref() else {
        return Ok(Arc::new(InMemoryExportStore::new()));
    };
    let store = PostgresExportStore::connect(url)
        .await
        .context("connecting to DATABASE_URL")?;
    store.ensure_schema().await.context("creating export schema")?;
    Ok(Arc::new(store))
}

#[cfg(feature = "redis")]
async fn rate_limit_store(config: &AppConfig) -> anyhow::Result<Arc<dyn RateLimitStore>> {
    match config.redis_url.as_deref() {
        Some(url) => {
            let store = bazaar_infra::redis_rate_limit::RedisRateLimitStore::connect(url)
                .await
                .context("connecting to REDIS_URL")?;
            Ok(Arc::new(store))
        }
        None => Ok(Arc::new(InMemoryRateLimitStore::new())),
    }
}

#[cfg(not(feature = "redis"))]
async fn rate_limit_store(config: &AppConfig) -> anyhow::Result<Arc<dyn RateLimitStore>> {
    if config.redis_url.is_some() {
        tracing::warn!("REDIS_URL is set but this build has no redis support; using in-memory rate limiting");
    }
    Ok(Arc::new(InMemoryRateLimitStore::new()))
}
