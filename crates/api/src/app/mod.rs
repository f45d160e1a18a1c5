//! HTTP application wiring (Axum router + service wiring).
//!
//! - `services.rs`: storage backend selection and service construction
//! - `routes/`: HTTP handlers, one file per area
//! - `dto.rs`: request/response bodies
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;

use bazaar_auth::Hs256JwtValidator;
use bazaar_infra::AppConfig;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

pub use services::AppServices;

/// Build services from `config` and the router over them.
pub async fn build_app(config: &AppConfig) -> anyhow::Result<(Router, Arc<AppServices>)> {
    let services = Arc::new(services::build_services(config).await?);
    Ok((router(services.clone(), &config.jwt_secret), services))
}

/// Full HTTP router over already-built services.
pub fn router(services: Arc<AppServices>, jwt_secret: &str) -> Router {
    let auth_state = middleware::AuthState {
        jwt: Arc::new(Hs256JwtValidator::new(jwt_secret)),
    };
    let rate_limit_state = middleware::RateLimitState {
        limiter: services.limiter.clone(),
    };

    // Tenant-scoped routes: JWT required.
    let protected = routes::router().layer(axum::middleware::from_fn_with_state(
        auth_state,
        middleware::auth_middleware,
    ));

    // Scheduler-driven routes: shared secret instead of a JWT.
    let cron = routes::cron::router().layer(axum::middleware::from_fn_with_state(
        services.cron_secret.clone(),
        middleware::cron_middleware,
    ));

    Router::new()
        .route("/health", get(routes::system::health))
        .nest("/api/cron", cron)
        .nest("/api", protected)
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn_with_state(
                    rate_limit_state,
                    middleware::rate_limit_middleware,
                ))
                .layer(Extension(services)),
        )
}
