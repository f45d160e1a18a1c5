use std::sync::Arc;

use axum::{
    Json,
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use bazaar_infra::health::check_health;

use crate::app::services::AppServices;
use crate::context::{PrincipalContext, TenantContext};

/// Liveness plus connectivity of configured backends. 503 when one is down.
pub async fn health(Extension(services): Extension<Arc<AppServices>>) -> Response {
    let report = check_health(services.exports.as_ref(), Some(services.limiter.store().as_ref())).await;
    let status = if report.is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(report)).into_response()
}

pub async fn whoami(
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
) -> impl IntoResponse {
    Json(serde_json::json!({
        "tenant_id": tenant.tenant_id().to_string(),
        "user_id": principal.user_id().to_string(),
        "roles": principal.roles().iter().map(|r| r.as_str()).collect::<Vec<_>>(),
        "permissions": principal.permissions().iter().map(|p| p.to_string()).collect::<Vec<_>>(),
    }))
}
