use std::sync::Arc;

use axum::{
    Json, Router,
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::Utc;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::authz::require_permission;
use crate::context::{PrincipalContext, TenantContext};

pub fn router() -> Router {
    Router::new()
        .route("/", get(get_account))
        .route("/redeem", post(redeem_points))
        .route("/coupons", get(list_coupons))
}

pub async fn get_account(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
) -> Response {
    if let Err(res) = require_permission(&tenant, &principal, "loyalty.read") {
        return res;
    }
    match services
        .loyalty
        .account(tenant.tenant_id(), principal.user_id(), Utc::now())
    {
        Ok(account) => (StatusCode::OK, Json(account)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn redeem_points(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<dto::RedeemRequest>,
) -> Response {
    if let Err(res) = require_permission(&tenant, &principal, "loyalty.redeem") {
        return res;
    }
    match services
        .loyalty
        .redeem(tenant.tenant_id(), principal.user_id(), body.points, Utc::now())
    {
        Ok(redemption) => (StatusCode::CREATED, Json(redemption)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn list_coupons(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
) -> Response {
    if let Err(res) = require_permission(&tenant, &principal, "loyalty.read") {
        return res;
    }
    match services.loyalty.coupons(tenant.tenant_id(), principal.user_id()) {
        Ok(coupons) => (StatusCode::OK, Json(serde_json::json!({ "coupons": coupons }))).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}
