use std::sync::Arc;

use axum::{
    Json, Router,
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::Utc;

use bazaar_vendors::Vendor;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::authz::require_permission;
use crate::context::{PrincipalContext, TenantContext};

pub fn router() -> Router {
    Router::new()
        .route("/", post(apply))
        .route("/me", get(my_vendor))
        .route("/orders", get(vendor_orders))
        .route("/payouts", post(request_payout).get(list_payouts))
}

/// Any signed-in user may apply; admins verify the application.
pub async fn apply(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<dto::ApplyVendorRequest>,
) -> Response {
    match services
        .vendors
        .apply(tenant.tenant_id(), principal.user_id(), &body.display_name, Utc::now())
    {
        Ok(vendor) => (StatusCode::CREATED, Json(vendor)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

fn own_vendor(
    services: &AppServices,
    tenant: &TenantContext,
    principal: &PrincipalContext,
) -> Result<Vendor, Response> {
    match services.vendors.for_owner(tenant.tenant_id(), principal.user_id()) {
        Ok(Some(v)) => Ok(v),
        Ok(None) => Err(errors::json_error(
            StatusCode::NOT_FOUND,
            "not_found",
            "no vendor profile for this user",
        )),
        Err(e) => Err(errors::store_error_to_response(e)),
    }
}

pub async fn my_vendor(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
) -> Response {
    match own_vendor(&services, &tenant, &principal) {
        Ok(vendor) => (StatusCode::OK, Json(vendor)).into_response(),
        Err(res) => res,
    }
}

pub async fn vendor_orders(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
) -> Response {
    if let Err(res) = require_permission(&tenant, &principal, "orders.fulfil") {
        return res;
    }
    let vendor = match own_vendor(&services, &tenant, &principal) {
        Ok(v) => v,
        Err(res) => return res,
    };
    match services.orders.list_for_vendor(tenant.tenant_id(), vendor.id) {
        Ok(orders) => (StatusCode::OK, Json(serde_json::json!({ "orders": orders }))).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn request_payout(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<dto::PayoutRequest>,
) -> Response {
    if let Err(res) = require_permission(&tenant, &principal, "payouts.request") {
        return res;
    }
    match services
        .vendors
        .request_payout(tenant.tenant_id(), principal.user_id(), body.amount, Utc::now())
    {
        Ok(payout) => (StatusCode::CREATED, Json(payout)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn list_payouts(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
) -> Response {
    if let Err(res) = require_permission(&tenant, &principal, "payouts.request") {
        return res;
    }
    let vendor = match own_vendor(&services, &tenant, &principal) {
        Ok(v) => v,
        Err(res) => return res,
    };
    match services.vendors.payouts_for_vendor(tenant.tenant_id(), vendor.id) {
        Ok(payouts) => (
            StatusCode::OK,
            Json(serde_json::json!({ "balance": vendor.balance, "payouts": payouts })),
        )
            .into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}
