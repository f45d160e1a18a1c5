use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::Utc;

use bazaar_core::OrderId;
use bazaar_infra::orders::Checkout;
use bazaar_orders::{Order, OrderStatus};

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::authz::{check_permission, require_permission};
use crate::context::{PrincipalContext, TenantContext};

pub fn router() -> Router {
    Router::new()
        .route("/", post(place_order).get(list_orders))
        .route("/quote", post(quote))
        .route("/:id", get(get_order))
        .route("/:id/status", post(update_status))
}

pub async fn quote(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<Checkout>,
) -> Response {
    if let Err(res) = require_permission(&tenant, &principal, "orders.create") {
        return res;
    }
    match services
        .orders
        .quote(tenant.tenant_id(), principal.user_id(), &body, Utc::now())
    {
        Ok(q) => (StatusCode::OK, Json(q)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn place_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<Checkout>,
) -> Response {
    if let Err(res) = require_permission(&tenant, &principal, "orders.create") {
        return res;
    }
    match services
        .orders
        .place(tenant.tenant_id(), principal.user_id(), body, Utc::now())
    {
        Ok(order) => (StatusCode::CREATED, Json(order)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn list_orders(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
) -> Response {
    if let Err(res) = require_permission(&tenant, &principal, "orders.read") {
        return res;
    }
    match services
        .orders
        .list_for_buyer(tenant.tenant_id(), principal.user_id())
    {
        Ok(orders) => (StatusCode::OK, Json(serde_json::json!({ "orders": orders }))).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

/// How the caller relates to an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OrderRole {
    Admin,
    Seller,
    Buyer,
}

fn order_role(
    services: &AppServices,
    tenant: &TenantContext,
    principal: &PrincipalContext,
    order: &Order,
) -> Result<Option<OrderRole>, Response> {
    if principal.is_admin() {
        return Ok(Some(OrderRole::Admin));
    }
    if let Some(vendor_id) = order.vendor_id {
        if check_permission(tenant, principal, "orders.fulfil").is_ok() {
            let own = services
                .vendors
                .for_owner(tenant.tenant_id(), principal.user_id())
                .map_err(errors::store_error_to_response)?;
            if own.is_some_and(|v| v.id == vendor_id && v.is_verified()) {
                return Ok(Some(OrderRole::Seller));
            }
        }
    }
    if order.buyer_id == principal.user_id() {
        return Ok(Some(OrderRole::Buyer));
    }
    Ok(None)
}

fn load_visible_order(
    services: &AppServices,
    tenant: &TenantContext,
    principal: &PrincipalContext,
    raw_id: &str,
) -> Result<(Order, OrderRole), Response> {
    let id: OrderId = errors::parse_id(raw_id, "order")?;
    let order = services
        .orders
        .get(tenant.tenant_id(), id)
        .map_err(errors::store_error_to_response)?;
    match order_role(services, tenant, principal, &order)? {
        Some(role) => Ok((order, role)),
        None => Err(errors::json_error(StatusCode::NOT_FOUND, "not_found", "order not found")),
    }
}

pub async fn get_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Response {
    if let Err(res) = require_permission(&tenant, &principal, "orders.read") {
        return res;
    }
    match load_visible_order(&services, &tenant, &principal, &id) {
        Ok((order, _)) => (StatusCode::OK, Json(order)).into_response(),
        Err(res) => res,
    }
}

/// Buyers may only cancel; sellers run fulfilment; refunds are admin-only.
fn may_set_status(role: OrderRole, next: OrderStatus) -> bool {
    match role {
        OrderRole::Admin => true,
        OrderRole::Seller => next != OrderStatus::Refunded,
        OrderRole::Buyer => next == OrderStatus::Cancelled,
    }
}

pub async fn update_status(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::OrderStatusRequest>,
) -> Response {
    let next: OrderStatus = match body.status.parse() {
        Ok(s) => s,
        Err(e) => return errors::domain_error_to_response(e),
    };
    let (order, role) = match load_visible_order(&services, &tenant, &principal, &id) {
        Ok(v) => v,
        Err(res) => return res,
    };
    if !may_set_status(role, next) {
        return errors::json_error(
            StatusCode::FORBIDDEN,
            "forbidden",
            format!("not allowed to mark this order {}", next.as_str()),
        );
    }

    match services
        .orders
        .transition(tenant.tenant_id(), order.id, next, Utc::now())
    {
        Ok(order) => (StatusCode::OK, Json(order)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buyers_can_only_cancel() {
        assert!(may_set_status(OrderRole::Buyer, OrderStatus::Cancelled));
        assert!(!may_set_status(OrderRole::Buyer, OrderStatus::Shipped));
        assert!(may_set_status(OrderRole::Seller, OrderStatus::Delivered));
        assert!(!may_set_status(OrderRole::Seller, OrderStatus::Refunded));
        assert!(may_set_status(OrderRole::Admin, OrderStatus::Refunded));
    }
}
