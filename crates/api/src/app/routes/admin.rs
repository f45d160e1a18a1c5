//! Admin console: email campaigns, vendor review and payout decisions.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::Utc;

use bazaar_campaigns::{CampaignDraft, CampaignUpdate};
use bazaar_core::{CampaignId, PayoutId, VendorId};
use bazaar_infra::vendors::{PayoutDecision, VendorDecision};

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::authz::require_permission;
use crate::context::{PrincipalContext, TenantContext};

pub fn router() -> Router {
    Router::new()
        .nest("/email-campaigns", campaigns_router())
        .nest("/vendors", vendors_router())
        .nest("/payouts", payouts_router())
}

fn campaigns_router() -> Router {
    Router::new()
        .route("/", get(list_campaigns).post(create_campaign))
        .route(
            "/:id",
            get(get_campaign).put(update_campaign).delete(delete_campaign),
        )
        .route("/:id/schedule", post(schedule_campaign))
        .route("/:id/unschedule", post(unschedule_campaign))
        .route("/:id/send", post(send_campaign))
        .route("/:id/outbox", get(campaign_outbox))
}

fn vendors_router() -> Router {
    Router::new()
        .route("/", get(list_vendors))
        .route("/:id/verify", post(verify_vendor))
        .route("/:id/reject", post(reject_vendor))
        .route("/:id/suspend", post(suspend_vendor))
        .route("/:id/reinstate", post(reinstate_vendor))
}

fn payouts_router() -> Router {
    Router::new()
        .route("/", get(list_payouts))
        .route("/:id/approve", post(approve_payout))
        .route("/:id/reject", post(reject_payout))
        .route("/:id/paid", post(mark_payout_paid))
}

// -------------------------
// Email campaigns
// -------------------------

const CAMPAIGNS: &str = "campaigns.manage";

pub async fn list_campaigns(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
) -> Response {
    if let Err(res) = require_permission(&tenant, &principal, CAMPAIGNS) {
        return res;
    }
    match services.campaigns.list(tenant.tenant_id()) {
        Ok(list) => (StatusCode::OK, Json(serde_json::json!({ "campaigns": list }))).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn create_campaign(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<CampaignDraft>,
) -> Response {
    if let Err(res) = require_permission(&tenant, &principal, CAMPAIGNS) {
        return res;
    }
    match services.campaigns.create(tenant.tenant_id(), body, Utc::now()) {
        Ok(c) => (StatusCode::CREATED, Json(c)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn get_campaign(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Response {
    if let Err(res) = require_permission(&tenant, &principal, CAMPAIGNS) {
        return res;
    }
    let id: CampaignId = match errors::parse_id(&id, "campaign") {
        Ok(v) => v,
        Err(res) => return res,
    };
    match services.campaigns.get(tenant.tenant_id(), id) {
        Ok(c) => (StatusCode::OK, Json(c)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn update_campaign(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<CampaignUpdate>,
) -> Response {
    if let Err(res) = require_permission(&tenant, &principal, CAMPAIGNS) {
        return res;
    }
    let id: CampaignId = match errors::parse_id(&id, "campaign") {
        Ok(v) => v,
        Err(res) => return res,
    };
    match services.campaigns.update(tenant.tenant_id(), id, body, Utc::now()) {
        Ok(c) => (StatusCode::OK, Json(c)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn delete_campaign(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Response {
    if let Err(res) = require_permission(&tenant, &principal, CAMPAIGNS) {
        return res;
    }
    let id: CampaignId = match errors::parse_id(&id, "campaign") {
        Ok(v) => v,
        Err(res) => return res,
    };
    match services.campaigns.delete(tenant.tenant_id(), id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn schedule_campaign(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::ScheduleCampaignRequest>,
) -> Response {
    if let Err(res) = require_permission(&tenant, &principal, CAMPAIGNS) {
        return res;
    }
    let id: CampaignId = match errors::parse_id(&id, "campaign") {
        Ok(v) => v,
        Err(res) => return res,
    };
    match services
        .campaigns
        .schedule(tenant.tenant_id(), id, body.scheduled_at, Utc::now())
    {
        Ok(c) => (StatusCode::OK, Json(c)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn unschedule_campaign(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Response {
    if let Err(res) = require_permission(&tenant, &principal, CAMPAIGNS) {
        return res;
    }
    let id: CampaignId = match errors::parse_id(&id, "campaign") {
        Ok(v) => v,
        Err(res) => return res,
    };
    match services.campaigns.unschedule(tenant.tenant_id(), id, Utc::now()) {
        Ok(c) => (StatusCode::OK, Json(c)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn send_campaign(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Response {
    if let Err(res) = require_permission(&tenant, &principal, CAMPAIGNS) {
        return res;
    }
    let id: CampaignId = match errors::parse_id(&id, "campaign") {
        Ok(v) => v,
        Err(res) => return res,
    };
    match services.campaigns.send(tenant.tenant_id(), id, Utc::now()) {
        Ok(c) => (StatusCode::OK, Json(c)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn campaign_outbox(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Response {
    if let Err(res) = require_permission(&tenant, &principal, CAMPAIGNS) {
        return res;
    }
    let id: CampaignId = match errors::parse_id(&id, "campaign") {
        Ok(v) => v,
        Err(res) => return res,
    };
    match services.campaigns.outbox(tenant.tenant_id(), id) {
        Ok(emails) => (StatusCode::OK, Json(serde_json::json!({ "emails": emails }))).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

// -------------------------
// Vendors
// -------------------------

const VENDOR_REVIEW: &str = "vendors.review";

pub async fn list_vendors(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
) -> Response {
    if let Err(res) = require_permission(&tenant, &principal, VENDOR_REVIEW) {
        return res;
    }
    match services.vendors.list(tenant.tenant_id()) {
        Ok(list) => (StatusCode::OK, Json(serde_json::json!({ "vendors": list }))).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

fn decide_vendor(
    services: &AppServices,
    tenant: &TenantContext,
    principal: &PrincipalContext,
    raw_id: &str,
    decision: VendorDecision,
) -> Response {
    if let Err(res) = require_permission(tenant, principal, VENDOR_REVIEW) {
        return res;
    }
    let id: VendorId = match errors::parse_id(raw_id, "vendor") {
        Ok(v) => v,
        Err(res) => return res,
    };
    match services.vendors.decide(tenant.tenant_id(), id, decision, Utc::now()) {
        Ok(v) => (StatusCode::OK, Json(v)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn verify_vendor(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Response {
    decide_vendor(&services, &tenant, &principal, &id, VendorDecision::Verify)
}

pub async fn reject_vendor(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::RejectRequest>,
) -> Response {
    let reason = body.reason.unwrap_or_default();
    decide_vendor(&services, &tenant, &principal, &id, VendorDecision::Reject { reason })
}

pub async fn suspend_vendor(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Response {
    decide_vendor(&services, &tenant, &principal, &id, VendorDecision::Suspend)
}

pub async fn reinstate_vendor(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Response {
    decide_vendor(&services, &tenant, &principal, &id, VendorDecision::Reinstate)
}

// -------------------------
// Payouts
// -------------------------

const PAYOUTS: &str = "payouts.approve";

pub async fn list_payouts(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
) -> Response {
    if let Err(res) = require_permission(&tenant, &principal, PAYOUTS) {
        return res;
    }
    match services.vendors.list_payouts(tenant.tenant_id()) {
        Ok(list) => (StatusCode::OK, Json(serde_json::json!({ "payouts": list }))).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

fn decide_payout(
    services: &AppServices,
    tenant: &TenantContext,
    principal: &PrincipalContext,
    raw_id: &str,
    decision: PayoutDecision,
) -> Response {
    if let Err(res) = require_permission(tenant, principal, PAYOUTS) {
        return res;
    }
    let id: PayoutId = match errors::parse_id(raw_id, "payout") {
        Ok(v) => v,
        Err(res) => return res,
    };
    match services.vendors.decide_payout(tenant.tenant_id(), id, decision, Utc::now()) {
        Ok(p) => (StatusCode::OK, Json(p)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn approve_payout(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Response {
    decide_payout(&services, &tenant, &principal, &id, PayoutDecision::Approve)
}

pub async fn reject_payout(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::RejectRequest>,
) -> Response {
    decide_payout(&services, &tenant, &principal, &id, PayoutDecision::Reject { note: body.reason })
}

pub async fn mark_payout_paid(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Response {
    decide_payout(&services, &tenant, &principal, &id, PayoutDecision::MarkPaid)
}
