use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::Utc;

use bazaar_core::ExportRequestId;
use bazaar_exports::{DataExportRequest, ExportFormat};

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::authz::require_permission;
use crate::context::{PrincipalContext, TenantContext};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_exports).post(request_export))
        .route("/:id", get(get_export))
}

pub async fn request_export(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<dto::CreateExportRequest>,
) -> Response {
    if let Err(res) = require_permission(&tenant, &principal, "exports.request") {
        return res;
    }
    let format: ExportFormat = match body.format.parse() {
        Ok(f) => f,
        Err(e) => return errors::domain_error_to_response(e),
    };

    let request = DataExportRequest::new(tenant.tenant_id(), principal.user_id(), format, Utc::now());
    if let Err(e) = services.exports.insert(&request).await {
        return errors::store_error_to_response(e);
    }
    tracing::info!(
        tenant_id = %tenant.tenant_id(),
        export_id = %request.id,
        format = format.as_str(),
        "data export requested"
    );

    (StatusCode::CREATED, Json(dto::ExportView::from(request))).into_response()
}

pub async fn list_exports(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
) -> Response {
    if let Err(res) = require_permission(&tenant, &principal, "exports.read") {
        return res;
    }
    match services
        .exports
        .list_for_user(tenant.tenant_id(), principal.user_id())
        .await
    {
        Ok(rows) => {
            let exports: Vec<dto::ExportView> = rows.into_iter().map(Into::into).collect();
            (StatusCode::OK, Json(serde_json::json!({ "exports": exports }))).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn get_export(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Response {
    if let Err(res) = require_permission(&tenant, &principal, "exports.read") {
        return res;
    }
    let id: ExportRequestId = match errors::parse_id(&id, "export") {
        Ok(v) => v,
        Err(res) => return res,
    };

    match services.exports.get(tenant.tenant_id(), id).await {
        // Other users' exports are indistinguishable from missing ones.
        Ok(Some(row)) if row.user_id == principal.user_id() => {
            (StatusCode::OK, Json(dto::ExportView::from(row))).into_response()
        }
        Ok(_) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "export not found"),
        Err(e) => errors::store_error_to_response(e),
    }
}
