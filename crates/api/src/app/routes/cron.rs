//! Scheduler-driven endpoints. Authenticated by `x-cron-secret`, not a JWT.
//! Each route accepts GET (hosted cron services) and POST.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::Utc;

use crate::app::errors;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/exports", get(process_exports).post(process_exports))
        .route("/exports/expire", get(expire_exports).post(expire_exports))
        .route("/campaigns", get(dispatch_campaigns).post(dispatch_campaigns))
}

pub async fn process_exports(Extension(services): Extension<Arc<AppServices>>) -> Response {
    match services.export_worker.run_once(Utc::now()).await {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn expire_exports(Extension(services): Extension<Arc<AppServices>>) -> Response {
    match services.export_worker.expire_stale(Utc::now()).await {
        Ok(expired) => (StatusCode::OK, Json(serde_json::json!({ "expired": expired }))).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn dispatch_campaigns(Extension(services): Extension<Arc<AppServices>>) -> Response {
    match services.campaigns.dispatch_due(Utc::now()) {
        Ok(sent) => (StatusCode::OK, Json(serde_json::json!({ "sent": sent }))).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}
