use std::sync::Arc;

use axum::{
    Json,
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;

use bazaar_infra::profiles::ProfileUpdate;

use crate::app::errors;
use crate::app::services::AppServices;
use crate::context::{PrincipalContext, TenantContext};

pub async fn get_profile(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
) -> Response {
    match services
        .profiles
        .get(tenant.tenant_id(), principal.user_id(), Utc::now())
    {
        Ok(profile) => (StatusCode::OK, Json(profile)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn update_profile(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<ProfileUpdate>,
) -> Response {
    match services
        .profiles
        .update(tenant.tenant_id(), principal.user_id(), body, Utc::now())
    {
        Ok(profile) => (StatusCode::OK, Json(profile)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}
