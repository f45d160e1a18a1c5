use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::Utc;

use bazaar_loyalty::GameKind;

use crate::app::errors;
use crate::app::services::AppServices;
use crate::authz::require_permission;
use crate::context::{PrincipalContext, TenantContext};

pub fn router() -> Router {
    Router::new()
        .route("/games", get(list_games))
        .route("/games/:game/play", post(play_game))
        .route("/plays", get(list_plays))
}

pub async fn list_games(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
) -> Response {
    if let Err(res) = require_permission(&tenant, &principal, "games.play") {
        return res;
    }

    let games = match services
        .loyalty
        .games(tenant.tenant_id(), principal.user_id(), Utc::now())
    {
        Ok(g) => g,
        Err(e) => return errors::store_error_to_response(e),
    };
    let rewards: Vec<_> = services
        .loyalty
        .rewards()
        .entries()
        .iter()
        .map(|entry| {
            serde_json::json!({
                "reward": entry.reward,
                "label": entry.reward.label(),
                "coupon": entry.reward.issues_coupon(),
                "weight": entry.weight,
            })
        })
        .collect();

    (StatusCode::OK, Json(serde_json::json!({ "games": games, "rewards": rewards }))).into_response()
}

pub async fn play_game(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(game): Path<String>,
) -> Response {
    if let Err(res) = require_permission(&tenant, &principal, "games.play") {
        return res;
    }
    let game = match GameKind::from_slug(&game) {
        Ok(g) => g,
        Err(_) => return errors::json_error(StatusCode::NOT_FOUND, "not_found", format!("unknown game '{game}'")),
    };

    match services
        .loyalty
        .play(tenant.tenant_id(), principal.user_id(), game, Utc::now())
    {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn list_plays(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
) -> Response {
    if let Err(res) = require_permission(&tenant, &principal, "loyalty.read") {
        return res;
    }
    match services.loyalty.plays(tenant.tenant_id(), principal.user_id()) {
        Ok(plays) => (StatusCode::OK, Json(serde_json::json!({ "plays": plays }))).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}
