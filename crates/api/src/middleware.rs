use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode, header},
    middleware::Next,
    response::Response,
};
use chrono::Utc;

use bazaar_auth::{CronSecret, JwtValidator};
use bazaar_ratelimit::{RateLimitDecision, RateLimiter};

use crate::app::errors::json_error;
use crate::context::{PrincipalContext, TenantContext};

pub const AUTH_COOKIE: &str = "auth_token";
pub const CRON_SECRET_HEADER: &str = "x-cron-secret";

#[derive(Clone)]
pub struct AuthState {
    pub jwt: Arc<dyn JwtValidator>,
}

pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Response {
    let Some(token) = extract_bearer(req.headers()).or_else(|| extract_cookie(req.headers(), AUTH_COOKIE)) else {
        return json_error(StatusCode::UNAUTHORIZED, "unauthorized", "missing bearer token");
    };

    let claims = match state.jwt.validate(&token, Utc::now()) {
        Ok(c) => c,
        Err(e) => {
            tracing::debug!(error = %e, "rejected token");
            return json_error(StatusCode::UNAUTHORIZED, "unauthorized", "invalid or expired token");
        }
    };

    req.extensions_mut().insert(TenantContext::new(claims.tenant_id));
    req.extensions_mut()
        .insert(PrincipalContext::new(claims.sub, claims.roles));

    next.run(req).await
}

fn extract_bearer(headers: &HeaderMap) -> Option<String> {
    let header = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = header.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then(|| token.to_string())
}

fn extract_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[derive(Clone)]
pub struct RateLimitState {
    pub limiter: RateLimiter,
}

pub async fn rate_limit_middleware(
    State(state): State<RateLimitState>,
    req: Request,
    next: Next,
) -> Response {
    if req.uri().path() == "/health" {
        return next.run(req).await;
    }

    let key = client_key(req.headers(), req.extensions().get::<ConnectInfo<SocketAddr>>());
    let decision = state.limiter.check(&key, Utc::now()).await;

    if !decision.allowed {
        tracing::info!(client = %key, "rate limit exceeded");
        let mut res = json_error(
            StatusCode::TOO_MANY_REQUESTS,
            "rate_limited",
            "too many requests, slow down",
        );
        let retry_secs = decision.retry_after.map(|d| d.as_secs().max(1)).unwrap_or(1);
        set_header(&mut res, header::RETRY_AFTER, retry_secs.to_string());
        set_limit_headers(&mut res, &decision);
        return res;
    }

    let mut res = next.run(req).await;
    set_limit_headers(&mut res, &decision);
    res
}

/// First `X-Forwarded-For` hop, then `X-Real-IP`, then the peer address.
pub fn client_key(headers: &HeaderMap, peer: Option<&ConnectInfo<SocketAddr>>) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    let real_ip = headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    forwarded
        .or(real_ip)
        .map(str::to_string)
        .or_else(|| peer.map(|ConnectInfo(addr)| addr.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}

fn set_limit_headers(res: &mut Response, decision: &RateLimitDecision) {
    set_header(res, HeaderName::from_static("x-ratelimit-limit"), decision.limit.to_string());
    set_header(res, HeaderName::from_static("x-ratelimit-remaining"), decision.remaining.to_string());
    set_header(
        res,
        HeaderName::from_static("x-ratelimit-reset"),
        decision.resets_at.timestamp().to_string(),
    );
}

fn set_header(res: &mut Response, name: HeaderName, value: String) {
    if let Ok(v) = HeaderValue::from_str(&value) {
        res.headers_mut().insert(name, v);
    }
}

pub async fn cron_middleware(
    State(secret): State<Arc<CronSecret>>,
    req: Request,
    next: Next,
) -> Response {
    let presented = req
        .headers()
        .get(CRON_SECRET_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if !secret.verify(presented) {
        tracing::warn!(path = %req.uri().path(), "cron call with bad secret");
        return json_error(StatusCode::UNAUTHORIZED, "unauthorized", "invalid cron secret");
    }
    next.run(req).await
}
