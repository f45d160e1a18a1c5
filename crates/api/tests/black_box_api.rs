use std::net::SocketAddr;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use bazaar_auth::{JwtClaims, Role};
use bazaar_core::{ProductId, TenantId, UserId};
use bazaar_infra::AppConfig;
use bazaar_ratelimit::RateLimitPolicy;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::{Value, json};

const JWT_SECRET: &str = "test-secret";
const CRON_SECRET: &str = "cron-test-secret";

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        Self::spawn_with(test_config()).await
    }

    async fn spawn_with(config: AppConfig) -> Self {
        // Same router as prod, bound to an ephemeral port.
        let (app, _services) = bazaar_api::app::build_app(&config)
            .await
            .expect("failed to build app");
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
                .await
                .unwrap();
        });

        Self { base_url, handle }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn test_config() -> AppConfig {
    AppConfig {
        jwt_secret: JWT_SECRET.to_string(),
        cron_secret: CRON_SECRET.to_string(),
        ..AppConfig::default()
    }
}

fn mint_jwt(tenant_id: TenantId, user_id: UserId, roles: Vec<Role>) -> String {
    let now = Utc::now();
    let claims = JwtClaims {
        sub: user_id,
        tenant_id,
        roles,
        issued_at: now - ChronoDuration::seconds(5),
        expires_at: now + ChronoDuration::minutes(10),
    };

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .expect("failed to encode jwt")
}

async fn expect_status(res: reqwest::Response, expected: StatusCode) -> Value {
    let status = res.status();
    let body = res.text().await.unwrap_or_default();
    assert_eq!(status, expected, "unexpected status, body: {body}");
    if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_str(&body).unwrap()
    }
}

/// One line of 2 x 50.00, which ships free on the standard rate.
fn hundred_dollar_cart() -> Value {
    json!({
        "lines": [{ "product_id": ProductId::new(), "unit_price": 5000, "quantity": 2 }],
        "region": "US"
    })
}

async fn advance_to(client: &reqwest::Client, srv: &TestServer, token: &str, order_id: &str, statuses: &[&str]) {
    for status in statuses {
        let res = client
            .post(srv.url(&format!("/api/orders/{order_id}/status")))
            .bearer_auth(token)
            .json(&json!({ "status": status }))
            .send()
            .await
            .unwrap();
        expect_status(res, StatusCode::OK).await;
    }
}

#[tokio::test]
async fn auth_required_for_api_routes() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client.get(srv.url("/api/whoami")).send().await.unwrap();
    let body = expect_status(res, StatusCode::UNAUTHORIZED).await;
    assert_eq!(body["error"], "unauthorized");

    let res = client
        .get(srv.url("/api/whoami"))
        .bearer_auth("not-a-jwt")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn tenant_context_from_header_or_cookie() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let (tenant_id, user_id) = (TenantId::new(), UserId::new());
    let token = mint_jwt(tenant_id, user_id, vec![Role::customer()]);

    let res = client
        .get(srv.url("/api/whoami"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let body = expect_status(res, StatusCode::OK).await;
    assert_eq!(body["tenant_id"].as_str().unwrap(), tenant_id.to_string());
    assert_eq!(body["user_id"].as_str().unwrap(), user_id.to_string());
    assert!(body["permissions"].as_array().unwrap().iter().any(|p| p == "games.play"));

    let res = client
        .get(srv.url("/api/whoami"))
        .header("cookie", format!("theme=dark; auth_token={token}"))
        .send()
        .await
        .unwrap();
    let body = expect_status(res, StatusCode::OK).await;
    assert_eq!(body["user_id"].as_str().unwrap(), user_id.to_string());
}

#[tokio::test]
async fn health_reports_unconfigured_backends() {
    let srv = TestServer::spawn().await;
    let res = reqwest::get(srv.url("/health")).await.unwrap();
    let body = expect_status(res, StatusCode::OK).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "not_configured");
    assert_eq!(body["cache"], "not_configured");
}

#[tokio::test]
async fn requests_beyond_the_window_limit_get_429() {
    let srv = TestServer::spawn_with(AppConfig {
        rate_limit: RateLimitPolicy::new(3, Duration::from_secs(60)),
        ..test_config()
    })
    .await;
    let client = reqwest::Client::new();

    for remaining in ["2", "1", "0"] {
        let res = client.get(srv.url("/api/whoami")).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(res.headers()["x-ratelimit-limit"], "3");
        assert_eq!(res.headers()["x-ratelimit-remaining"], remaining);
    }

    let res = client.get(srv.url("/api/whoami")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
    let retry_after: u64 = res.headers()["retry-after"].to_str().unwrap().parse().unwrap();
    assert!((1..=60).contains(&retry_after));
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "rate_limited");

    // A different client address has its own window.
    let res = client
        .get(srv.url("/api/whoami"))
        .header("x-forwarded-for", "203.0.113.9")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client.get(srv.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn games_allow_three_plays_per_day() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let token = mint_jwt(TenantId::new(), UserId::new(), vec![Role::customer()]);

    let res = client
        .get(srv.url("/api/gamification/games"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let body = expect_status(res, StatusCode::OK).await;
    assert_eq!(body["games"].as_array().unwrap().len(), 2);
    let rewards = body["rewards"].as_array().unwrap();
    assert_eq!(rewards.len(), 7);
    assert_eq!(rewards.iter().filter(|r| r["coupon"] == true).count(), 3);

    for left in [2, 1, 0] {
        let res = client
            .post(srv.url("/api/gamification/games/spin-wheel/play"))
            .bearer_auth(&token)
            .send()
            .await
            .unwrap();
        let body = expect_status(res, StatusCode::OK).await;
        assert_eq!(body["plays_left"], left);
        assert_eq!(body["game"], "spin-wheel");
    }

    let res = client
        .post(srv.url("/api/gamification/games/spin-wheel/play"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    expect_status(res, StatusCode::CONFLICT).await;

    // Other games keep their own allowance.
    let res = client
        .post(srv.url("/api/gamification/games/scratch-card/play"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    expect_status(res, StatusCode::OK).await;

    let res = client
        .post(srv.url("/api/gamification/games/roulette/play"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    expect_status(res, StatusCode::NOT_FOUND).await;
}

#[tokio::test]
async fn delivered_order_earns_points_that_redeem_into_a_coupon() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let tenant_id = TenantId::new();
    let buyer = mint_jwt(tenant_id, UserId::new(), vec![Role::customer()]);
    let admin = mint_jwt(tenant_id, UserId::new(), vec![Role::admin()]);

    let res = client
        .post(srv.url("/api/loyalty/redeem"))
        .bearer_auth(&buyer)
        .json(&json!({ "points": 100 }))
        .send()
        .await
        .unwrap();
    expect_status(res, StatusCode::BAD_REQUEST).await;

    let res = client
        .post(srv.url("/api/orders"))
        .bearer_auth(&buyer)
        .json(&hundred_dollar_cart())
        .send()
        .await
        .unwrap();
    let order = expect_status(res, StatusCode::CREATED).await;
    assert_eq!(order["status"], "pending");
    assert_eq!(order["totals"]["total"], 10_000);
    let order_id = order["id"].as_str().unwrap().to_string();

    // Buyers cannot drive fulfilment; skipping states is rejected.
    let res = client
        .post(srv.url(&format!("/api/orders/{order_id}/status")))
        .bearer_auth(&buyer)
        .json(&json!({ "status": "shipped" }))
        .send()
        .await
        .unwrap();
    expect_status(res, StatusCode::FORBIDDEN).await;
    let res = client
        .post(srv.url(&format!("/api/orders/{order_id}/status")))
        .bearer_auth(&admin)
        .json(&json!({ "status": "delivered" }))
        .send()
        .await
        .unwrap();
    expect_status(res, StatusCode::UNPROCESSABLE_ENTITY).await;

    advance_to(&client, &srv, &admin, &order_id, &["confirmed", "processing", "shipped", "delivered"]).await;

    let res = client
        .get(srv.url("/api/loyalty"))
        .bearer_auth(&buyer)
        .send()
        .await
        .unwrap();
    let account = expect_status(res, StatusCode::OK).await;
    assert_eq!(account["balance"], 100);
    assert_eq!(account["tier"], "bronze");

    let res = client
        .post(srv.url("/api/loyalty/redeem"))
        .bearer_auth(&buyer)
        .json(&json!({ "points": 100 }))
        .send()
        .await
        .unwrap();
    let redemption = expect_status(res, StatusCode::CREATED).await;
    assert_eq!(redemption["account"]["balance"], 0);
    assert_eq!(redemption["coupon"]["kind"]["type"], "amount_off");
    assert_eq!(redemption["coupon"]["kind"]["amount"], 100);
    let code = redemption["coupon"]["code"].as_str().unwrap().to_string();
    assert!(code.starts_with("BZR-"));

    let mut cart = hundred_dollar_cart();
    cart["coupon_code"] = json!(code);
    let res = client
        .post(srv.url("/api/orders/quote"))
        .bearer_auth(&buyer)
        .json(&cart)
        .send()
        .await
        .unwrap();
    let quote = expect_status(res, StatusCode::OK).await;
    assert_eq!(quote["totals"]["discount"], 100);
    assert_eq!(quote["totals"]["total"], 9_900);

    let res = client
        .get(srv.url("/api/loyalty/coupons"))
        .bearer_auth(&buyer)
        .send()
        .await
        .unwrap();
    let body = expect_status(res, StatusCode::OK).await;
    assert_eq!(body["coupons"].as_array().unwrap().len(), 1);

    // Orders are private to the buyer (and seller, and admins).
    let stranger = mint_jwt(tenant_id, UserId::new(), vec![Role::customer()]);
    let res = client
        .get(srv.url(&format!("/api/orders/{order_id}")))
        .bearer_auth(&stranger)
        .send()
        .await
        .unwrap();
    expect_status(res, StatusCode::NOT_FOUND).await;
}

#[tokio::test]
async fn cron_processes_exports_into_data_urls() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let token = mint_jwt(TenantId::new(), UserId::new(), vec![Role::customer()]);

    let res = client
        .post(srv.url("/api/exports"))
        .bearer_auth(&token)
        .json(&json!({ "format": "json" }))
        .send()
        .await
        .unwrap();
    let created = expect_status(res, StatusCode::CREATED).await;
    assert_eq!(created["status"], "pending");
    let export_id = created["id"].as_str().unwrap().to_string();

    let res = client
        .post(srv.url("/api/exports"))
        .bearer_auth(&token)
        .json(&json!({ "format": "csv" }))
        .send()
        .await
        .unwrap();
    expect_status(res, StatusCode::CONFLICT).await;

    let res = client
        .post(srv.url("/api/exports"))
        .bearer_auth(&token)
        .json(&json!({ "format": "xlsx" }))
        .send()
        .await
        .unwrap();
    expect_status(res, StatusCode::BAD_REQUEST).await;

    let res = client.post(srv.url("/api/cron/exports")).send().await.unwrap();
    expect_status(res, StatusCode::UNAUTHORIZED).await;
    let res = client
        .post(srv.url("/api/cron/exports"))
        .header("x-cron-secret", "wrong")
        .send()
        .await
        .unwrap();
    expect_status(res, StatusCode::UNAUTHORIZED).await;

    let res = client
        .get(srv.url("/api/cron/exports"))
        .header("x-cron-secret", CRON_SECRET)
        .send()
        .await
        .unwrap();
    let report = expect_status(res, StatusCode::OK).await;
    assert_eq!(report["claimed"], 1);
    assert_eq!(report["completed"], 1);

    let res = client
        .get(srv.url(&format!("/api/exports/{export_id}")))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let export = expect_status(res, StatusCode::OK).await;
    assert_eq!(export["status"], "completed");
    assert!(
        export["download_url"]
            .as_str()
            .unwrap()
            .starts_with("data:application/json;base64,")
    );

    let res = client
        .get(srv.url("/api/exports"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let list = expect_status(res, StatusCode::OK).await;
    assert_eq!(list["exports"].as_array().unwrap().len(), 1);

    let res = client
        .post(srv.url("/api/cron/exports/expire"))
        .header("x-cron-secret", CRON_SECRET)
        .send()
        .await
        .unwrap();
    let body = expect_status(res, StatusCode::OK).await;
    assert_eq!(body["expired"], 0);
}

#[tokio::test]
async fn campaign_lifecycle_guards_delete_and_queues_emails() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let tenant_id = TenantId::new();
    let admin = mint_jwt(tenant_id, UserId::new(), vec![Role::admin()]);
    let shopper = mint_jwt(tenant_id, UserId::new(), vec![Role::customer()]);

    let res = client
        .put(srv.url("/api/profile"))
        .bearer_auth(&shopper)
        .json(&json!({ "email": "ada@example.com", "display_name": "Ada", "marketing_opt_in": true }))
        .send()
        .await
        .unwrap();
    expect_status(res, StatusCode::OK).await;

    let draft = json!({ "name": "Spring sale", "subject": "Hi {{name}}", "body_template": "Hello {{ name }} <{{email}}>" });
    let res = client
        .post(srv.url("/api/admin/email-campaigns"))
        .bearer_auth(&shopper)
        .json(&draft)
        .send()
        .await
        .unwrap();
    expect_status(res, StatusCode::FORBIDDEN).await;

    let res = client
        .post(srv.url("/api/admin/email-campaigns"))
        .bearer_auth(&admin)
        .json(&draft)
        .send()
        .await
        .unwrap();
    let campaign = expect_status(res, StatusCode::CREATED).await;
    assert_eq!(campaign["status"], "draft");
    let id = campaign["id"].as_str().unwrap().to_string();

    let res = client
        .post(srv.url(&format!("/api/admin/email-campaigns/{id}/schedule")))
        .bearer_auth(&admin)
        .json(&json!({ "scheduled_at": (Utc::now() + ChronoDuration::days(1)).to_rfc3339() }))
        .send()
        .await
        .unwrap();
    let scheduled = expect_status(res, StatusCode::OK).await;
    assert_eq!(scheduled["status"], "scheduled");

    let res = client
        .delete(srv.url(&format!("/api/admin/email-campaigns/{id}")))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    expect_status(res, StatusCode::UNPROCESSABLE_ENTITY).await;

    let res = client
        .post(srv.url(&format!("/api/admin/email-campaigns/{id}/send")))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    let sent = expect_status(res, StatusCode::OK).await;
    assert_eq!(sent["status"], "sent");
    assert_eq!(sent["recipients_count"], 1);

    let res = client
        .get(srv.url(&format!("/api/admin/email-campaigns/{id}/outbox")))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    let outbox = expect_status(res, StatusCode::OK).await;
    let emails = outbox["emails"].as_array().unwrap();
    assert_eq!(emails.len(), 1);
    assert_eq!(emails[0]["to"], "ada@example.com");
    assert_eq!(emails[0]["subject"], "Hi Ada");
    assert_eq!(emails[0]["body"], "Hello Ada <ada@example.com>");
    assert_eq!(emails[0]["status"], "pending");

    let res = client
        .delete(srv.url(&format!("/api/admin/email-campaigns/{id}")))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    expect_status(res, StatusCode::UNPROCESSABLE_ENTITY).await;

    // A fresh draft can be deleted.
    let res = client
        .post(srv.url("/api/admin/email-campaigns"))
        .bearer_auth(&admin)
        .json(&draft)
        .send()
        .await
        .unwrap();
    let other = expect_status(res, StatusCode::CREATED).await;
    let other_id = other["id"].as_str().unwrap();
    let res = client
        .delete(srv.url(&format!("/api/admin/email-campaigns/{other_id}")))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    expect_status(res, StatusCode::NO_CONTENT).await;
    let res = client
        .get(srv.url(&format!("/api/admin/email-campaigns/{other_id}")))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    expect_status(res, StatusCode::NOT_FOUND).await;
}

#[tokio::test]
async fn vendor_sales_fund_payouts() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let tenant_id = TenantId::new();
    let seller_id = UserId::new();
    let seller = mint_jwt(tenant_id, seller_id, vec![Role::vendor()]);
    let buyer = mint_jwt(tenant_id, UserId::new(), vec![Role::customer()]);
    let admin = mint_jwt(tenant_id, UserId::new(), vec![Role::admin()]);

    let res = client
        .post(srv.url("/api/vendors"))
        .bearer_auth(&seller)
        .json(&json!({ "display_name": "Tea Corner" }))
        .send()
        .await
        .unwrap();
    let vendor = expect_status(res, StatusCode::CREATED).await;
    assert_eq!(vendor["status"], "pending");
    let vendor_id = vendor["id"].as_str().unwrap().to_string();

    let res = client
        .post(srv.url("/api/vendors"))
        .bearer_auth(&seller)
        .json(&json!({ "display_name": "Tea Corner Again" }))
        .send()
        .await
        .unwrap();
    expect_status(res, StatusCode::CONFLICT).await;

    // Unverified vendors cannot take orders or request payouts.
    let mut cart = hundred_dollar_cart();
    cart["vendor_id"] = json!(vendor_id);
    let res = client
        .post(srv.url("/api/orders"))
        .bearer_auth(&buyer)
        .json(&cart)
        .send()
        .await
        .unwrap();
    expect_status(res, StatusCode::BAD_REQUEST).await;

    let res = client
        .post(srv.url(&format!("/api/admin/vendors/{vendor_id}/verify")))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    let verified = expect_status(res, StatusCode::OK).await;
    assert_eq!(verified["status"], "verified");

    let res = client
        .post(srv.url("/api/orders"))
        .bearer_auth(&buyer)
        .json(&cart)
        .send()
        .await
        .unwrap();
    let order = expect_status(res, StatusCode::CREATED).await;
    let order_id = order["id"].as_str().unwrap().to_string();

    let res = client
        .get(srv.url("/api/vendors/orders"))
        .bearer_auth(&seller)
        .send()
        .await
        .unwrap();
    let body = expect_status(res, StatusCode::OK).await;
    assert_eq!(body["orders"].as_array().unwrap().len(), 1);

    advance_to(&client, &srv, &seller, &order_id, &["confirmed", "processing", "shipped", "delivered"]).await;

    let res = client
        .get(srv.url("/api/vendors/me"))
        .bearer_auth(&seller)
        .send()
        .await
        .unwrap();
    let me = expect_status(res, StatusCode::OK).await;
    assert_eq!(me["balance"]["available"], 9_000);

    let res = client
        .post(srv.url("/api/vendors/payouts"))
        .bearer_auth(&seller)
        .json(&json!({ "amount": 999 }))
        .send()
        .await
        .unwrap();
    expect_status(res, StatusCode::BAD_REQUEST).await;

    let res = client
        .post(srv.url("/api/vendors/payouts"))
        .bearer_auth(&seller)
        .json(&json!({ "amount": 4_000 }))
        .send()
        .await
        .unwrap();
    let payout = expect_status(res, StatusCode::CREATED).await;
    assert_eq!(payout["status"], "requested");
    let payout_id = payout["id"].as_str().unwrap().to_string();

    let res = client
        .get(srv.url("/api/vendors/payouts"))
        .bearer_auth(&seller)
        .send()
        .await
        .unwrap();
    let body = expect_status(res, StatusCode::OK).await;
    assert_eq!(body["balance"]["available"], 5_000);
    assert_eq!(body["balance"]["held"], 4_000);

    let res = client
        .post(srv.url(&format!("/api/admin/payouts/{payout_id}/paid")))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    expect_status(res, StatusCode::UNPROCESSABLE_ENTITY).await;

    for action in ["approve", "paid"] {
        let res = client
            .post(srv.url(&format!("/api/admin/payouts/{payout_id}/{action}")))
            .bearer_auth(&admin)
            .send()
            .await
            .unwrap();
        expect_status(res, StatusCode::OK).await;
    }

    let res = client
        .get(srv.url("/api/vendors/me"))
        .bearer_auth(&seller)
        .send()
        .await
        .unwrap();
    let me = expect_status(res, StatusCode::OK).await;
    assert_eq!(me["balance"]["available"], 5_000);
    assert_eq!(me["balance"]["held"], 0);

    let res = client
        .post(srv.url(&format!("/api/admin/vendors/{vendor_id}/reject")))
        .bearer_auth(&admin)
        .json(&json!({ "reason": "too late" }))
        .send()
        .await
        .unwrap();
    expect_status(res, StatusCode::UNPROCESSABLE_ENTITY).await;
}

#[tokio::test]
async fn suspended_vendor_cannot_fulfil_orders() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let tenant_id = TenantId::new();
    let seller = mint_jwt(tenant_id, UserId::new(), vec![Role::vendor()]);
    let buyer = mint_jwt(tenant_id, UserId::new(), vec![Role::customer()]);
    let admin = mint_jwt(tenant_id, UserId::new(), vec![Role::admin()]);

    let res = client
        .post(srv.url("/api/vendors"))
        .bearer_auth(&seller)
        .json(&json!({ "display_name": "Night Market" }))
        .send()
        .await
        .unwrap();
    let vendor = expect_status(res, StatusCode::CREATED).await;
    let vendor_id = vendor["id"].as_str().unwrap().to_string();

    let res = client
        .post(srv.url(&format!("/api/admin/vendors/{vendor_id}/verify")))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    expect_status(res, StatusCode::OK).await;

    let mut cart = hundred_dollar_cart();
    cart["vendor_id"] = json!(vendor_id);
    let res = client
        .post(srv.url("/api/orders"))
        .bearer_auth(&buyer)
        .json(&cart)
        .send()
        .await
        .unwrap();
    let order = expect_status(res, StatusCode::CREATED).await;
    let order_id = order["id"].as_str().unwrap().to_string();

    let res = client
        .post(srv.url(&format!("/api/admin/vendors/{vendor_id}/suspend")))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    expect_status(res, StatusCode::OK).await;

    let res = client
        .post(srv.url(&format!("/api/orders/{order_id}/status")))
        .bearer_auth(&seller)
        .json(&json!({ "status": "confirmed" }))
        .send()
        .await
        .unwrap();
    expect_status(res, StatusCode::NOT_FOUND).await;

    let res = client
        .get(srv.url(&format!("/api/orders/{order_id}")))
        .bearer_auth(&buyer)
        .send()
        .await
        .unwrap();
    let unchanged = expect_status(res, StatusCode::OK).await;
    assert_eq!(unchanged["status"], "pending");

    let res = client
        .post(srv.url(&format!("/api/admin/vendors/{vendor_id}/reinstate")))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    expect_status(res, StatusCode::OK).await;
    advance_to(&client, &srv, &seller, &order_id, &["confirmed"]).await;
}
