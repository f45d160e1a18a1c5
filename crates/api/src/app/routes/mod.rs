use axum::{Router, routing::get};

pub mod admin;
pub mod cron;
pub mod exports;
pub mod gamification;
pub mod loyalty;
pub mod orders;
pub mod profile;
pub mod system;
pub mod vendors;

/// Router for all authenticated (tenant-scoped) endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .route("/profile", get(profile::get_profile).put(profile::update_profile))
        .nest("/gamification", gamification::router())
        .nest("/loyalty", loyalty::router())
        .nest("/exports", exports::router())
        .nest("/orders", orders::router())
        .nest("/vendors", vendors::router())
        .nest("/admin", admin::router())
}
