pub mod auth_handlers;
mod download;
mod pages;
pub mod upload;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_governor::{governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer};
use tower_http::limit::RequestBodyLimitLayer;

use crate::state::AppState;

/// Login, login page and logout. Only `POST /auth` is rate-limited (per IP).
pub fn auth_router(login_requests_per_minute: u32) -> anyhow::Result<Router<AppState>> {
    let burst = login_requests_per_minute.max(1);
    let period_per_request = (60 / burst).max(1);
    let governor_config = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(period_per_request.into())
            .burst_size(burst)
            .key_extractor(SmartIpKeyExtractor)
            .finish()
            .ok_or_else(|| anyhow::anyhow!("invalid login rate limit: {burst} per minute"))?,
    );

    let login = post(auth_handlers::login)
        .layer(GovernorLayer::<_, _, axum::body::Body>::new(governor_config));

    Ok(Router::new()
        .route("/auth", get(auth_handlers::login_page).merge(login))
        .route("/exit", get(auth_handlers::exit)))
}

pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/", get(pages::index))
        .route("/download/{*path}", get(download::download))
}

/// Upload routes carry their own body limit instead of the global one.
pub fn upload_router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/upload", get(upload::upload_form).post(upload::upload))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_upload_bytes))
}
