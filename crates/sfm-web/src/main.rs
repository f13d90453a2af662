mod api;
mod auth;
mod config;
mod dto;
mod error;
mod middleware;
mod state;
mod static_files;
mod workspace;
mod ws;

use std::time::Duration;

use axum::http::{header, Method};
use axum::middleware::from_fn;
use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::ServerConfig;
use crate::state::AppState;

/// Body limit for everything except uploads.
const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sfm_web=debug,sfm_core=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::load()?;
    let bind_addr = config.bind_addr;
    let tls_config = config.tls.clone();
    tracing::info!(
        "Workspace home: {} (session scope: {:?})",
        config.filesystem.home.display(),
        config.session.scope
    );

    let state = AppState::new(config);

    // Expired revocation and workspace cleanup task
    let cleanup_state = state.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(60));
        loop {
            interval.tick().await;
            cleanup_state.purge_expired();
        }
    });

    let app = build_app(state)?;

    if let (Some(cert), Some(key)) = (&tls_config.cert_path, &tls_config.key_path) {
        use axum_server::tls_rustls::RustlsConfig;
        let rustls_config = RustlsConfig::from_pem_file(cert, key).await?;
        tracing::info!("sfm-web listening on https://{}", bind_addr);
        axum_server::bind_rustls(bind_addr, rustls_config)
            .serve(app.into_make_service_with_connect_info::<std::net::SocketAddr>())
            .await?;
    } else {
        let listener = tokio::net::TcpListener::bind(bind_addr).await?;
        tracing::info!("sfm-web listening on http://{}", bind_addr);
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
        )
        .await?;
    }

    Ok(())
}

fn build_app(state: AppState) -> anyhow::Result<Router> {
    // CORS: same-origin only (no cross-origin requests allowed)
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    let base_router = Router::new()
        .merge(api::auth_router(state.config.rate_limit.login_requests_per_minute)?)
        .merge(api::protected_router())
        .merge(ws::router())
        .route("/static/{*path}", get(static_files::static_handler))
        .layer(RequestBodyLimitLayer::new(DEFAULT_BODY_LIMIT))
        .merge(api::upload_router(state.config.max_upload_bytes()));

    let router = if state.config.tls_enabled() {
        base_router.layer(from_fn(middleware::security_headers::security_headers_with_hsts))
    } else {
        base_router.layer(from_fn(middleware::security_headers::security_headers))
    };

    Ok(router
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}
