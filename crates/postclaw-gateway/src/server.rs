//! HTTP server implementation using Axum.

use std::sync::Arc;

use axum::{Router, routing::get};
use postclaw_bot::SessionStore;
use postclaw_core::config::GatewayConfig;
use postclaw_scheduler::{ItemStore, Shutdown};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared state for the gateway server. Read-only views of the live stores.
#[derive(Clone)]
pub struct AppState {
    pub items: Arc<ItemStore>,
    pub sessions: Arc<SessionStore>,
    pub start_time: std::time::Instant,
}

impl AppState {
    pub fn new(items: Arc<ItemStore>, sessions: Arc<SessionStore>) -> Self {
        Self {
            items,
            sessions,
            start_time: std::time::Instant::now(),
        }
    }
}

/// Build the Axum router with all routes.
pub fn build_router(state: AppState) -> Router {
    let shared = Arc::new(state);

    Router::new()
        .route("/", get(super::routes::status_page))
        .route("/health", get(super::routes::health_check))
        .route("/api/v1/stats", get(super::routes::stats))
        .layer(
            CorsLayer::new()
                .allow_methods([axum::http::Method::GET, axum::http::Method::OPTIONS])
                .allow_headers(Any)
                .allow_origin(Any)
                .max_age(std::time::Duration::from_secs(3600)),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(shared)
}

/// Start the HTTP server; returns once `shutdown` fires.
pub async fn start(
    config: &GatewayConfig,
    state: AppState,
    shutdown: Shutdown,
) -> anyhow::Result<()> {
    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("🌐 Status server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;
    tracing::info!("🌐 Status server stopped");
    Ok(())
}
