//! Status route handlers.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::response::Html;
use postclaw_scheduler::{StoreStats, local_now};

use crate::server::AppState;

type AppStateRef = State<Arc<AppState>>;

/// Landing page with the live counts.
pub async fn status_page(State(state): AppStateRef) -> Html<String> {
    let stats = state.items.stats().await;
    let sessions = state.sessions.len().await;
    Html(render_status_page(&stats, sessions))
}

/// Health check endpoint.
pub async fn health_check(State(state): AppStateRef) -> Json<serde_json::Value> {
    let stats = state.items.stats().await;
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": local_now().format("%Y-%m-%dT%H:%M:%S").to_string(),
        "uptime_secs": state.start_time.elapsed().as_secs(),
        "stats": stats,
    }))
}

/// Counts as JSON.
pub async fn stats(State(state): AppStateRef) -> Json<serde_json::Value> {
    let stats = state.items.stats().await;
    let sessions = state.sessions.len().await;
    Json(serde_json::json!({
        "version": env!("CARGO_PKG_VERSION"),
        "active_sessions": sessions,
        "posts": stats,
    }))
}

fn render_status_page(stats: &StoreStats, sessions: usize) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>PostClaw</title></head>
<body style="font-family: sans-serif; max-width: 40em; margin: 2em auto;">
<h1>🤖 PostClaw is running</h1>
<h2>📊 Statistics</h2>
<ul>
<li>Total posts: {total}</li>
<li>Active sessions: {sessions}</li>
<li>📸 Photos: {images}</li>
<li>🎥 Videos: {videos}</li>
</ul>
<h2>📋 Status</h2>
<ul>
<li>⏳ Pending: {pending}</li>
<li>🔄 Processing: {processing}</li>
<li>✅ Completed: {completed}</li>
<li>❌ Failed: {failed}</li>
</ul>
</body>
</html>"#,
        total = stats.total,
        images = stats.images,
        videos = stats.videos,
        pending = stats.pending,
        processing = stats.processing,
        completed = stats.completed,
        failed = stats.failed,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use postclaw_bot::SessionStore;
    use postclaw_core::{MediaKind, UserId};
    use postclaw_scheduler::{ItemStore, NewItem};
    use tower::ServiceExt;

    async fn test_state() -> AppState {
        let items = Arc::new(ItemStore::new());
        let now = local_now();
        for kind in [MediaKind::Image, MediaKind::Video, MediaKind::Image] {
            items
                .insert(
                    NewItem {
                        owner: UserId(1),
                        media_url: "https://cdn.example/x".into(),
                        media_kind: kind,
                        caption: "c".into(),
                        scheduled_at: now,
                    },
                    now,
                )
                .await;
        }
        let sessions = Arc::new(SessionStore::new());
        sessions.reset(UserId(1)).await;
        AppState::new(items, sessions)
    }

    #[tokio::test]
    async fn test_health_check() {
        let result = health_check(State(Arc::new(test_state().await))).await;
        let json = result.0;
        assert_eq!(json["status"], "healthy");
        assert!(json["timestamp"].is_string());
        assert_eq!(json["stats"]["total"], 3);
        assert_eq!(json["stats"]["pending"], 3);
    }

    #[tokio::test]
    async fn test_stats() {
        let result = stats(State(Arc::new(test_state().await))).await;
        let json = result.0;
        assert_eq!(json["active_sessions"], 1);
        assert_eq!(json["posts"]["images"], 2);
        assert_eq!(json["posts"]["videos"], 1);
        assert_eq!(json["posts"]["failed"], 0);
    }

    #[tokio::test]
    async fn test_status_page_lists_counts() {
        let page = status_page(State(Arc::new(test_state().await))).await.0;
        assert!(page.contains("Total posts: 3"));
        assert!(page.contains("Videos: 1"));
        assert!(page.contains("Pending: 3"));
    }

    #[tokio::test]
    async fn test_router_serves_routes() {
        let app = crate::server::build_router(test_state().await);

        let response = app
            .clone()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "healthy");

        let response = app
            .oneshot(Request::builder().uri("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
