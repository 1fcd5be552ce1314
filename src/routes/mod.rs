// ABOUTME: API router assembly: REST routes, static uploads, CORS, tracing
// ABOUTME: Route handlers call exactly one repository operation each

use axum::{Json, Router, extract::DefaultBodyLimit, routing::get};
use serde::Deserialize;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::AppState;

pub mod maintenance;
pub mod manuals;
pub mod vehicles;
pub mod videos;

// local video cap plus multipart overhead
const MAX_BODY_BYTES: usize = 520 * 1024 * 1024;

#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    pub limit: Option<i64>,
}

impl RecentQuery {
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(5)
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

pub fn api_router(state: AppState) -> Router {
    let uploads = ServeDir::new(state.upload_dir.clone());

    Router::new()
        .nest("/api/vehicles", vehicles::router())
        .nest("/api/maintenance", maintenance::router())
        .nest("/api/manuals", manuals::router())
        .nest("/api/videos", videos::router())
        .route("/api/health", get(health))
        .nest_service("/uploads", uploads)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
