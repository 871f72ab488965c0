use axum::{
    body::Body,
    http::{Request, StatusCode},
    routing::{delete, get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::context::make_request_span;
use crate::state::AppState;

pub mod recommendations;
pub mod watch;

/// Creates the application router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes())
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| make_request_span(request)))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// API routes under /api/v1
fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/watch/:content_id/progress", post(watch::record_progress))
        .route("/watch/history", get(watch::history))
        .route("/watch/continue", get(watch::continue_watching))
        .route("/watch/stats", get(watch::stats))
        .route("/watch/:content_id", delete(watch::delete_record))
        .route("/recommendations", get(recommendations::recommend))
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
