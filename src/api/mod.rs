use crate::notify::EventNotifier;
use crate::state::AppState;
use axum::Router;
use axum::routing::{get, post};
use std::sync::{Arc, RwLock};

pub mod handlers;
pub mod responses;

/// Shared handles every handler needs.
#[derive(Debug, Clone)]
pub struct ApiContext {
    pub state: Arc<RwLock<AppState>>,
    pub notifier: Option<Arc<dyn EventNotifier>>,
    pub min_confidence: f64,
}

pub fn router(ctx: ApiContext) -> Router {
    Router::new()
        .route("/api/detections", post(handlers::post_detection))
        .route("/api/toll", post(handlers::post_toll))
        .route(
            "/api/status",
            get(handlers::get_status).post(handlers::post_status),
        )
        .route("/api/toll-history", get(handlers::get_history))
        .route("/api/analyze", post(handlers::post_analyze))
        .route("/api/analyze/video", post(handlers::post_analyze_video))
        .with_state(ctx)
}
