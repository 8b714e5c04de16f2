// src/api/http/router.rs
// HTTP router composition for REST API endpoints

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::{
    handlers::health_handler,
    history::{history_handler, insights_handler},
    memory::{create_memory, list_memory},
    predict::{predict_speech, predict_text},
    respond::respond_handler,
    users::{create_user, get_user_handler},
};
use crate::config::CONFIG;
use crate::state::AppState;

/// Upload cap for /predict-speech bodies.
const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Main HTTP router for prediction, reply, history, and profile endpoints.
pub fn http_router(app_state: Arc<AppState>) -> Router {
    Router::new()
        // Health
        .route("/health", get(health_handler))

        // Emotion pipeline
        .route("/predict-text", post(predict_text))
        .route("/predict-speech", post(predict_speech))
        .route("/respond", post(respond_handler))

        // History & insights
        .route("/history", get(history_handler))
        .route("/insights/summary", get(insights_handler))

        // Users & memory
        .route("/users", post(create_user))
        .route("/users/{user_id}", get(get_user_handler))
        .route("/memory", post(create_memory).get(list_memory))

        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer())
        .with_state(app_state)
}

fn cors_layer() -> CorsLayer {
    if CONFIG.cors_origin == "*" {
        return CorsLayer::permissive();
    }
    match CONFIG.cors_origin.parse::<HeaderValue>() {
        Ok(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_methods(Any)
            .allow_headers(Any),
        Err(_) => CorsLayer::permissive(),
    }
}
