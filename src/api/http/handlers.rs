// src/api/http/handlers.rs
use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
///
/// Storage connectivity probe.
pub async fn health_handler(State(app): State<Arc<AppState>>) -> Json<Value> {
    let ok = app.store.ping().await;
    Json(json!({
        "status": if ok { "ok" } else { "db-unreachable" }
    }))
}
