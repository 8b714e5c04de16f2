// src/api/http/memory.rs
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use tracing::info;

use crate::api::error::{ApiResult, IntoApiError};
use crate::api::types::{MemoryIn, MemoryOk, MemoryQuery};
use crate::config::CONFIG;
use crate::state::AppState;
use crate::storage::{Importance, UserMemory};

/// POST /memory
///
/// Explicit memory append. Unlike the automatic mood-alert path this is a
/// primary operation, so storage failures surface to the caller.
pub async fn create_memory(
    State(app): State<Arc<AppState>>,
    Json(payload): Json<MemoryIn>,
) -> ApiResult<Json<MemoryOk>> {
    let memory = UserMemory::new(
        payload.user_id,
        payload.memory_type,
        payload.memory_content,
        payload.importance.unwrap_or(Importance::Normal),
    );

    let mem_id = app
        .store
        .insert_memory(&memory)
        .await
        .into_api_error("Failed to store memory")?;

    info!(%mem_id, user_id = %memory.user_id, "memory recorded");
    Ok(Json(MemoryOk { ok: true, mem_id }))
}

/// GET /memory?user_id=&limit=
pub async fn list_memory(
    State(app): State<Arc<AppState>>,
    Query(query): Query<MemoryQuery>,
) -> ApiResult<Json<Vec<UserMemory>>> {
    let limit = query.limit.unwrap_or(CONFIG.memory_default_limit);

    let memories = app
        .store
        .recent_memories(&query.user_id, limit)
        .await
        .into_api_error("Failed to load memories")?;

    Ok(Json(memories))
}
