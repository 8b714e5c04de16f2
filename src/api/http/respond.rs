// src/api/http/respond.rs
// Adaptive reply endpoint built on the user's recent emotion history.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use tracing::{info, warn};

use crate::api::error::{ApiError, ApiResult, IntoApiError};
use crate::api::types::{RespondQuery, RespondResponse, RespondStats};
use crate::config::CONFIG;
use crate::history::{aggregate, decide};
use crate::state::AppState;
use crate::storage::UserMemory;

/// POST /respond?user_id=...
pub async fn respond_handler(
    State(app): State<Arc<AppState>>,
    Query(query): Query<RespondQuery>,
) -> ApiResult<Json<RespondResponse>> {
    let user_id = query
        .user_id
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("user_id required"))?;

    let logs = app
        .store
        .recent_logs(&user_id, CONFIG.history_window)
        .await
        .into_api_error("Failed to load emotion history")?;

    let mix = aggregate(&logs);
    let most_recent = logs.first().map(|log| log.detected_emotion.as_str());
    let reply = decide(&mix, most_recent);

    // Sustained negative affect: append a mood-alert memory. Best-effort by
    // policy; a failed write must not fail the reply.
    if reply.mood_alert {
        let memory = UserMemory::mood_alert(&user_id);
        if let Err(e) = app.store.insert_memory(&memory).await {
            warn!(error = %e, user_id = %user_id, "failed to write mood-alert memory");
        } else {
            info!(user_id = %user_id, "mood-alert memory recorded");
        }
    }

    let stats = RespondStats {
        counts: mix,
        total: mix.total(),
        pos_pct: mix.positive_pct(),
        neg_pct: mix.negative_pct(),
    };

    Ok(Json(RespondResponse {
        response: reply.response.to_string(),
        reason: reply.reason,
        stats,
    }))
}
