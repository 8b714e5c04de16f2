// src/api/http/users.rs
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;

use crate::api::error::{ApiError, ApiResult, IntoApiError};
use crate::api::types::{UserIn, UserOk};
use crate::state::AppState;
use crate::storage::UserProfile;

/// POST /users
///
/// Create or update a user profile (whole-document upsert).
pub async fn create_user(
    State(app): State<Arc<AppState>>,
    Json(payload): Json<UserIn>,
) -> ApiResult<Json<UserOk>> {
    let profile = UserProfile {
        user_id: payload.user_id.clone(),
        name: payload.name,
        interaction_style: payload.interaction_style,
        preferences: payload.preferences,
    };

    app.store
        .upsert_user(&profile)
        .await
        .into_api_error("Failed to upsert user")?;

    Ok(Json(UserOk {
        ok: true,
        user_id: payload.user_id,
    }))
}

/// GET /users/{user_id}
pub async fn get_user_handler(
    State(app): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<UserProfile>> {
    let profile = app
        .store
        .get_user(&user_id)
        .await
        .into_api_error("Failed to load user")?
        .ok_or_else(|| ApiError::not_found("user not found"))?;

    Ok(Json(profile))
}
