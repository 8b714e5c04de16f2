// src/api/http/history.rs
// Paginated history and windowed insight endpoints.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};

use crate::api::error::{ApiResult, IntoApiError};
use crate::api::types::{HistoryItem, HistoryQuery, HistoryResponse, InsightsQuery};
use crate::config::CONFIG;
use crate::history::{summarize, InsightSummary};
use crate::state::AppState;

/// GET /history?user_id=&limit=&since=&page=&page_size=
///
/// Newest-first pages of emotion logs. `limit` is deprecated and only acts as
/// the page_size default. A `since` value that fails to parse as ISO-8601
/// silently disables the filter.
pub async fn history_handler(
    State(app): State<Arc<AppState>>,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Json<HistoryResponse>> {
    let since = query.since.as_deref().and_then(parse_since);

    let page_size = query
        .page_size
        .or(query.limit)
        .unwrap_or(CONFIG.history_default_page_size);
    let page = query.page.unwrap_or(1).max(1);
    let skip = (page - 1) * page_size;

    let logs = app
        .store
        .logs_paginated(&query.user_id, since, skip, page_size)
        .await
        .into_api_error("Failed to load history")?;

    Ok(Json(HistoryResponse {
        page,
        page_size,
        items: logs.into_iter().map(HistoryItem::from).collect(),
    }))
}

/// GET /insights/summary?user_id=&window_days=
pub async fn insights_handler(
    State(app): State<Arc<AppState>>,
    Query(query): Query<InsightsQuery>,
) -> ApiResult<Json<InsightSummary>> {
    let window_days = query
        .window_days
        .unwrap_or(CONFIG.insights_window_days)
        .max(1);
    let cutoff = Utc::now() - Duration::days(window_days);

    let logs = app
        .store
        .logs_since(&query.user_id, cutoff, CONFIG.insights_scan_cap)
        .await
        .into_api_error("Failed to load insight window")?;

    Ok(Json(summarize(&logs, window_days)))
}

/// Parse an ISO-8601 instant. Accepts full RFC 3339, a naive datetime, or a
/// bare date (midnight UTC). Returns None on anything else.
fn parse_since(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = trimmed.parse::<NaiveDateTime>() {
        return Some(Utc.from_utc_datetime(&naive));
    }
    if let Ok(date) = trimmed.parse::<NaiveDate>() {
        return date
            .and_hms_opt(0, 0, 0)
            .map(|naive| Utc.from_utc_datetime(&naive));
    }
    None
}
