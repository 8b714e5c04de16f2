// src/api/types.rs
// Request/response DTOs for the HTTP surface.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::history::{PolarityMix, ReasonCode};
use crate::storage::{EmotionLog, Importance};

// ── Prediction ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct TextRequest {
    pub user_id: Option<String>,
    pub text: String,
    pub client_time: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AllScoresQuery {
    #[serde(default)]
    pub all_scores: bool,
}

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub emotion: String,
    pub confidence: f32,
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scores: Option<BTreeMap<String, f32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top: Option<Vec<(String, f32)>>,
}

#[derive(Debug, Serialize)]
pub struct SpeechDiagnostics {
    pub file: String,
    pub content_type: String,
    pub duration: Option<f64>,
    pub used_fallback: bool,
}

#[derive(Debug, Serialize)]
pub struct SpeechPredictResponse {
    pub emotion: String,
    pub confidence: f32,
    pub transcript: String,
    pub duration: Option<f64>,
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scores: Option<BTreeMap<String, f32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top: Option<Vec<(String, f32)>>,
    #[serde(rename = "_diag")]
    pub diag: SpeechDiagnostics,
}

// ── Adaptive reply ──────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct RespondQuery {
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RespondStats {
    pub counts: PolarityMix,
    pub total: f32,
    pub pos_pct: f32,
    pub neg_pct: f32,
}

#[derive(Debug, Serialize)]
pub struct RespondResponse {
    pub response: String,
    pub reason: ReasonCode,
    pub stats: RespondStats,
}

// ── History ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub user_id: String,
    /// Deprecated; kept for compatibility. Use page_size.
    pub limit: Option<usize>,
    pub since: Option<String>,
    pub page: Option<usize>,
    pub page_size: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct HistoryItem {
    pub user_id: Option<String>,
    pub message: String,
    pub detected_emotion: String,
    pub confidence: f32,
    pub timestamp: DateTime<Utc>,
    pub client_time: Option<String>,
}

impl From<EmotionLog> for HistoryItem {
    fn from(log: EmotionLog) -> Self {
        Self {
            user_id: log.user_id,
            message: log.message,
            detected_emotion: log.detected_emotion,
            confidence: log.confidence,
            timestamp: log.timestamp,
            client_time: log.client_time,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub page: usize,
    pub page_size: usize,
    pub items: Vec<HistoryItem>,
}

// ── Insights ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct InsightsQuery {
    pub user_id: String,
    pub window_days: Option<i64>,
}

// ── Users & memory ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct UserIn {
    pub user_id: String,
    pub name: Option<String>,
    pub interaction_style: Option<String>,
    #[serde(default)]
    pub preferences: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct UserOk {
    pub ok: bool,
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
pub struct MemoryIn {
    pub user_id: String,
    pub memory_type: String,
    pub memory_content: String,
    pub importance: Option<Importance>,
}

#[derive(Debug, Serialize)]
pub struct MemoryOk {
    pub ok: bool,
    pub mem_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct MemoryQuery {
    pub user_id: String,
    pub limit: Option<usize>,
}
