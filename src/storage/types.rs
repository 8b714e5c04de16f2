// src/storage/types.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How a classified message entered the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    Text,
    Speech,
}

impl InputType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InputType::Text => "text",
            InputType::Speech => "speech",
        }
    }

    pub fn from_db(s: &str) -> Self {
        match s {
            "speech" => InputType::Speech,
            _ => InputType::Text,
        }
    }
}

/// Upload details attached to speech-derived logs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AudioMetadata {
    pub filename: Option<String>,
    pub duration: Option<f64>,
    pub content_type: Option<String>,
}

/// One classified interaction. Append-only: rows are inserted on successful
/// classification and only ever queried afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmotionLog {
    pub id: Option<i64>,
    pub user_id: Option<String>,
    pub message: String,
    pub detected_emotion: String,
    pub confidence: f32,
    pub timestamp: DateTime<Utc>,
    pub client_time: Option<String>,
    pub input_type: InputType,
    pub metadata: Option<AudioMetadata>,
}

impl EmotionLog {
    /// Build a log record for a classified text message. Confidence is clamped
    /// into [0, 1] and an empty label falls back to "neutral" before anything
    /// reaches storage.
    pub fn text(
        user_id: Option<String>,
        message: String,
        detected_emotion: &str,
        confidence: f32,
        client_time: Option<String>,
    ) -> Self {
        Self {
            id: None,
            user_id,
            message,
            detected_emotion: normalize_label(detected_emotion),
            confidence: confidence.clamp(0.0, 1.0),
            timestamp: Utc::now(),
            client_time,
            input_type: InputType::Text,
            metadata: None,
        }
    }

    pub fn speech(
        user_id: Option<String>,
        transcript: String,
        detected_emotion: &str,
        confidence: f32,
        client_time: Option<String>,
        metadata: AudioMetadata,
    ) -> Self {
        let mut log = Self::text(user_id, transcript, detected_emotion, confidence, client_time);
        log.input_type = InputType::Speech;
        log.metadata = Some(metadata);
        log
    }
}

fn normalize_label(label: &str) -> String {
    let trimmed = label.trim();
    if trimmed.is_empty() {
        "neutral".to_string()
    } else {
        trimmed.to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Importance {
    Normal,
    High,
}

impl Importance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Importance::Normal => "normal",
            Importance::High => "high",
        }
    }

    pub fn from_db(s: &str) -> Self {
        match s {
            "high" => Importance::High,
            _ => Importance::Normal,
        }
    }
}

/// A remembered fact about a user. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserMemory {
    pub id: Option<i64>,
    pub user_id: String,
    pub memory_type: String,
    pub memory_content: String,
    pub importance: Importance,
    pub created_at: DateTime<Utc>,
}

impl UserMemory {
    pub fn new(
        user_id: String,
        memory_type: String,
        memory_content: String,
        importance: Importance,
    ) -> Self {
        Self {
            id: None,
            user_id,
            memory_type,
            memory_content,
            importance,
            created_at: Utc::now(),
        }
    }

    /// The record appended automatically when sustained negative affect is
    /// detected over a user's recent history.
    pub fn mood_alert(user_id: &str) -> Self {
        Self::new(
            user_id.to_string(),
            "mood_alert".to_string(),
            "User shows sustained negative emotions".to_string(),
            Importance::High,
        )
    }
}

/// Per-user profile, upserted whole.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: String,
    pub name: Option<String>,
    pub interaction_style: Option<String>,
    #[serde(default)]
    pub preferences: Vec<String>,
}
