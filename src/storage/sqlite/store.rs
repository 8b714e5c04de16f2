//! Implements EmotionStore for SQLite.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use crate::storage::traits::EmotionStore;
use crate::storage::types::{
    AudioMetadata, EmotionLog, Importance, InputType, UserMemory, UserProfile,
};

pub struct SqliteEmotionStore {
    pub pool: SqlitePool,
}

impl SqliteEmotionStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create tables if they don't exist. Idempotent.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS emotion_logs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT,
                message TEXT NOT NULL,
                detected_emotion TEXT NOT NULL,
                confidence REAL NOT NULL,
                timestamp TEXT NOT NULL,
                client_time TEXT,
                input_type TEXT NOT NULL DEFAULT 'text',
                metadata TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS user_memory (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL,
                memory_type TEXT NOT NULL,
                memory_content TEXT NOT NULL,
                importance TEXT NOT NULL DEFAULT 'normal',
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                user_id TEXT PRIMARY KEY,
                name TEXT,
                interaction_style TEXT,
                preferences TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    fn row_to_log(row: &SqliteRow) -> EmotionLog {
        let timestamp: NaiveDateTime = row.get("timestamp");
        let metadata: Option<String> = row.get("metadata");
        let input_type: String = row.get("input_type");
        let confidence: f64 = row.get("confidence");

        EmotionLog {
            id: Some(row.get("id")),
            user_id: row.get("user_id"),
            message: row.get("message"),
            detected_emotion: row.get("detected_emotion"),
            confidence: confidence as f32,
            timestamp: Utc.from_utc_datetime(&timestamp),
            client_time: row.get("client_time"),
            input_type: InputType::from_db(&input_type),
            metadata: metadata.and_then(|m| serde_json::from_str::<AudioMetadata>(&m).ok()),
        }
    }

    fn row_to_memory(row: &SqliteRow) -> UserMemory {
        let created_at: NaiveDateTime = row.get("created_at");
        let importance: String = row.get("importance");

        UserMemory {
            id: Some(row.get("id")),
            user_id: row.get("user_id"),
            memory_type: row.get("memory_type"),
            memory_content: row.get("memory_content"),
            importance: Importance::from_db(&importance),
            created_at: Utc.from_utc_datetime(&created_at),
        }
    }
}

#[async_trait]
impl EmotionStore for SqliteEmotionStore {
    async fn insert_log(&self, log: &EmotionLog) -> Result<i64> {
        let metadata_json = log
            .metadata
            .as_ref()
            .map(|m| serde_json::to_string(m).unwrap_or_else(|_| "{}".to_string()));

        let row = sqlx::query(
            r#"
            INSERT INTO emotion_logs (
                user_id, message, detected_emotion, confidence,
                timestamp, client_time, input_type, metadata
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(&log.user_id)
        .bind(&log.message)
        .bind(&log.detected_emotion)
        .bind(log.confidence as f64)
        .bind(log.timestamp.naive_utc())
        .bind(&log.client_time)
        .bind(log.input_type.as_str())
        .bind(metadata_json)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.get("id"))
    }

    async fn recent_logs(&self, user_id: &str, n: usize) -> Result<Vec<EmotionLog>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, message, detected_emotion, confidence,
                   timestamp, client_time, input_type, metadata
            FROM emotion_logs
            WHERE user_id = ?
            ORDER BY timestamp DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(user_id)
        .bind(n as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(Self::row_to_log).collect())
    }

    async fn logs_paginated(
        &self,
        user_id: &str,
        since: Option<DateTime<Utc>>,
        skip: usize,
        limit: usize,
    ) -> Result<Vec<EmotionLog>> {
        let rows = match since {
            Some(cutoff) => {
                sqlx::query(
                    r#"
                    SELECT id, user_id, message, detected_emotion, confidence,
                           timestamp, client_time, input_type, metadata
                    FROM emotion_logs
                    WHERE user_id = ? AND timestamp >= ?
                    ORDER BY timestamp DESC, id DESC
                    LIMIT ? OFFSET ?
                    "#,
                )
                .bind(user_id)
                .bind(cutoff.naive_utc())
                .bind(limit as i64)
                .bind(skip as i64)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query(
                    r#"
                    SELECT id, user_id, message, detected_emotion, confidence,
                           timestamp, client_time, input_type, metadata
                    FROM emotion_logs
                    WHERE user_id = ?
                    ORDER BY timestamp DESC, id DESC
                    LIMIT ? OFFSET ?
                    "#,
                )
                .bind(user_id)
                .bind(limit as i64)
                .bind(skip as i64)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(rows.iter().map(Self::row_to_log).collect())
    }

    async fn logs_since(
        &self,
        user_id: &str,
        cutoff: DateTime<Utc>,
        cap: usize,
    ) -> Result<Vec<EmotionLog>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, message, detected_emotion, confidence,
                   timestamp, client_time, input_type, metadata
            FROM emotion_logs
            WHERE user_id = ? AND timestamp >= ?
            ORDER BY timestamp DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(user_id)
        .bind(cutoff.naive_utc())
        .bind(cap as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(Self::row_to_log).collect())
    }

    async fn insert_memory(&self, memory: &UserMemory) -> Result<i64> {
        let row = sqlx::query(
            r#"
            INSERT INTO user_memory (user_id, memory_type, memory_content, importance, created_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(&memory.user_id)
        .bind(&memory.memory_type)
        .bind(&memory.memory_content)
        .bind(memory.importance.as_str())
        .bind(memory.created_at.naive_utc())
        .fetch_one(&self.pool)
        .await?;

        Ok(row.get("id"))
    }

    async fn recent_memories(&self, user_id: &str, limit: usize) -> Result<Vec<UserMemory>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, memory_type, memory_content, importance, created_at
            FROM user_memory
            WHERE user_id = ?
            ORDER BY created_at DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(user_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(Self::row_to_memory).collect())
    }

    async fn upsert_user(&self, profile: &UserProfile) -> Result<()> {
        let preferences_json =
            serde_json::to_string(&profile.preferences).unwrap_or_else(|_| "[]".to_string());

        sqlx::query(
            r#"
            INSERT INTO users (user_id, name, interaction_style, preferences)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(user_id) DO UPDATE SET
                name = excluded.name,
                interaction_style = excluded.interaction_style,
                preferences = excluded.preferences
            "#,
        )
        .bind(&profile.user_id)
        .bind(&profile.name)
        .bind(&profile.interaction_style)
        .bind(preferences_json)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_user(&self, user_id: &str) -> Result<Option<UserProfile>> {
        let row = sqlx::query(
            r#"
            SELECT user_id, name, interaction_style, preferences
            FROM users
            WHERE user_id = ?
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| {
            let preferences: Option<String> = row.get("preferences");
            UserProfile {
                user_id: row.get("user_id"),
                name: row.get("name"),
                interaction_style: row.get("interaction_style"),
                preferences: preferences
                    .and_then(|p| serde_json::from_str(&p).ok())
                    .unwrap_or_default(),
            }
        }))
    }

    async fn ping(&self) -> bool {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await.is_ok()
    }

    async fn ensure_indexes(&self) -> Result<()> {
        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_emotion_logs_user_time
             ON emotion_logs (user_id, timestamp DESC)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_user_memory_user_time
             ON user_memory (user_id, created_at DESC)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
