// src/storage/traits.rs

//! Store trait for the interaction-history backend (SQLite today).
//! All persistence goes through this trait; no direct DB calls in business logic.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::storage::types::{EmotionLog, UserMemory, UserProfile};

/// Document-store surface consumed by the emotion pipeline: append-only
/// inserts, newest-first queries with skip/limit, whole-document upserts, and
/// advisory index creation.
#[async_trait]
pub trait EmotionStore: Send + Sync {
    /// Append a classified interaction. Best-effort at call sites: callers
    /// may deliberately discard the error.
    async fn insert_log(&self, log: &EmotionLog) -> anyhow::Result<i64>;

    /// Most recent `n` logs for a user, newest first.
    async fn recent_logs(&self, user_id: &str, n: usize) -> anyhow::Result<Vec<EmotionLog>>;

    /// Newest-first page of logs, optionally bounded below by `since`.
    async fn logs_paginated(
        &self,
        user_id: &str,
        since: Option<DateTime<Utc>>,
        skip: usize,
        limit: usize,
    ) -> anyhow::Result<Vec<EmotionLog>>;

    /// Logs newer than `cutoff`, newest first, capped at `cap` rows.
    async fn logs_since(
        &self,
        user_id: &str,
        cutoff: DateTime<Utc>,
        cap: usize,
    ) -> anyhow::Result<Vec<EmotionLog>>;

    /// Append a user memory record.
    async fn insert_memory(&self, memory: &UserMemory) -> anyhow::Result<i64>;

    /// Most recent memory records for a user, newest first.
    async fn recent_memories(&self, user_id: &str, limit: usize)
        -> anyhow::Result<Vec<UserMemory>>;

    /// Replace-one-upsert of a user profile.
    async fn upsert_user(&self, profile: &UserProfile) -> anyhow::Result<()>;

    async fn get_user(&self, user_id: &str) -> anyhow::Result<Option<UserProfile>>;

    /// Connectivity probe for the health endpoint.
    async fn ping(&self) -> bool;

    /// Create query indexes. Advisory: failures are logged by callers and
    /// never fatal.
    async fn ensure_indexes(&self) -> anyhow::Result<()>;
}
