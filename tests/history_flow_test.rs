// tests/history_flow_test.rs

use chrono::{Duration, Utc};
use sqlx::sqlite::SqlitePoolOptions;
use uuid::Uuid;

use empath::history::{aggregate, decide, ReasonCode};
use empath::storage::{EmotionLog, EmotionStore, SqliteEmotionStore};

/// Helper function to set up a clean, isolated test environment.
async fn setup_test_store() -> (SqliteEmotionStore, String) {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory SQLite pool.");

    let store = SqliteEmotionStore::new(pool);
    store.run_migrations().await.unwrap();
    store.ensure_indexes().await.unwrap();

    let user_id = format!("test_user_{}", Uuid::new_v4());
    (store, user_id)
}

async fn seed_log(
    store: &SqliteEmotionStore,
    user_id: &str,
    label: &str,
    confidence: f32,
    minutes_ago: i64,
) {
    let mut log = EmotionLog::text(
        Some(user_id.to_string()),
        format!("message about {label}"),
        label,
        confidence,
        None,
    );
    log.timestamp = Utc::now() - Duration::minutes(minutes_ago);
    store.insert_log(&log).await.unwrap();
}

#[tokio::test]
async fn user_with_no_logs_gets_no_history_reason() {
    let (store, user_id) = setup_test_store().await;

    let logs = store.recent_logs(&user_id, 30).await.unwrap();
    let mix = aggregate(&logs);
    let reply = decide(&mix, logs.first().map(|l| l.detected_emotion.as_str()));

    assert_eq!(reply.reason, ReasonCode::NoHistory);
    assert!(!reply.mood_alert);
}

#[tokio::test]
async fn sustained_negative_history_triggers_empathy_and_alert() {
    let (store, user_id) = setup_test_store().await;

    // 25 anger + 5 joy at 0.9 confidence each.
    for i in 0..25 {
        seed_log(&store, &user_id, "anger", 0.9, i).await;
    }
    for i in 25..30 {
        seed_log(&store, &user_id, "joy", 0.9, i).await;
    }

    let logs = store.recent_logs(&user_id, 30).await.unwrap();
    assert_eq!(logs.len(), 30);

    let mix = aggregate(&logs);
    let neg = mix.negative_pct();
    assert!((neg - 25.0 / 30.0).abs() < 1e-4);

    let reply = decide(&mix, logs.first().map(|l| l.detected_emotion.as_str()));
    assert_eq!(reply.reason, ReasonCode::MostlyNegativeHistory);
    // 0.833 clears the 0.8 alert threshold.
    assert!(reply.mood_alert);
}

#[tokio::test]
async fn only_the_most_recent_window_feeds_the_mix() {
    let (store, user_id) = setup_test_store().await;

    // Old negativity, drowned out by 30 newer positive logs.
    for i in 0..10 {
        seed_log(&store, &user_id, "anger", 0.9, 1000 + i).await;
    }
    for i in 0..30 {
        seed_log(&store, &user_id, "joy", 0.9, i).await;
    }

    let logs = store.recent_logs(&user_id, 30).await.unwrap();
    let mix = aggregate(&logs);

    assert_eq!(mix.negative, 0.0);
    let reply = decide(&mix, logs.first().map(|l| l.detected_emotion.as_str()));
    assert_eq!(reply.reason, ReasonCode::MostlyPositiveHistory);
}

#[tokio::test]
async fn low_confidence_logs_still_count_through_the_floor() {
    let (store, user_id) = setup_test_store().await;

    // Near-zero confidence everywhere; the 0.2 floor keeps the polar signal.
    for i in 0..10 {
        seed_log(&store, &user_id, "sadness", 0.01, i).await;
    }

    let logs = store.recent_logs(&user_id, 30).await.unwrap();
    let mix = aggregate(&logs);

    assert!((mix.negative - 10.0 * 0.2).abs() < 1e-4);
    assert!(mix.negative_pct() >= 0.99);
}
