// tests/http_api_test.rs
// End-to-end handler tests: real router, in-memory SQLite, keyword classifier.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use sqlx::sqlite::SqlitePoolOptions;
use tower::ServiceExt;
use uuid::Uuid;

use empath::api::http_router;
use empath::emotion::EmotionClassifier;
use empath::speech::{Transcriber, TranscriberSettings};
use empath::state::AppState;
use empath::storage::{EmotionLog, EmotionStore, SqliteEmotionStore};

async fn setup_app() -> (Router, Arc<SqliteEmotionStore>, String) {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory SQLite pool.");

    let store = Arc::new(SqliteEmotionStore::new(pool));
    store.run_migrations().await.unwrap();

    // Keyword classifier: no model weights needed in tests.
    let classifier = Arc::new(EmotionClassifier::keyword(300));

    // Never exercised by these tests; paths are intentionally bogus.
    let transcriber = Arc::new(
        Transcriber::new(TranscriberSettings {
            api_key: None,
            api_base: "https://api.openai.com/v1".to_string(),
            remote_model: "whisper-1".to_string(),
            remote_timeout: Duration::from_secs(5),
            local_model_path: PathBuf::from("/nonexistent/model.bin"),
            language: None,
            ffmpeg_path: "/nonexistent/ffmpeg".to_string(),
            convert_timeout: Duration::from_secs(5),
        })
        .unwrap(),
    );

    let state = Arc::new(AppState::new(store.clone(), classifier, transcriber));
    let app = http_router(state);
    let user_id = format!("test_user_{}", Uuid::new_v4());

    (app, store, user_id)
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn health_reports_ok() {
    let (app, _store, _user) = setup_app().await;

    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn predict_text_rejects_empty_text() {
    let (app, _store, user) = setup_app().await;

    let response = app
        .oneshot(post_json(
            "/predict-text",
            json!({"user_id": user, "text": "   "}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn predict_text_classifies_and_logs() {
    let (app, store, user) = setup_app().await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/predict-text",
            json!({"user_id": user, "text": "I feel happy and glad today"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["emotion"], "joy");
    assert!(body["confidence"].as_f64().unwrap() > 0.0);
    assert!(body.get("scores").is_none());

    // The interaction was logged.
    let logs = store.recent_logs(&user, 10).await.unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].detected_emotion, "joy");
}

#[tokio::test]
async fn predict_text_all_scores_returns_distribution_and_top_two() {
    let (app, _store, user) = setup_app().await;

    let response = app
        .oneshot(post_json(
            "/predict-text?all_scores=true",
            json!({"user_id": user, "text": "happy but also scared and nervous"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    let scores = body["scores"].as_object().unwrap();
    let sum: f64 = scores.values().map(|v| v.as_f64().unwrap()).sum();
    assert!((sum - 1.0).abs() < 1e-4);

    let top = body["top"].as_array().unwrap();
    assert!(top.len() <= 2);
    // The argmax of the distribution is the returned emotion.
    let best = scores
        .iter()
        .max_by(|a, b| a.1.as_f64().unwrap().partial_cmp(&b.1.as_f64().unwrap()).unwrap())
        .unwrap();
    assert_eq!(body["emotion"], *best.0);
}

#[tokio::test]
async fn predict_speech_requires_audio() {
    let (app, _store, _user) = setup_app().await;

    let boundary = "XTESTBOUNDARYX";
    let empty_upload = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"audio\"; filename=\"clip.wav\"\r\n\
         Content-Type: audio/wav\r\n\r\n\
         \r\n\
         --{boundary}--\r\n"
    );

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/predict-speech")
                .header(
                    "content-type",
                    format!("multipart/form-data; boundary={boundary}"),
                )
                .body(Body::from(empty_upload))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // No audio field at all.
    let no_field = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"user_id\"\r\n\r\n\
         u1\r\n\
         --{boundary}--\r\n"
    );
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/predict-speech")
                .header(
                    "content-type",
                    format!("multipart/form-data; boundary={boundary}"),
                )
                .body(Body::from(no_field))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn respond_requires_user_id() {
    let (app, _store, _user) = setup_app().await;

    let response = app
        .oneshot(post_json("/respond", json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn respond_with_no_history() {
    let (app, _store, user) = setup_app().await;

    let response = app
        .oneshot(post_json(&format!("/respond?user_id={user}"), json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["reason"], "no-history");
}

#[tokio::test]
async fn respond_to_sustained_negativity_writes_mood_alert() {
    let (app, store, user) = setup_app().await;

    for _ in 0..25 {
        let log = EmotionLog::text(Some(user.clone()), "awful".into(), "anger", 0.9, None);
        store.insert_log(&log).await.unwrap();
    }
    for _ in 0..5 {
        let log = EmotionLog::text(Some(user.clone()), "nice".into(), "joy", 0.9, None);
        store.insert_log(&log).await.unwrap();
    }

    let response = app
        .oneshot(post_json(&format!("/respond?user_id={user}"), json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["reason"], "mostly-negative-history");
    let neg_pct = body["stats"]["neg_pct"].as_f64().unwrap();
    assert!((neg_pct - 25.0 / 30.0).abs() < 1e-3);

    // negative_pct >= 0.8, so the alert memory exists.
    let memories = store.recent_memories(&user, 10).await.unwrap();
    assert_eq!(memories.len(), 1);
    assert_eq!(memories[0].memory_type, "mood_alert");
}

#[tokio::test]
async fn user_profile_round_trip() {
    let (app, _store, user) = setup_app().await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/users",
            json!({"user_id": user, "name": "Ada", "preferences": ["short replies"]}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(get(&format!("/users/{user}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["name"], "Ada");

    let response = app
        .oneshot(get("/users/nobody-here"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn memory_create_and_list() {
    let (app, _store, user) = setup_app().await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/memory",
            json!({
                "user_id": user,
                "memory_type": "preference",
                "memory_content": "prefers evening check-ins",
                "importance": "high"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["ok"], true);

    let response = app
        .oneshot(get(&format!("/memory?user_id={user}&limit=5")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let items = body.as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["memory_type"], "preference");
    assert_eq!(items[0]["importance"], "high");
}

#[tokio::test]
async fn history_pagination_and_since_filter() {
    let (app, store, user) = setup_app().await;

    for i in 0..5 {
        let mut log = EmotionLog::text(
            Some(user.clone()),
            format!("message {i}"),
            "joy",
            0.8,
            None,
        );
        log.timestamp = chrono::Utc::now() - chrono::Duration::minutes(5 - i);
        store.insert_log(&log).await.unwrap();
    }

    let response = app
        .clone()
        .oneshot(get(&format!("/history?user_id={user}&page=2&page_size=2")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["page"], 2);
    assert_eq!(body["page_size"], 2);
    assert_eq!(body["items"].as_array().unwrap().len(), 2);

    // Unparseable `since` disables the filter instead of erroring.
    let response = app
        .oneshot(get(&format!(
            "/history?user_id={user}&since=not-a-timestamp"
        )))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["items"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn insights_summary_counts_and_mix() {
    let (app, store, user) = setup_app().await;

    let labels = ["joy", "joy", "joy", "anger", "anger", "neutral"];
    for label in labels {
        let log = EmotionLog::text(Some(user.clone()), "m".into(), label, 0.9, None);
        store.insert_log(&log).await.unwrap();
    }

    let response = app
        .oneshot(get(&format!(
            "/insights/summary?user_id={user}&window_days=7"
        )))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["total"], 6);
    assert_eq!(body["top_emotion"], "joy");
    assert_eq!(body["counts"]["joy"], 3);
    assert_eq!(body["window_days"], 7);
    assert!((body["mix"]["positive"].as_f64().unwrap() - 0.5).abs() < 1e-4);
    assert!((body["mix"]["negative"].as_f64().unwrap() - 2.0 / 6.0).abs() < 1e-4);
}
