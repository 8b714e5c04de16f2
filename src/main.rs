// src/main.rs

use std::path::PathBuf;
use std::sync::Arc;

use sqlx::sqlite::SqlitePoolOptions;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use empath::api::http_router;
use empath::config::CONFIG;
use empath::emotion::EmotionClassifier;
use empath::speech::Transcriber;
use empath::state::AppState;
use empath::storage::{EmotionStore, SqliteEmotionStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    let level = CONFIG.log_level.parse::<Level>().unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting Empath backend");
    info!(
        "Classifier: {}",
        if CONFIG.emotion_dev_mode {
            "keyword lexicon (dev mode)"
        } else {
            "onnx model (lazy-loaded)"
        }
    );
    info!(
        "Remote transcription: {}",
        if CONFIG.speech_api_key.is_some() { "enabled" } else { "disabled (local only)" }
    );

    // Create database pool and schema
    let pool = SqlitePoolOptions::new()
        .max_connections(CONFIG.sqlite_max_connections)
        .connect(&CONFIG.database_url)
        .await?;

    let sqlite_store = Arc::new(SqliteEmotionStore::new(pool));
    sqlite_store.run_migrations().await?;

    // Index creation is advisory; a failure is logged and never fatal.
    if let Err(e) = sqlite_store.ensure_indexes().await {
        warn!(error = %e, "failed to create query indexes");
    }
    let store: Arc<dyn EmotionStore> = sqlite_store;

    let classifier = if CONFIG.emotion_dev_mode {
        Arc::new(EmotionClassifier::keyword(CONFIG.chunk_max_len))
    } else {
        Arc::new(EmotionClassifier::onnx(
            PathBuf::from(&CONFIG.emotion_model_dir),
            CONFIG.chunk_max_len,
        ))
    };

    let transcriber = Arc::new(Transcriber::new(CONFIG.transcriber_settings())?);

    let app_state = Arc::new(AppState::new(store, classifier, transcriber));
    let app = http_router(app_state);

    // Start server
    let bind_address = CONFIG.bind_address();
    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    info!("HTTP server listening on http://{}", bind_address);

    if let Err(e) = axum::serve(listener, app).await {
        error!("Server error: {}", e);
    }

    Ok(())
}
