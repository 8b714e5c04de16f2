// src/api/http/predict.rs
// Text and speech prediction endpoints.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Multipart, Query, State};
use axum::Json;
use tracing::{info, warn};

use crate::api::error::{ApiError, ApiResult};
use crate::api::types::{
    AllScoresQuery, PredictResponse, SpeechDiagnostics, SpeechPredictResponse, TextRequest,
};
use crate::emotion::classifier::top_two;
use crate::speech::TranscribeError;
use crate::state::AppState;
use crate::storage::{AudioMetadata, EmotionLog};

/// POST /predict-text
///
/// Classify a text message and log the interaction. With `?all_scores=true`
/// the full distribution plus the top-2 labels are included; if the
/// distribution path fails the handler quietly degrades to single-label
/// classification.
pub async fn predict_text(
    State(app): State<Arc<AppState>>,
    Query(query): Query<AllScoresQuery>,
    Json(req): Json<TextRequest>,
) -> ApiResult<Json<PredictResponse>> {
    if req.text.trim().is_empty() {
        return Err(ApiError::bad_request("text required"));
    }

    let (emotion, confidence, scores) = classify(&app, &req.text, query.all_scores).await?;

    // Log to storage (best-effort; the response must not depend on it).
    let log = EmotionLog::text(
        req.user_id.clone(),
        req.text.clone(),
        &emotion,
        confidence,
        req.client_time.clone(),
    );
    if let Err(e) = app.store.insert_log(&log).await {
        warn!(error = %e, "failed to log text interaction");
    }

    let top = scores.as_ref().map(top_two);
    Ok(Json(PredictResponse {
        emotion,
        confidence,
        user_id: req.user_id,
        scores,
        top,
    }))
}

/// POST /predict-speech
///
/// Accept an uploaded audio file, transcribe it (remote service first, local
/// model fallback), classify the transcript, and log the interaction.
pub async fn predict_speech(
    State(app): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> ApiResult<Json<SpeechPredictResponse>> {
    let mut user_id: Option<String> = None;
    let mut client_time: Option<String> = None;
    let mut audio: Option<Bytes> = None;
    let mut filename = "recording".to_string();
    let mut content_type = String::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("invalid multipart body: {e}")))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "user_id" => {
                user_id = field.text().await.ok().filter(|v| !v.trim().is_empty());
            }
            "client_time" => {
                client_time = field.text().await.ok().filter(|v| !v.trim().is_empty());
            }
            "audio" => {
                if let Some(file_name) = field.file_name() {
                    filename = file_name.to_string();
                }
                content_type = field
                    .content_type()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| {
                        mime_guess::from_path(&filename)
                            .first_or_octet_stream()
                            .to_string()
                    })
                    .to_lowercase();
                audio = Some(
                    field
                        .bytes()
                        .await
                        .map_err(|e| ApiError::bad_request(format!("failed to read upload: {e}")))?,
                );
            }
            _ => {}
        }
    }

    let audio = audio.ok_or_else(|| ApiError::bad_request("audio file required"))?;
    if audio.is_empty() {
        return Err(ApiError::bad_request("empty audio upload"));
    }

    info!(
        file = %filename,
        content_type = %content_type,
        size = audio.len(),
        "received speech upload"
    );

    let outcome = app
        .transcriber
        .transcribe(&audio, &filename)
        .await
        .map_err(|e| match e {
            TranscribeError::EmptyTranscript => ApiError::unprocessable_entity(
                "transcription empty; please try again with clearer audio",
            ),
            other => ApiError::internal(other.to_string()),
        })?;

    let (emotion, confidence, scores) = classify(&app, &outcome.text, true).await?;

    let metadata = AudioMetadata {
        filename: Some(filename.clone()),
        duration: outcome.duration,
        content_type: Some(content_type.clone()),
    };
    let log = EmotionLog::speech(
        user_id.clone(),
        outcome.text.clone(),
        &emotion,
        confidence,
        client_time,
        metadata,
    );
    if let Err(e) = app.store.insert_log(&log).await {
        warn!(error = %e, "failed to log speech interaction");
    } else {
        info!(user_id = ?user_id, emotion = %emotion, confidence, "logged speech interaction");
    }

    let top = scores.as_ref().map(top_two);
    Ok(Json(SpeechPredictResponse {
        emotion,
        confidence,
        transcript: outcome.text,
        duration: outcome.duration,
        user_id,
        scores,
        top,
        diag: SpeechDiagnostics {
            file: filename,
            content_type,
            duration: outcome.duration,
            used_fallback: outcome.used_fallback,
        },
    }))
}

/// Shared classification step. When `with_scores` is set, a failing
/// full-distribution pass degrades to single-label classification (logged,
/// not surfaced); a failing single-label pass is a real error.
async fn classify(
    app: &AppState,
    text: &str,
    with_scores: bool,
) -> ApiResult<(String, f32, Option<std::collections::BTreeMap<String, f32>>)> {
    if with_scores {
        match app.classifier.predict_with_scores(text).await {
            Ok(scored) => return Ok((scored.label, scored.confidence, Some(scored.scores))),
            Err(e) => {
                warn!(error = %e, "distribution classification failed; degrading to single label");
            }
        }
    }

    let prediction = app
        .classifier
        .predict(text)
        .await
        .map_err(|e| ApiError::internal(e.to_string()))?;
    Ok((prediction.label, prediction.confidence, None))
}
