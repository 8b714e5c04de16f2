// src/speech/local.rs
// Local speech-to-text fallback on whisper.cpp (GGML models).

use std::path::Path;
use std::sync::Mutex;

use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

use crate::speech::TranscribeError;

pub struct LocalSpeechModel {
    ctx: WhisperContext,
    language: Option<String>,
    // Inference is serialized per model instance; states are cheap but the
    // underlying context is not documented as safe for concurrent decode.
    run_guard: Mutex<()>,
}

impl LocalSpeechModel {
    pub fn load(model_path: &Path, language: Option<String>) -> Result<Self, TranscribeError> {
        if !model_path.exists() {
            return Err(TranscribeError::ModelUnavailable(format!(
                "model file not found: {}",
                model_path.display()
            )));
        }

        let path_str = model_path.to_str().ok_or_else(|| {
            TranscribeError::ModelUnavailable(format!(
                "invalid model path: {}",
                model_path.display()
            ))
        })?;

        let ctx = WhisperContext::new_with_params(path_str, WhisperContextParameters::default())
            .map_err(|e| TranscribeError::ModelUnavailable(format!("{e:?}")))?;

        tracing::info!(model = %model_path.display(), "local speech model loaded");

        Ok(Self {
            ctx,
            language,
            run_guard: Mutex::new(()),
        })
    }

    /// Transcribe mono 16 kHz PCM samples.
    pub fn transcribe(&self, samples: &[f32]) -> Result<String, TranscribeError> {
        let _serialized = self
            .run_guard
            .lock()
            .map_err(|_| TranscribeError::Local("model guard poisoned".to_string()))?;

        let mut state = self
            .ctx
            .create_state()
            .map_err(|e| TranscribeError::Local(format!("failed to create state: {e:?}")))?;

        let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
        if let Some(lang) = self.language.as_deref() {
            params.set_language(Some(lang));
        }
        let threads = std::thread::available_parallelism()
            .map(|n| n.get().saturating_sub(1).max(1))
            .unwrap_or(4);
        params.set_n_threads(threads as i32);
        params.set_translate(false);
        params.set_print_progress(false);
        params.set_print_special(false);
        params.set_print_realtime(false);
        params.set_print_timestamps(false);

        state
            .full(params, samples)
            .map_err(|e| TranscribeError::Local(format!("inference failed: {e:?}")))?;

        let segments = state
            .full_n_segments()
            .map_err(|e| TranscribeError::Local(format!("{e:?}")))?;

        let mut text = String::new();
        for i in 0..segments {
            let segment = state
                .full_get_segment_text(i)
                .map_err(|e| TranscribeError::Local(format!("{e:?}")))?;
            let trimmed = segment.trim();
            if !trimmed.is_empty() {
                if !text.is_empty() {
                    text.push(' ');
                }
                text.push_str(trimmed);
            }
        }

        Ok(text)
    }
}
