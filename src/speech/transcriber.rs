// src/speech/transcriber.rs

//! Transcription service: remote speech recognition with a local fallback.
//!
//! The remote service is preferred when an API key is configured; any remote
//! failure (network, auth, quota) logs a warning and routes through the local
//! model instead. Transcripts are normalized (whitespace collapsed, filler
//! words stripped) before they reach the emotion pipeline.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::OnceCell;

use crate::speech::convert;
use crate::speech::local::LocalSpeechModel;
use crate::speech::remote::RemoteSpeechClient;
use crate::speech::TranscribeError;

/// Single-token fillers dropped from transcripts.
const FILLER_WORDS: &[&str] = &["uh", "um", "umm", "er", "ah", "like"];

/// Multi-token fillers, matched as whole token sequences.
const FILLER_PHRASES: &[&[&str]] = &[&["you", "know"]];

#[derive(Debug, Clone)]
pub struct TranscribeOutcome {
    pub text: String,
    pub duration: Option<f64>,
    pub used_fallback: bool,
}

pub struct TranscriberSettings {
    /// Remote service credentials; None disables the remote path entirely.
    pub api_key: Option<String>,
    pub api_base: String,
    pub remote_model: String,
    pub remote_timeout: Duration,
    pub local_model_path: PathBuf,
    pub language: Option<String>,
    pub ffmpeg_path: String,
    pub convert_timeout: Duration,
}

pub struct Transcriber {
    remote: Option<RemoteSpeechClient>,
    local_model_path: PathBuf,
    language: Option<String>,
    ffmpeg_path: String,
    convert_timeout: Duration,
    local: OnceCell<Arc<LocalSpeechModel>>,
}

impl Transcriber {
    pub fn new(settings: TranscriberSettings) -> Result<Self, TranscribeError> {
        let remote = match settings.api_key {
            Some(key) if !key.trim().is_empty() => Some(RemoteSpeechClient::new(
                key,
                settings.api_base,
                settings.remote_model,
                settings.remote_timeout,
            )?),
            _ => None,
        };

        Ok(Self {
            remote,
            local_model_path: settings.local_model_path,
            language: settings.language,
            ffmpeg_path: settings.ffmpeg_path,
            convert_timeout: settings.convert_timeout,
            local: OnceCell::new(),
        })
    }

    /// At-most-once lazy initialization of the local model.
    async fn local_model(&self) -> Result<Arc<LocalSpeechModel>, TranscribeError> {
        self.local
            .get_or_try_init(|| async {
                let path = self.local_model_path.clone();
                let language = self.language.clone();
                tracing::info!(model = %path.display(), "loading local speech model");
                let model =
                    tokio::task::spawn_blocking(move || LocalSpeechModel::load(&path, language))
                        .await
                        .map_err(|e| {
                            TranscribeError::ModelUnavailable(format!(
                                "model load task failed: {e}"
                            ))
                        })??;
                Ok(Arc::new(model))
            })
            .await
            .cloned()
    }

    /// Transcribe uploaded audio bytes, remote first, local on any failure.
    pub async fn transcribe(
        &self,
        audio: &[u8],
        filename: &str,
    ) -> Result<TranscribeOutcome, TranscribeError> {
        let mut duration = convert::probe_duration(audio);
        let mut used_fallback = false;
        let mut transcript = String::new();

        if let Some(remote) = &self.remote {
            match remote.transcribe(audio.to_vec(), filename).await {
                Ok(text) => transcript = text,
                Err(e) => {
                    tracing::warn!(error = %e, "remote transcription failed; using local fallback");
                }
            }
        }

        if transcript.trim().is_empty() {
            used_fallback = true;
            let converted =
                convert::to_whisper_pcm(audio, &self.ffmpeg_path, self.convert_timeout).await?;
            if duration.is_none() {
                duration = Some(converted.duration);
            }

            let model = self.local_model().await?;
            let samples = converted.samples;
            transcript = tokio::task::spawn_blocking(move || model.transcribe(&samples))
                .await
                .map_err(|e| TranscribeError::Local(format!("transcription task failed: {e}")))??;
        }

        let cleaned = clean_transcript(&transcript);
        if cleaned.is_empty() {
            return Err(TranscribeError::EmptyTranscript);
        }

        Ok(TranscribeOutcome {
            text: cleaned,
            duration,
            used_fallback,
        })
    }
}

/// Collapse whitespace runs and strip filler words.
///
/// Works on whole tokens: a filler is dropped only when it stands alone
/// (possibly wearing punctuation), so substrings of real words such as
/// "umbrella" or "likely" are never touched. Multi-token fillers are matched
/// as sequences.
pub fn clean_transcript(raw: &str) -> String {
    let tokens: Vec<&str> = raw.split_whitespace().collect();
    let mut kept: Vec<&str> = Vec::with_capacity(tokens.len());

    let mut i = 0;
    while i < tokens.len() {
        if let Some(len) = phrase_match_len(&tokens[i..]) {
            i += len;
            continue;
        }
        if FILLER_WORDS.contains(&bare(tokens[i]).as_str()) {
            i += 1;
            continue;
        }
        kept.push(tokens[i]);
        i += 1;
    }

    kept.join(" ")
}

fn phrase_match_len(tokens: &[&str]) -> Option<usize> {
    for phrase in FILLER_PHRASES {
        if tokens.len() >= phrase.len()
            && phrase
                .iter()
                .zip(tokens)
                .all(|(want, token)| bare(token) == *want)
        {
            return Some(phrase.len());
        }
    }
    None
}

/// Token stripped of surrounding punctuation, lowercased, for comparison.
fn bare(token: &str) -> String {
    token
        .trim_matches(|c: char| !c.is_alphanumeric() && c != '\'')
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_fillers_and_collapses_whitespace() {
        assert_eq!(clean_transcript(" uh hello  um there "), "hello there");
    }

    #[test]
    fn strips_fillers_at_every_position() {
        assert_eq!(clean_transcript("um so I went er home ah"), "so I went home");
    }

    #[test]
    fn multi_token_fillers_match_as_sequences() {
        assert_eq!(
            clean_transcript("it was you know really good"),
            "it was really good"
        );
        // "know" alone is a real word.
        assert_eq!(clean_transcript("I know the answer"), "I know the answer");
    }

    #[test]
    fn substrings_of_real_words_survive() {
        assert_eq!(
            clean_transcript("my umbrella is likely fine"),
            "my umbrella is likely fine"
        );
    }

    #[test]
    fn punctuation_adjacent_fillers_are_dropped() {
        assert_eq!(clean_transcript("Well, um, I think so."), "Well, I think so.");
    }

    #[test]
    fn all_filler_input_cleans_to_empty() {
        assert_eq!(clean_transcript("uh um umm er"), "");
    }

    #[tokio::test]
    async fn transcribe_without_remote_or_tools_errors() {
        let transcriber = Transcriber::new(TranscriberSettings {
            api_key: None,
            api_base: "https://api.openai.com/v1".to_string(),
            remote_model: "whisper-1".to_string(),
            remote_timeout: Duration::from_secs(5),
            local_model_path: PathBuf::from("/nonexistent/ggml-base.bin"),
            language: None,
            ffmpeg_path: "/nonexistent/ffmpeg".to_string(),
            convert_timeout: Duration::from_secs(5),
        })
        .unwrap();

        let result = transcriber.transcribe(b"not audio", "clip.webm").await;
        assert!(result.is_err());
    }
}
