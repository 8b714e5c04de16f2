// src/speech/remote.rs
// HTTP client for the remote speech-recognition service (OpenAI-compatible
// audio/transcriptions endpoint).

use std::time::Duration;

use reqwest::multipart;
use reqwest::Client;
use serde::Deserialize;

use crate::speech::TranscribeError;

pub struct RemoteSpeechClient {
    client: Client,
    api_key: String,
    api_base: String,
    model: String,
}

#[derive(Deserialize)]
struct TranscriptionResponse {
    text: String,
}

impl RemoteSpeechClient {
    pub fn new(
        api_key: String,
        api_base: String,
        model: String,
        timeout: Duration,
    ) -> Result<Self, TranscribeError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TranscribeError::Remote(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            api_base,
            model,
        })
    }

    /// Send raw audio bytes for transcription. The upload's MIME type is
    /// guessed from the filename; unknown extensions go up as octet-stream.
    pub async fn transcribe(
        &self,
        audio: Vec<u8>,
        filename: &str,
    ) -> Result<String, TranscribeError> {
        let mime = mime_guess::from_path(filename).first_or_octet_stream();

        let part = multipart::Part::bytes(audio)
            .file_name(filename.to_string())
            .mime_str(mime.essence_str())
            .map_err(|e| TranscribeError::Remote(format!("invalid upload part: {e}")))?;

        let form = multipart::Form::new()
            .text("model", self.model.clone())
            .part("file", part);

        let url = format!(
            "{}/audio/transcriptions",
            self.api_base.trim_end_matches('/')
        );

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .multipart(form)
            .send()
            .await
            .map_err(|e| TranscribeError::Remote(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(TranscribeError::Remote(format!(
                "service returned {status}: {error_text}"
            )));
        }

        let parsed: TranscriptionResponse = response
            .json()
            .await
            .map_err(|e| TranscribeError::Remote(format!("failed to parse response: {e}")))?;

        Ok(parsed.text)
    }
}
