// src/speech/convert.rs

//! Audio conversion for the local speech model.
//!
//! The local model only accepts mono 16 kHz 16-bit PCM, so arbitrary uploads
//! are resampled through an external ffmpeg process first. The conversion is
//! bounded by a timeout and all temporary files live in a TempDir, so cleanup
//! happens on every exit path including timeouts and decode failures.

use std::io::Cursor;
use std::process::Stdio;
use std::time::Duration;

use hound::SampleFormat;
use tokio::process::Command;

use crate::speech::TranscribeError;

pub const TARGET_SAMPLE_RATE: u32 = 16_000;

/// Decoded audio in the local model's input format.
pub struct ConvertedAudio {
    /// Mono 16 kHz PCM, normalized to [-1.0, 1.0].
    pub samples: Vec<f32>,
    pub duration: f64,
}

/// Resample `audio` to mono/16 kHz/s16le WAV via ffmpeg and decode it.
pub async fn to_whisper_pcm(
    audio: &[u8],
    ffmpeg_path: &str,
    timeout: Duration,
) -> Result<ConvertedAudio, TranscribeError> {
    let dir = tempfile::tempdir()
        .map_err(|e| TranscribeError::Convert(format!("failed to create temp dir: {e}")))?;
    let input_path = dir.path().join("upload.bin");
    let output_path = dir.path().join("converted.wav");

    tokio::fs::write(&input_path, audio)
        .await
        .map_err(|e| TranscribeError::Convert(format!("failed to stage upload: {e}")))?;

    let mut cmd = Command::new(ffmpeg_path);
    cmd.args(["-hide_banner", "-loglevel", "error", "-nostdin", "-y", "-i"])
        .arg(&input_path)
        .args(["-ar", "16000", "-ac", "1", "-c:a", "pcm_s16le"])
        .arg(&output_path)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let output = tokio::time::timeout(timeout, cmd.output())
        .await
        .map_err(|_| TranscribeError::Convert("ffmpeg timed out".to_string()))?
        .map_err(|e| TranscribeError::Convert(format!("failed to run ffmpeg: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(TranscribeError::Convert(format!(
            "ffmpeg exited with {}: {}",
            output.status,
            stderr.trim()
        )));
    }

    let wav = tokio::fs::read(&output_path)
        .await
        .map_err(|e| TranscribeError::Convert(format!("failed to read converted audio: {e}")))?;

    decode_wav(&wav)
}

/// Decode a WAV buffer to f32 samples. Expects the ffmpeg output format but
/// tolerates float WAVs too.
pub fn decode_wav(bytes: &[u8]) -> Result<ConvertedAudio, TranscribeError> {
    let reader = hound::WavReader::new(Cursor::new(bytes))
        .map_err(|e| TranscribeError::Convert(format!("invalid WAV: {e}")))?;
    let spec = reader.spec();
    if spec.sample_rate == 0 {
        return Err(TranscribeError::Convert("WAV has zero sample rate".to_string()));
    }

    let samples: Vec<f32> = match spec.sample_format {
        SampleFormat::Int => reader
            .into_samples::<i16>()
            .map(|s| s.map(|v| v as f32 / 32768.0))
            .collect::<Result<_, _>>()
            .map_err(|e| TranscribeError::Convert(format!("WAV decode failed: {e}")))?,
        SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<Result<_, _>>()
            .map_err(|e| TranscribeError::Convert(format!("WAV decode failed: {e}")))?,
    };

    let frames = samples.len() / spec.channels.max(1) as usize;
    let duration = frames as f64 / spec.sample_rate as f64;

    Ok(ConvertedAudio { samples, duration })
}

/// Best-effort duration probe for uploads that are already WAV. Anything else
/// returns None; callers treat duration as optional throughout.
pub fn probe_duration(bytes: &[u8]) -> Option<f64> {
    let reader = hound::WavReader::new(Cursor::new(bytes)).ok()?;
    let spec = reader.spec();
    if spec.sample_rate == 0 {
        return None;
    }
    Some(reader.duration() as f64 / spec.sample_rate as f64)
}
