// src/speech/mod.rs

pub mod convert;
pub mod local;
pub mod remote;
pub mod transcriber;

use thiserror::Error;

pub use transcriber::{TranscribeOutcome, Transcriber, TranscriberSettings};

#[derive(Debug, Error)]
pub enum TranscribeError {
    #[error("remote transcription failed: {0}")]
    Remote(String),

    #[error("audio conversion failed: {0}")]
    Convert(String),

    #[error("local speech model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("local transcription failed: {0}")]
    Local(String),

    /// The audio produced no usable text after cleanup. Distinct from the
    /// failure modes above: the pipeline worked, there was nothing to hear.
    #[error("transcription empty")]
    EmptyTranscript,
}
