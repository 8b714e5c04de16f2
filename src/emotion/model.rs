// src/emotion/model.rs

//! Emotion model backends.
//!
//! `OnnxEmotionModel` wraps a pretrained text-classification export (ONNX
//! graph + tokenizer.json + config.json in one directory). `KeywordModel` is
//! the lexicon-based degraded mode used when running without model weights.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Mutex;

use ndarray::Array2;
use ort::session::Session;
use ort::session::builder::{GraphOptimizationLevel, SessionBuilder};
use ort::value::Value;
use serde::Deserialize;
use thiserror::Error;
use tokenizers::Tokenizer;

/// Per-label scores for one chunk. Keyed by a BTreeMap so iteration order is
/// lexicographic and argmax tie-breaking is deterministic. Values are not
/// required to be normalized; the classifier normalizes aggregates.
pub type ChunkScores = BTreeMap<String, f32>;

#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("emotion model unavailable: {0}")]
    ModelUnavailable(String),
    #[error("emotion inference failed: {0}")]
    Inference(String),
}

/// A text-classification backend producing a per-label score map for a single
/// chunk of text. Implementations are shared behind an `Arc` and must
/// serialize access to any non-thread-safe inner state themselves.
pub trait EmotionModel: Send + Sync {
    fn score_chunk(&self, text: &str) -> Result<ChunkScores, ClassifyError>;

    fn name(&self) -> &'static str;
}

// ── ONNX backend ────────────────────────────────────────────────────────────

const MAX_TOKENS: usize = 512;

pub struct OnnxEmotionModel {
    // ort sessions take &mut self to run; inference is serialized per
    // instance.
    session: Mutex<Session>,
    tokenizer: Tokenizer,
    labels: Vec<String>,
}

#[derive(Deserialize)]
struct ModelConfig {
    id2label: HashMap<String, String>,
}

impl OnnxEmotionModel {
    /// Load tokenizer, label map, and ONNX session from a model directory.
    pub fn load(model_dir: &Path) -> Result<Self, ClassifyError> {
        let tokenizer_path = model_dir.join("tokenizer.json");
        let config_path = model_dir.join("config.json");
        let model_path = model_dir.join("model.onnx");

        for required in [&tokenizer_path, &config_path, &model_path] {
            if !required.exists() {
                return Err(ClassifyError::ModelUnavailable(format!(
                    "{} not found",
                    required.display()
                )));
            }
        }

        let tokenizer = Tokenizer::from_file(&tokenizer_path).map_err(|e| {
            ClassifyError::ModelUnavailable(format!(
                "failed to load tokenizer from {}: {e}",
                tokenizer_path.display()
            ))
        })?;

        let config_data = std::fs::read_to_string(&config_path).map_err(|e| {
            ClassifyError::ModelUnavailable(format!("failed to read config.json: {e}"))
        })?;
        let config: ModelConfig = serde_json::from_str(&config_data).map_err(|e| {
            ClassifyError::ModelUnavailable(format!("failed to parse config.json: {e}"))
        })?;

        let mut labels = vec![String::new(); config.id2label.len()];
        for (id_str, label) in config.id2label {
            let id: usize = id_str.parse().map_err(|_| {
                ClassifyError::ModelUnavailable(format!("invalid label id in config: {id_str}"))
            })?;
            if id >= labels.len() {
                return Err(ClassifyError::ModelUnavailable(format!(
                    "label id {id} out of range (max {})",
                    labels.len()
                )));
            }
            labels[id] = label;
        }

        let intra_threads = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4)
            .clamp(1, 8);

        let session = SessionBuilder::new()
            .map_err(|e| ClassifyError::ModelUnavailable(e.to_string()))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| ClassifyError::ModelUnavailable(e.to_string()))?
            .with_intra_threads(intra_threads)
            .map_err(|e| ClassifyError::ModelUnavailable(e.to_string()))?
            .commit_from_file(&model_path)
            .map_err(|e| {
                ClassifyError::ModelUnavailable(format!(
                    "failed to load {}: {e}",
                    model_path.display()
                ))
            })?;

        tracing::info!(
            model = %model_path.display(),
            labels = labels.len(),
            "emotion model loaded"
        );

        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
            labels,
        })
    }
}

impl EmotionModel for OnnxEmotionModel {
    fn score_chunk(&self, text: &str) -> Result<ChunkScores, ClassifyError> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| ClassifyError::Inference(format!("tokenization failed: {e}")))?;

        let mut ids: Vec<i64> = encoding.get_ids().iter().map(|&id| id as i64).collect();
        let mut mask: Vec<i64> = encoding
            .get_attention_mask()
            .iter()
            .map(|&m| m as i64)
            .collect();
        if ids.len() > MAX_TOKENS {
            ids.truncate(MAX_TOKENS);
            mask.truncate(MAX_TOKENS);
        }
        if ids.is_empty() {
            return Err(ClassifyError::Inference(
                "tokenizer produced no tokens".to_string(),
            ));
        }
        let seq = ids.len();

        let input_ids = Array2::from_shape_vec((1, seq), ids)
            .map_err(|e| ClassifyError::Inference(e.to_string()))?;
        let attention_mask = Array2::from_shape_vec((1, seq), mask)
            .map_err(|e| ClassifyError::Inference(e.to_string()))?;

        let input_ids_value = Value::from_array(input_ids)
            .map_err(|e: ort::Error| ClassifyError::Inference(e.to_string()))?;
        let attention_mask_value = Value::from_array(attention_mask)
            .map_err(|e: ort::Error| ClassifyError::Inference(e.to_string()))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| ClassifyError::Inference("model session lock poisoned".to_string()))?;
        let outputs = session
            .run(ort::inputs![
                "input_ids"      => input_ids_value,
                "attention_mask" => attention_mask_value,
            ])
            .map_err(|e| ClassifyError::Inference(e.to_string()))?;

        let (_, logits) = outputs["logits"]
            .try_extract_tensor::<f32>()
            .map_err(|e| ClassifyError::Inference(e.to_string()))?;

        // Batch size is 1, so the flat buffer is one row of per-label logits.
        if logits.len() != self.labels.len() {
            return Err(ClassifyError::Inference(format!(
                "model returned {} logits for {} labels",
                logits.len(),
                self.labels.len()
            )));
        }

        Ok(softmax_scores(&self.labels, logits))
    }

    fn name(&self) -> &'static str {
        "onnx"
    }
}

fn softmax_scores(labels: &[String], logits: &[f32]) -> ChunkScores {
    let max_logit = logits.iter().fold(f32::NEG_INFINITY, |a, &b| a.max(b));
    let exps: Vec<f32> = logits.iter().map(|&l| (l - max_logit).exp()).collect();
    let sum: f32 = exps.iter().sum();

    labels
        .iter()
        .zip(exps)
        .map(|(label, e)| (label.to_lowercase(), e / sum))
        .collect()
}

// ── Keyword degraded mode ───────────────────────────────────────────────────

/// Lexicon fallback used when no model weights are present. Scores follow the
/// shape the real model produces closely enough for the rest of the pipeline:
/// a hit-count-scaled score per matched label plus a constant neutral
/// baseline, so "no hits" classifies as neutral at 0.6.
pub struct KeywordModel;

const LEXICON: &[(&str, &[&str])] = &[
    ("joy", &["happy", "great", "good", "joy", "glad", "pleased"]),
    ("sadness", &["sad", "unhappy", "down", "depressed", "blue"]),
    ("anger", &["angry", "mad", "furious", "annoyed"]),
    ("surprise", &["surpris", "wow", "unexpected"]),
    ("fear", &["scared", "afraid", "fear", "anxious", "nervous"]),
];

const NEUTRAL_BASELINE: f32 = 0.6;

impl EmotionModel for KeywordModel {
    fn score_chunk(&self, text: &str) -> Result<ChunkScores, ClassifyError> {
        let lower = text.to_lowercase();

        let mut scores = ChunkScores::new();
        for (label, keywords) in LEXICON {
            let hits = keywords.iter().filter(|kw| lower.contains(**kw)).count();
            if hits > 0 {
                let score = (0.65 + 0.1 * hits as f32).min(0.95);
                scores.insert((*label).to_string(), score);
            }
        }
        scores.insert("neutral".to_string(), NEUTRAL_BASELINE);

        Ok(scores)
    }

    fn name(&self) -> &'static str {
        "keyword"
    }
}
