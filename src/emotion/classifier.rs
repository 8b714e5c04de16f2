// src/emotion/classifier.rs

//! Emotion classification service.
//!
//! Owns the (lazily initialized, process-shared) model handle and layers the
//! chunk-aggregation strategy on top of it: long inputs are split into
//! sentence-respecting chunks, every chunk is scored, and per-label scores
//! are summed across chunks before normalizing. Summing rather than averaging
//! biases the result toward labels that recur across chunks instead of a
//! single confident outlier.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::OnceCell;

use crate::emotion::chunker;
use crate::emotion::model::{ClassifyError, EmotionModel, KeywordModel, OnnxEmotionModel};

/// Default chunk bound, matching the classifier's comfortable input size.
pub const CHUNK_MAX_LEN: usize = 300;

const NEUTRAL_LABEL: &str = "neutral";
const NEUTRAL_FALLBACK_CONFIDENCE: f32 = 0.6;

#[derive(Debug, Clone)]
pub struct Prediction {
    pub label: String,
    pub confidence: f32,
}

#[derive(Debug, Clone)]
pub struct ScoredPrediction {
    pub label: String,
    pub confidence: f32,
    /// Normalized probabilities per label; values sum to 1.
    pub scores: BTreeMap<String, f32>,
}

enum Backend {
    /// Model directory to load on first use.
    Onnx(PathBuf),
    /// Handle supplied up front (keyword mode, tests).
    Preloaded,
}

pub struct EmotionClassifier {
    backend: Backend,
    model: OnceCell<Arc<dyn EmotionModel>>,
    chunk_max_len: usize,
}

impl EmotionClassifier {
    /// Classifier backed by an ONNX model directory. The model is loaded
    /// lazily on first use and cached for the process lifetime.
    pub fn onnx(model_dir: PathBuf, chunk_max_len: usize) -> Self {
        Self {
            backend: Backend::Onnx(model_dir),
            model: OnceCell::new(),
            chunk_max_len,
        }
    }

    /// Lexicon-backed degraded mode: no model weights needed.
    pub fn keyword(chunk_max_len: usize) -> Self {
        Self::with_model(Arc::new(KeywordModel), chunk_max_len)
    }

    pub fn with_model(model: Arc<dyn EmotionModel>, chunk_max_len: usize) -> Self {
        Self {
            backend: Backend::Preloaded,
            model: OnceCell::new_with(Some(model)),
            chunk_max_len,
        }
    }

    /// At-most-once model initialization under concurrent first use.
    async fn model(&self) -> Result<Arc<dyn EmotionModel>, ClassifyError> {
        self.model
            .get_or_try_init(|| async {
                match &self.backend {
                    Backend::Onnx(dir) => {
                        let dir = dir.clone();
                        tracing::info!(model_dir = %dir.display(), "loading emotion model");
                        let model = tokio::task::spawn_blocking(move || {
                            OnnxEmotionModel::load(&dir)
                        })
                        .await
                        .map_err(|e| {
                            ClassifyError::ModelUnavailable(format!("model load task failed: {e}"))
                        })??;
                        Ok(Arc::new(model) as Arc<dyn EmotionModel>)
                    }
                    Backend::Preloaded => Err(ClassifyError::ModelUnavailable(
                        "no model configured".to_string(),
                    )),
                }
            })
            .await
            .cloned()
    }

    /// Best (label, confidence) for `text`. Empty input short-circuits to
    /// ("neutral", 0.6) without touching the model; a single short chunk is
    /// classified in one pass and the model's top label/score returned
    /// verbatim; anything longer goes through chunk aggregation.
    pub async fn predict(&self, text: &str) -> Result<Prediction, ClassifyError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Ok(Prediction {
                label: NEUTRAL_LABEL.to_string(),
                confidence: NEUTRAL_FALLBACK_CONFIDENCE,
            });
        }

        let model = self.model().await?;
        let chunks = chunker::split(trimmed, self.chunk_max_len);

        if chunks.len() == 1 && chunks[0].len() <= self.chunk_max_len {
            let scores = model.score_chunk(&chunks[0])?;
            let (label, confidence) = match argmax(&scores) {
                Some(best) => best,
                None => {
                    return Ok(Prediction {
                        label: NEUTRAL_LABEL.to_string(),
                        confidence: NEUTRAL_FALLBACK_CONFIDENCE,
                    });
                }
            };
            return Ok(Prediction { label, confidence });
        }

        let scored = aggregate(model.as_ref(), &chunks)?;
        Ok(Prediction {
            label: scored.label,
            confidence: scored.confidence,
        })
    }

    /// Best label plus the full normalized distribution.
    pub async fn predict_with_scores(&self, text: &str) -> Result<ScoredPrediction, ClassifyError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Ok(neutral_scored());
        }

        let model = self.model().await?;
        let chunks = chunker::split(trimmed, self.chunk_max_len);
        aggregate(model.as_ref(), &chunks)
    }
}

fn neutral_scored() -> ScoredPrediction {
    let mut scores = BTreeMap::new();
    scores.insert(NEUTRAL_LABEL.to_string(), 1.0);
    ScoredPrediction {
        label: NEUTRAL_LABEL.to_string(),
        confidence: NEUTRAL_FALLBACK_CONFIDENCE,
        scores,
    }
}

/// Score every chunk, sum per-label scores across chunks, normalize by the
/// total. The best label is the argmax of the normalized distribution and the
/// confidence is its normalized score.
fn aggregate(model: &dyn EmotionModel, chunks: &[String]) -> Result<ScoredPrediction, ClassifyError> {
    let mut totals: BTreeMap<String, f32> = BTreeMap::new();
    for chunk in chunks {
        for (label, score) in model.score_chunk(chunk)? {
            *totals.entry(label).or_insert(0.0) += score;
        }
    }

    let sum: f32 = totals.values().sum();
    if totals.is_empty() || sum <= 0.0 {
        return Ok(neutral_scored());
    }

    for score in totals.values_mut() {
        *score /= sum;
    }

    let (label, confidence) = argmax(&totals).unwrap_or_else(|| {
        (NEUTRAL_LABEL.to_string(), NEUTRAL_FALLBACK_CONFIDENCE)
    });

    Ok(ScoredPrediction {
        label,
        confidence,
        scores: totals,
    })
}

/// Argmax over a BTreeMap keeps the current best unless a strictly greater
/// score appears, so exact ties resolve to the lexicographically smallest
/// label.
fn argmax(scores: &BTreeMap<String, f32>) -> Option<(String, f32)> {
    let mut best: Option<(&String, f32)> = None;
    for (label, &score) in scores {
        if best.map_or(true, |(_, b)| score > b) {
            best = Some((label, score));
        }
    }
    best.map(|(label, score)| (label.clone(), score))
}

/// Top two (label, probability) pairs, highest first; equal scores keep
/// lexicographic order.
pub fn top_two(scores: &BTreeMap<String, f32>) -> Vec<(String, f32)> {
    let mut ranked: Vec<(String, f32)> = scores
        .iter()
        .map(|(label, &score)| (label.clone(), score))
        .collect();
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    ranked.truncate(2);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emotion::model::ChunkScores;

    struct FixedModel {
        scores: ChunkScores,
    }

    impl EmotionModel for FixedModel {
        fn score_chunk(&self, _text: &str) -> Result<ChunkScores, ClassifyError> {
            Ok(self.scores.clone())
        }

        fn name(&self) -> &'static str {
            "fixed"
        }
    }

    fn fixed(pairs: &[(&str, f32)]) -> Arc<dyn EmotionModel> {
        Arc::new(FixedModel {
            scores: pairs.iter().map(|(l, s)| (l.to_string(), *s)).collect(),
        })
    }

    #[tokio::test]
    async fn empty_input_short_circuits_to_neutral() {
        let classifier = EmotionClassifier::keyword(CHUNK_MAX_LEN);

        let p = classifier.predict("   ").await.unwrap();
        assert_eq!(p.label, "neutral");
        assert!((p.confidence - 0.6).abs() < 1e-6);

        let scored = classifier.predict_with_scores("").await.unwrap();
        assert_eq!(scored.scores.len(), 1);
        assert!((scored.scores["neutral"] - 1.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn distribution_sums_to_one_and_argmax_is_label() {
        let classifier = EmotionClassifier::keyword(40);
        let text = "I am so happy today. Everything feels great. What a good day this is.";

        let scored = classifier.predict_with_scores(text).await.unwrap();
        let sum: f32 = scored.scores.values().sum();
        assert!((sum - 1.0).abs() < 1e-4);

        let (argmax_label, _) = argmax(&scored.scores).unwrap();
        assert_eq!(argmax_label, scored.label);
        assert_eq!(scored.label, "joy");
    }

    #[tokio::test]
    async fn single_short_chunk_returns_model_score_verbatim() {
        let classifier = EmotionClassifier::keyword(CHUNK_MAX_LEN);

        let p = classifier.predict("I feel happy").await.unwrap();
        assert_eq!(p.label, "joy");
        // One keyword hit: 0.65 + 0.1, untouched by normalization.
        assert!((p.confidence - 0.75).abs() < 1e-6);
    }

    #[tokio::test]
    async fn recurring_label_beats_single_outlier_across_chunks() {
        // Tiny max_len: every sentence becomes its own chunk. "happy" recurs
        // in six of seven chunks; anger scores once, strongly. Summing
        // favors the recurring label.
        let classifier = EmotionClassifier::keyword(10);
        let text = "Happy morning. Happy lunch too. Happy afternoon. Happy evening. \
                    Happy night. Happy again today. I was furious and mad and annoyed.";

        let scored = classifier.predict_with_scores(text).await.unwrap();
        assert_eq!(scored.label, "joy");
        assert!(scored.scores["joy"] > scored.scores["anger"]);
    }

    #[tokio::test]
    async fn exact_ties_break_lexicographically() {
        let model = fixed(&[("sadness", 0.4), ("anger", 0.4), ("neutral", 0.2)]);
        let classifier = EmotionClassifier::with_model(model, CHUNK_MAX_LEN);

        let scored = classifier.predict_with_scores("whatever text").await.unwrap();
        assert_eq!(scored.label, "anger");
    }

    #[test]
    fn top_two_ranks_by_score_then_label() {
        let scores: BTreeMap<String, f32> = [("joy", 0.5), ("anger", 0.3), ("fear", 0.2)]
            .iter()
            .map(|(l, s)| (l.to_string(), *s))
            .collect();

        let top = top_two(&scores);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].0, "joy");
        assert_eq!(top[1].0, "anger");
    }
}
