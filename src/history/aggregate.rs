// src/history/aggregate.rs

//! Confidence-weighted polarity aggregation over a user's recent logs.

use serde::Serialize;

use crate::emotion::Polarity;
use crate::storage::EmotionLog;

/// How many of the most recent logs feed the mix.
pub const HISTORY_WINDOW: usize = 30;

/// Per-log weight bounds. The floor keeps low-confidence entries counting
/// toward the mix instead of letting many near-zero logs collapse into an
/// all-neutral outcome; the ceiling caps invalid stored confidences.
const WEIGHT_FLOOR: f32 = 0.2;
const WEIGHT_CEIL: f32 = 1.0;

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct PolarityMix {
    pub positive: f32,
    pub negative: f32,
    pub neutral: f32,
}

impl PolarityMix {
    pub fn total(&self) -> f32 {
        self.positive + self.negative + self.neutral
    }

    pub fn positive_pct(&self) -> f32 {
        let total = self.total();
        if total > 0.0 { self.positive / total } else { 0.0 }
    }

    pub fn negative_pct(&self) -> f32 {
        let total = self.total();
        if total > 0.0 { self.negative / total } else { 0.0 }
    }
}

/// Aggregate the most recent `HISTORY_WINDOW` logs (newest first) into a
/// weighted polarity mix. Each log contributes its confidence clamped to
/// [0.2, 1.0]; label membership is case-insensitive.
pub fn aggregate(logs: &[EmotionLog]) -> PolarityMix {
    let mut mix = PolarityMix::default();

    for log in logs.iter().take(HISTORY_WINDOW) {
        let weight = log.confidence.clamp(WEIGHT_FLOOR, WEIGHT_CEIL);
        match Polarity::of_label(&log.detected_emotion) {
            Polarity::Positive => mix.positive += weight,
            Polarity::Negative => mix.negative += weight,
            Polarity::Neutral => mix.neutral += weight,
        }
    }

    mix
}
