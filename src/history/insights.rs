// src/history/insights.rs

//! Windowed emotion insights: occurrence counts per label and an unweighted
//! polarity mix, over logs already filtered to the requested time window.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::emotion::Polarity;
use crate::storage::EmotionLog;

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct MixRatios {
    pub positive: f32,
    pub negative: f32,
    pub neutral: f32,
}

#[derive(Debug, Serialize)]
pub struct InsightSummary {
    pub total: usize,
    pub top_emotion: Option<String>,
    pub counts: BTreeMap<String, usize>,
    pub mix: MixRatios,
    pub window_days: i64,
}

/// Count label occurrences (not confidence-weighted) and derive the polarity
/// mix from the same label sets the history aggregator uses. `top_emotion` is
/// the argmax by count; exact ties go to the lexicographically smallest label.
pub fn summarize(logs: &[EmotionLog], window_days: i64) -> InsightSummary {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for log in logs {
        let label = log.detected_emotion.trim().to_lowercase();
        let key = if label.is_empty() {
            "unknown".to_string()
        } else {
            label
        };
        *counts.entry(key).or_insert(0) += 1;
    }

    let total: usize = counts.values().sum();

    let mut top_emotion: Option<(&String, usize)> = None;
    for (label, &count) in &counts {
        if top_emotion.map_or(true, |(_, best)| count > best) {
            top_emotion = Some((label, count));
        }
    }

    let mut mix_counts = (0usize, 0usize, 0usize);
    for (label, &count) in &counts {
        match Polarity::of_label(label) {
            Polarity::Positive => mix_counts.0 += count,
            Polarity::Negative => mix_counts.1 += count,
            Polarity::Neutral => mix_counts.2 += count,
        }
    }

    let ratio = |n: usize| {
        if total > 0 {
            n as f32 / total as f32
        } else {
            0.0
        }
    };

    InsightSummary {
        total,
        top_emotion: top_emotion.map(|(label, _)| label.clone()),
        counts,
        mix: MixRatios {
            positive: ratio(mix_counts.0),
            negative: ratio(mix_counts.1),
            neutral: ratio(mix_counts.2),
        },
        window_days,
    }
}
