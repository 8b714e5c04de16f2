// src/emotion/polarity.rs

use serde::Serialize;

/// Membership sets shared by the history aggregator and the insights
/// summarizer. Everything outside both sets counts as neutral.
const POSITIVE_LABELS: &[&str] = &["joy", "love", "gratitude", "relief", "optimism", "happy"];

const NEGATIVE_LABELS: &[&str] = &[
    "sadness",
    "anger",
    "fear",
    "disgust",
    "frustration",
    "boredom",
    "stress",
    "stressed",
    "sad",
    "angry",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    Positive,
    Negative,
    Neutral,
}

impl Polarity {
    /// Classify an emotion label. Matching is case-insensitive; unknown and
    /// empty labels are neutral.
    pub fn of_label(label: &str) -> Self {
        let lower = label.trim().to_lowercase();
        if POSITIVE_LABELS.contains(&lower.as_str()) {
            Polarity::Positive
        } else if NEGATIVE_LABELS.contains(&lower.as_str()) {
            Polarity::Negative
        } else {
            Polarity::Neutral
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_is_case_insensitive() {
        assert_eq!(Polarity::of_label("JOY"), Polarity::Positive);
        assert_eq!(Polarity::of_label("Anger"), Polarity::Negative);
        assert_eq!(Polarity::of_label("  relief "), Polarity::Positive);
    }

    #[test]
    fn unknown_labels_are_neutral() {
        assert_eq!(Polarity::of_label("surprise"), Polarity::Neutral);
        assert_eq!(Polarity::of_label(""), Polarity::Neutral);
    }
}
