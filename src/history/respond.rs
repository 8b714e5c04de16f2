// src/history/respond.rs

//! Adaptive reply heuristic.
//!
//! A fixed rule cascade over the aggregated polarity mix and the most recent
//! label. No state machine: one evaluation per invocation, deterministic for
//! identical inputs.

use serde::Serialize;

use crate::emotion::Polarity;
use crate::history::aggregate::PolarityMix;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReasonCode {
    #[serde(rename = "no-history")]
    NoHistory,
    #[serde(rename = "mostly-negative-history")]
    MostlyNegativeHistory,
    #[serde(rename = "mostly-positive-history")]
    MostlyPositiveHistory,
    #[serde(rename = "recent-positive")]
    RecentPositive,
    #[serde(rename = "recent-negative")]
    RecentNegative,
    #[serde(rename = "mixed")]
    Mixed,
    #[serde(rename = "neutral")]
    Neutral,
}

impl ReasonCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReasonCode::NoHistory => "no-history",
            ReasonCode::MostlyNegativeHistory => "mostly-negative-history",
            ReasonCode::MostlyPositiveHistory => "mostly-positive-history",
            ReasonCode::RecentPositive => "recent-positive",
            ReasonCode::RecentNegative => "recent-negative",
            ReasonCode::Mixed => "mixed",
            ReasonCode::Neutral => "neutral",
        }
    }
}

#[derive(Debug, Clone)]
pub struct AdaptiveReply {
    pub response: &'static str,
    pub reason: ReasonCode,
    /// Sustained negative affect detected; the caller appends a mood-alert
    /// memory (best-effort).
    pub mood_alert: bool,
}

const MOSTLY_THRESHOLD: f32 = 0.6;
const MOOD_ALERT_THRESHOLD: f32 = 0.8;

const OPENING: &str = "Hello — how are you feeling today?";
const MOSTLY_NEGATIVE: &str = "I notice you've been feeling down recently. I'm here to listen — would you like to talk about what's bothering you?";
const MOSTLY_POSITIVE: &str = "You seem to be doing well! Keep it up — anything you'd like to build on today?";
const RECENT_POSITIVE: &str = "You sounded happier recently — glad to hear that! Want suggestions to keep the momentum?";
const RECENT_NEGATIVE: &str = "I'm sorry you're having a tough time. Would you like a breathing exercise or some resources?";
const MIXED: &str = "Your emotions seem mixed lately. Would a short grounding exercise or a quick journal help organize thoughts?";
const NEUTRAL: &str = "How are you feeling today? I can help track and remember important things for you.";

/// Pick a reply for the given mix. `most_recent` is the newest log's label,
/// None when the user has no history at all.
pub fn decide(mix: &PolarityMix, most_recent: Option<&str>) -> AdaptiveReply {
    let Some(last) = most_recent else {
        return AdaptiveReply {
            response: OPENING,
            reason: ReasonCode::NoHistory,
            mood_alert: false,
        };
    };

    let pos = mix.positive_pct();
    let neg = mix.negative_pct();
    let mood_alert = neg >= MOOD_ALERT_THRESHOLD;

    let (response, reason) = if neg >= MOSTLY_THRESHOLD {
        (MOSTLY_NEGATIVE, ReasonCode::MostlyNegativeHistory)
    } else if pos >= MOSTLY_THRESHOLD {
        (MOSTLY_POSITIVE, ReasonCode::MostlyPositiveHistory)
    } else {
        match Polarity::of_label(last) {
            Polarity::Positive => (RECENT_POSITIVE, ReasonCode::RecentPositive),
            Polarity::Negative => (RECENT_NEGATIVE, ReasonCode::RecentNegative),
            Polarity::Neutral => {
                if (pos - neg).abs() <= 0.2 && pos + neg >= 0.4 {
                    (MIXED, ReasonCode::Mixed)
                } else {
                    (NEUTRAL, ReasonCode::Neutral)
                }
            }
        }
    };

    AdaptiveReply {
        response,
        reason,
        mood_alert,
    }
}
