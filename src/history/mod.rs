// src/history/mod.rs

pub mod aggregate;
pub mod insights;
pub mod respond;

pub use aggregate::{aggregate, PolarityMix, HISTORY_WINDOW};
pub use insights::{summarize, InsightSummary, MixRatios};
pub use respond::{decide, AdaptiveReply, ReasonCode};
