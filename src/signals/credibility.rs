// =============================================================================
// Credibility Aggregator
// =============================================================================
//
// score = clamp(100 - fake_probability - industry_penalty - sentiment_penalty)
//
// Both penalties only grow with the fake probability, so the score never
// increases as the fake probability increases.
// =============================================================================

use serde::{Deserialize, Serialize};

use crate::types::{CredibilityLevel, SentimentLabel};

/// Categories whose coverage is historically more sensational.
pub const INDUSTRY_PENALTIES: [(&str, f64); 3] =
    [("Politics", 5.0), ("Entertainment", 3.0), ("Media", 2.0)];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CredibilityAssessment {
    pub score: f64,
    pub level: CredibilityLevel,
}

pub fn industry_penalty(industry: &str) -> f64 {
    INDUSTRY_PENALTIES
        .iter()
        .find(|(name, _)| *name == industry)
        .map_or(0.0, |(_, penalty)| *penalty)
}

/// Emotionally charged coverage of doubtful content loses a few points.
pub fn sentiment_penalty(sentiment: SentimentLabel, fake_probability: f64) -> f64 {
    match sentiment {
        SentimentLabel::Negative if fake_probability > 60.0 => 3.0,
        SentimentLabel::Positive if fake_probability > 70.0 => 2.0,
        _ => 0.0,
    }
}

/// Credibility in `[0, 100]`.
pub fn credibility_score(fake_probability: f64, sentiment: SentimentLabel, industry: &str) -> f64 {
    let score = 100.0
        - fake_probability
        - industry_penalty(industry)
        - sentiment_penalty(sentiment, fake_probability);
    score.clamp(0.0, 100.0)
}

impl CredibilityAssessment {
    pub fn from_score(score: f64) -> Self {
        Self {
            score,
            level: CredibilityLevel::from_score(score),
        }
    }
}
