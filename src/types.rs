// =============================================================================
// Shared types used across the Credence analysis service
// =============================================================================

use serde::{Deserialize, Serialize};

/// A single labeled, confidence-scored inference result.
///
/// Confidence scale depends on the producer: sentiment scores are in
/// `[0, 100]`, the lexical classifiers and the language detector report
/// `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub label: String,
    pub confidence: f64,
}

impl Signal {
    pub fn new(label: impl Into<String>, confidence: f64) -> Self {
        Self {
            label: label.into(),
            confidence,
        }
    }
}

/// The two learned pipelines owned by the model registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    FakeNewsClassifier,
    SentimentClassifier,
}

impl ModelKind {
    /// Fixed sample issued once after a successful load.
    pub fn warmup_text(&self) -> &'static str {
        match self {
            Self::FakeNewsClassifier => "Times Square verification warmup",
            Self::SentimentClassifier => "warming sentiment pipeline",
        }
    }
}

impl std::fmt::Display for ModelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FakeNewsClassifier => write!(f, "fake-news"),
            Self::SentimentClassifier => write!(f, "sentiment"),
        }
    }
}

/// Authenticity verdict of the fake-news signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Authenticity {
    Real,
    Fake,
    Unknown,
}

impl std::fmt::Display for Authenticity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Real => write!(f, "REAL"),
            Self::Fake => write!(f, "FAKE"),
            Self::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// Which strategy produced a fake-news verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelSource {
    Transformers,
    Heuristic,
    None,
}

impl std::fmt::Display for ModelSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transformers => write!(f, "transformers"),
            Self::Heuristic => write!(f, "heuristic"),
            Self::None => write!(f, "none"),
        }
    }
}

/// Canonical sentiment labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

impl std::fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Positive => write!(f, "Positive"),
            Self::Negative => write!(f, "Negative"),
            Self::Neutral => write!(f, "Neutral"),
        }
    }
}

/// Bucketed credibility score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CredibilityLevel {
    Low,
    Medium,
    High,
}

impl CredibilityLevel {
    pub fn from_score(score: f64) -> Self {
        if score >= 80.0 {
            Self::High
        } else if score >= 50.0 {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

impl std::fmt::Display for CredibilityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "Low"),
            Self::Medium => write!(f, "Medium"),
            Self::High => write!(f, "High"),
        }
    }
}

/// Round to two decimals for presentation.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
