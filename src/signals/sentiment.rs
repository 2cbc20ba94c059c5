// =============================================================================
// Sentiment Signal — learned → lexicon → keyword cascade
// =============================================================================

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::SignalError;
use crate::models::ModelRegistry;
use crate::signal_cache::truncate_chars;
use crate::signals::cascade::Cascade;
use crate::signals::lexicon::PolarityLexicon;
use crate::types::{ModelKind, SentimentLabel};

pub const POSITIVE_WORDS: [&str; 8] = [
    "good", "great", "excellent", "amazing", "wonderful", "success", "win", "victory",
];

pub const NEGATIVE_WORDS: [&str; 8] = [
    "bad", "terrible", "awful", "failure", "lose", "defeat", "crisis", "problem",
];

/// Polarity magnitude above which the lexicon tier commits to a direction.
const POLARITY_THRESHOLD: f64 = 0.1;

/// Sentiment label with a score in `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentimentReading {
    pub label: SentimentLabel,
    pub score: f64,
}

impl SentimentReading {
    pub fn new(label: SentimentLabel, score: f64) -> Self {
        Self { label, score }
    }

    pub fn neutral() -> Self {
        Self::new(SentimentLabel::Neutral, 50.0)
    }
}

/// Map a learned-pipeline label onto the canonical set. Three-class
/// `LABEL_n` checkpoints order classes negative, neutral, positive.
pub fn map_model_label(label: &str) -> Option<SentimentLabel> {
    match label.to_ascii_uppercase().as_str() {
        "POSITIVE" | "LABEL_2" => Some(SentimentLabel::Positive),
        "NEGATIVE" | "LABEL_0" => Some(SentimentLabel::Negative),
        "NEUTRAL" | "LABEL_1" => Some(SentimentLabel::Neutral),
        _ => None,
    }
}

/// Bucket a polarity in `[-1, 1]`.
pub fn reading_from_polarity(polarity: f64) -> SentimentReading {
    if polarity > POLARITY_THRESHOLD {
        SentimentReading::new(SentimentLabel::Positive, (polarity + 1.0) * 50.0)
    } else if polarity < -POLARITY_THRESHOLD {
        SentimentReading::new(SentimentLabel::Negative, (polarity.abs() + 1.0) * 50.0)
    } else {
        SentimentReading::neutral()
    }
}

/// Count keyword hits on each side; the larger side scores `60 + 5 × count`.
pub fn keyword_sentiment(text: &str) -> SentimentReading {
    let lowered = text.to_lowercase();
    let count = |words: &[&str]| words.iter().filter(|w| lowered.contains(*w)).count();
    let positive = count(&POSITIVE_WORDS);
    let negative = count(&NEGATIVE_WORDS);

    if positive > negative {
        SentimentReading::new(SentimentLabel::Positive, 60.0 + 5.0 * positive as f64)
    } else if negative > positive {
        SentimentReading::new(SentimentLabel::Negative, 60.0 + 5.0 * negative as f64)
    } else {
        SentimentReading::neutral()
    }
}

pub struct SentimentAnalyzer {
    registry: Arc<ModelRegistry>,
    lexicon: Option<Arc<PolarityLexicon>>,
    input_limit: usize,
}

impl SentimentAnalyzer {
    pub fn new(
        registry: Arc<ModelRegistry>,
        lexicon: Option<Arc<PolarityLexicon>>,
        input_limit: usize,
    ) -> Self {
        Self {
            registry,
            lexicon,
            input_limit,
        }
    }

    pub fn has_lexicon(&self) -> bool {
        self.lexicon.is_some()
    }

    pub fn analyze(&self, text: &str) -> SentimentReading {
        Cascade::new("sentiment")
            .tier("transformers", || self.learned(text))
            .tier("lexicon", || self.lexical(text))
            .run(|| keyword_sentiment(text))
    }

    fn learned(&self, text: &str) -> Result<SentimentReading, SignalError> {
        let classifier = self.registry.get(ModelKind::SentimentClassifier)?;
        let prediction = classifier.classify(truncate_chars(text, self.input_limit))?;
        let label = map_model_label(&prediction.label)
            .ok_or_else(|| SignalError::UnmappedLabel(prediction.label.clone()))?;
        Ok(SentimentReading::new(label, prediction.score * 100.0))
    }

    fn lexical(&self, text: &str) -> Result<SentimentReading, SignalError> {
        let lexicon = self.lexicon.as_ref().ok_or(SignalError::LexiconUnavailable)?;
        Ok(reading_from_polarity(lexicon.polarity(text)))
    }
}
