// =============================================================================
// Fake-News Signal — learned classifier with clickbait-keyword fallback
// =============================================================================

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::SignalError;
use crate::models::{ModelRegistry, Prediction};
use crate::signal_cache::truncate_chars;
use crate::signals::cascade::Cascade;
use crate::types::{Authenticity, ModelKind, ModelSource};

/// Suspicion markers scanned by the heuristic (case-insensitive substring).
pub const SUSPICION_KEYWORDS: [&str; 14] = [
    "clickbait",
    "shocking",
    "exclusive",
    "you won't believe",
    "urgent",
    "breaking",
    "conspiracy",
    "fake",
    "hoax",
    "misleading",
    "unverified",
    "rumor",
    "alleged",
    "supposedly",
];

/// Heuristic verdict flips to FAKE at this probability.
const HEURISTIC_FAKE_THRESHOLD: f64 = 60.0;

/// Outcome of the fake-news signal.
///
/// `confidence + fake_probability == 100` holds for every verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FakeNewsVerdict {
    pub result: Authenticity,
    pub confidence: f64,
    pub fake_probability: f64,
    pub model: ModelSource,
}

impl FakeNewsVerdict {
    fn new(result: Authenticity, fake_probability: f64, model: ModelSource) -> Self {
        Self {
            result,
            confidence: 100.0 - fake_probability,
            fake_probability,
            model,
        }
    }

    /// Verdict for blank input. Deliberately not `100 - 50`: blank text
    /// carries no confidence at all.
    pub fn unknown() -> Self {
        Self {
            result: Authenticity::Unknown,
            confidence: 0.0,
            fake_probability: 50.0,
            model: ModelSource::None,
        }
    }
}

/// Interpret a learned prediction: a negative or fake-flagged label means the
/// score is the fake probability, anything else means it is the real one.
pub fn interpret_prediction(prediction: &Prediction) -> FakeNewsVerdict {
    let label = prediction.label.to_uppercase();
    let score = prediction.score.clamp(0.0, 1.0) * 100.0;

    if label.contains("NEGATIVE") || label.contains("FAKE") {
        FakeNewsVerdict::new(Authenticity::Fake, score, ModelSource::Transformers)
    } else {
        FakeNewsVerdict::new(Authenticity::Real, 100.0 - score, ModelSource::Transformers)
    }
}

/// `min(99, 50 + 5 * matches)`, FAKE at 60 and above.
pub fn keyword_heuristic(text: &str) -> FakeNewsVerdict {
    let lowered = text.to_lowercase();
    let matches = SUSPICION_KEYWORDS
        .iter()
        .filter(|kw| lowered.contains(*kw))
        .count();

    let fake_probability = (50.0 + 5.0 * matches as f64).min(99.0);
    let result = if fake_probability >= HEURISTIC_FAKE_THRESHOLD {
        Authenticity::Fake
    } else {
        Authenticity::Real
    };
    FakeNewsVerdict::new(result, fake_probability, ModelSource::Heuristic)
}

/// Produces the fake-news signal.
pub struct FakeNewsDetector {
    registry: Arc<ModelRegistry>,
    input_limit: usize,
}

impl FakeNewsDetector {
    pub fn new(registry: Arc<ModelRegistry>, input_limit: usize) -> Self {
        Self {
            registry,
            input_limit,
        }
    }

    pub fn classify(&self, text: &str) -> FakeNewsVerdict {
        let cleaned = text.trim();
        if cleaned.is_empty() {
            return FakeNewsVerdict::unknown();
        }

        let snippet = truncate_chars(cleaned, self.input_limit);

        Cascade::new("fake_news")
            .tier("transformers", || self.learned(snippet))
            .run(|| keyword_heuristic(cleaned))
    }

    fn learned(&self, snippet: &str) -> Result<FakeNewsVerdict, SignalError> {
        let classifier = self.registry.get(ModelKind::FakeNewsClassifier)?;
        let prediction = classifier.classify(snippet)?;
        Ok(interpret_prediction(&prediction))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::testing::{broken_registry, ready_registry, unavailable_registry};

    fn detector(registry: Arc<ModelRegistry>) -> FakeNewsDetector {
        FakeNewsDetector::new(registry, 512)
    }

    #[test]
    fn blank_input_is_unknown_without_touching_models() {
        let registry = ready_registry("NEGATIVE", 0.99);
        let d = detector(registry.clone());
        for text in ["", "   ", "\n\t "] {
            assert_eq!(d.classify(text), FakeNewsVerdict::unknown());
        }
        assert_eq!(
            registry.status(ModelKind::FakeNewsClassifier),
            crate::models::ModelStatus::Uninitialized
        );
    }

    #[test]
    fn unknown_verdict_exact_values() {
        let v = FakeNewsVerdict::unknown();
        assert_eq!(v.result, Authenticity::Unknown);
        assert_eq!(v.confidence, 0.0);
        assert_eq!(v.fake_probability, 50.0);
        assert_eq!(v.model, ModelSource::None);
    }

    #[test]
    fn heuristic_counts_four_markers() {
        let d = detector(unavailable_registry());
        let v = d.classify("breaking exclusive shocking rumor");
        assert_eq!(v.fake_probability, 70.0);
        assert_eq!(v.result, Authenticity::Fake);
        assert_eq!(v.model, ModelSource::Heuristic);
        assert_eq!(v.confidence, 30.0);
    }

    #[test]
    fn heuristic_threshold_and_ceiling() {
        let one = keyword_heuristic("an alleged event");
        assert_eq!(one.fake_probability, 55.0);
        assert_eq!(one.result, Authenticity::Real);

        let two = keyword_heuristic("URGENT: Alleged leak");
        assert_eq!(two.fake_probability, 60.0);
        assert_eq!(two.result, Authenticity::Fake);

        let all = keyword_heuristic(&SUSPICION_KEYWORDS.join(" "));
        assert_eq!(all.fake_probability, 99.0);
    }

    #[test]
    fn learned_negative_label_is_fake() {
        let d = detector(ready_registry("NEGATIVE", 0.8));
        let v = d.classify("Some article text");
        assert_eq!(v.result, Authenticity::Fake);
        assert!((v.fake_probability - 80.0).abs() < 1e-9);
        assert_eq!(v.model, ModelSource::Transformers);
    }

    #[test]
    fn learned_other_label_is_real() {
        let d = detector(ready_registry("POSITIVE", 0.9));
        let v = d.classify("Some article text");
        assert_eq!(v.result, Authenticity::Real);
        assert!((v.fake_probability - 10.0).abs() < 1e-9);
    }

    #[test]
    fn inference_failure_falls_back_and_handle_stays_ready() {
        let registry = broken_registry();
        let d = detector(registry.clone());
        let v = d.classify("shocking hoax");
        assert_eq!(v.model, ModelSource::Heuristic);
        assert_eq!(v.fake_probability, 60.0);
        assert!(registry.is_ready(ModelKind::FakeNewsClassifier));
    }

    #[test]
    fn confidence_complements_probability() {
        let cases: Vec<FakeNewsVerdict> = vec![
            detector(unavailable_registry()).classify("plain report"),
            detector(ready_registry("FAKE", 0.37)).classify("x"),
            detector(ready_registry("LABEL_1", 0.61)).classify("x"),
            keyword_heuristic(&SUSPICION_KEYWORDS.join(" ")),
        ];
        for v in cases {
            assert!((v.confidence + v.fake_probability - 100.0).abs() < 1e-9);
        }
    }
}
