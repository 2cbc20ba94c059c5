// =============================================================================
// Signals Module
// =============================================================================
//
// Independent signal producers feeding the credibility report:
// - Fake-news verdict (learned classifier, keyword heuristic)
// - Sentiment (learned classifier, polarity lexicon, keyword counts)
// - Language (detection library or Unicode script ranges)
// - Country / industry keyword classifiers
// - Credibility aggregation over the above

pub mod cascade;
pub mod credibility;
pub mod fake_news;
pub mod keywords;
pub mod language;
pub mod lexicon;
pub mod sentiment;

pub use fake_news::{FakeNewsDetector, FakeNewsVerdict};
pub use keywords::KeywordClassifier;
pub use language::{library_identifier, LanguageDetector};
pub use lexicon::PolarityLexicon;
pub use sentiment::{SentimentAnalyzer, SentimentReading};
