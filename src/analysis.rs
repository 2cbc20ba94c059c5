// =============================================================================
// Analyzer — the analysis contracts and the comprehensive report
// =============================================================================
//
// Owns every signal producer and the memo caches behind them. All methods
// are synchronous and never fail past `build_comprehensive_result`, whose
// only error is blank input. The HTTP layer calls in from the blocking pool.
// =============================================================================

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use regex::Regex;
use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::capabilities::Capabilities;
use crate::error::AnalysisError;
use crate::models::ModelRegistry;
use crate::runtime_config::ServiceConfig;
use crate::signal_cache::CacheStats;
use crate::signals::credibility::{self, CredibilityAssessment};
use crate::signals::language::LanguageIdentifier;
use crate::signals::{
    library_identifier, FakeNewsDetector, FakeNewsVerdict, KeywordClassifier, LanguageDetector,
    PolarityLexicon, SentimentAnalyzer, SentimentReading,
};
use crate::types::{round2, SentimentLabel, Signal};

// =============================================================================
// Result types
// =============================================================================

/// A detected label with its confidence in percent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectedLabel {
    pub detected: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndustryCategory {
    pub category: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TextMetrics {
    pub word_count: usize,
    pub character_count: usize,
    pub has_url: bool,
    pub has_numbers: bool,
    pub has_caps: bool,
}

/// The combined report for one article.
#[derive(Debug, Clone, Serialize)]
pub struct CredibilityResult {
    pub id: String,
    pub authenticity: FakeNewsVerdict,
    pub language: DetectedLabel,
    pub country: DetectedLabel,
    pub industry: IndustryCategory,
    pub sentiment: SentimentReading,
    pub credibility: CredibilityAssessment,
    pub metrics: TextMetrics,
    pub risk_indicators: Vec<String>,
    pub timestamp: String,
}

/// Memo cache counters for the health endpoint.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CacheReport {
    pub language: CacheStats,
    pub country: CacheStats,
    pub industry: CacheStats,
}

// =============================================================================
// Metric patterns
// =============================================================================

struct MetricPatterns {
    digit: Regex,
    caps_run: Regex,
    link: Regex,
}

impl MetricPatterns {
    fn compile() -> Result<Self, regex::Error> {
        Ok(Self {
            digit: Regex::new(r"\d")?,
            caps_run: Regex::new(r"[A-Z]{3,}")?,
            link: Regex::new(r"https?://\S+")?,
        })
    }

    fn measure(&self, text: &str, url: Option<&str>) -> TextMetrics {
        let url_given = url.is_some_and(|u| !u.trim().is_empty());
        TextMetrics {
            word_count: text.split_whitespace().count(),
            character_count: text.chars().count(),
            has_url: url_given || self.link.is_match(text),
            has_numbers: self.digit.is_match(text),
            has_caps: self.caps_run.is_match(text),
        }
    }
}

/// Fixed-order risk rules over the computed signals.
pub fn risk_indicators(
    text: &str,
    fake_probability: f64,
    sentiment: SentimentLabel,
    has_caps: bool,
) -> Vec<String> {
    let lowered = text.to_lowercase();
    let rules = [
        (fake_probability > 70.0, "High fake news probability"),
        (
            sentiment == SentimentLabel::Negative && fake_probability > 60.0,
            "Negative sentiment with suspicious content",
        ),
        (
            lowered.contains("unverified") || lowered.contains("rumor"),
            "Contains unverified claims",
        ),
        (has_caps && fake_probability > 50.0, "Excessive capitalization"),
    ];

    rules
        .into_iter()
        .filter(|(fired, _)| *fired)
        .map(|(_, label)| label.to_string())
        .collect()
}

// =============================================================================
// Analyzer
// =============================================================================

pub struct Analyzer {
    registry: Arc<ModelRegistry>,
    fake_news: FakeNewsDetector,
    sentiment: SentimentAnalyzer,
    language: LanguageDetector,
    country: KeywordClassifier,
    industry: KeywordClassifier,
    patterns: MetricPatterns,
}

impl Analyzer {
    /// Wire every producer according to the probed capabilities.
    pub fn new(
        config: &ServiceConfig,
        capabilities: &Capabilities,
        registry: Arc<ModelRegistry>,
    ) -> Result<Self> {
        let lexicon = if capabilities.has_lexicon {
            config.lexicon_path.as_ref().and_then(|path| {
                PolarityLexicon::load(path)
                    .map_err(|e| warn!(error = %format!("{e:#}"), "lexicon unusable, keyword sentiment only"))
                    .ok()
                    .map(Arc::new)
            })
        } else {
            None
        };

        Self::from_parts(
            config,
            registry,
            lexicon,
            library_identifier(capabilities.has_language_library),
        )
    }

    pub fn from_parts(
        config: &ServiceConfig,
        registry: Arc<ModelRegistry>,
        lexicon: Option<Arc<PolarityLexicon>>,
        identifier: Option<Box<dyn LanguageIdentifier>>,
    ) -> Result<Self> {
        let patterns = MetricPatterns::compile().context("Failed to compile metric patterns")?;
        let limit = config.snippet_limit;
        let capacity = config.cache_capacity;

        Ok(Self {
            fake_news: FakeNewsDetector::new(registry.clone(), config.model_input_limit),
            sentiment: SentimentAnalyzer::new(registry.clone(), lexicon, config.model_input_limit),
            language: LanguageDetector::new(identifier, limit, capacity),
            country: KeywordClassifier::country(limit, capacity),
            industry: KeywordClassifier::industry(limit, capacity),
            registry,
            patterns,
        })
    }

    pub fn registry(&self) -> &Arc<ModelRegistry> {
        &self.registry
    }

    pub fn has_lexicon(&self) -> bool {
        self.sentiment.has_lexicon()
    }

    // ── Contracts ───────────────────────────────────────────────────────

    pub fn run_fake_news_detection(&self, text: &str) -> FakeNewsVerdict {
        self.fake_news.classify(text)
    }

    pub fn analyze_sentiment(&self, text: &str) -> SentimentReading {
        self.sentiment.analyze(text)
    }

    pub fn detect_language(&self, text: &str) -> Signal {
        self.language.detect(text)
    }

    pub fn detect_country(&self, text: &str) -> Signal {
        self.country.classify(text)
    }

    pub fn classify_industry(&self, text: &str) -> Signal {
        self.industry.classify(text)
    }

    pub fn calculate_credibility_score(
        &self,
        fake_probability: f64,
        sentiment: SentimentLabel,
        industry: &str,
    ) -> f64 {
        credibility::credibility_score(fake_probability, sentiment, industry)
    }

    /// Run every signal against `text` and assemble the report.
    pub fn build_comprehensive_result(
        &self,
        text: &str,
        url: Option<&str>,
    ) -> Result<CredibilityResult, AnalysisError> {
        if text.trim().is_empty() {
            return Err(AnalysisError::EmptyInput);
        }

        let verdict = self.run_fake_news_detection(text);
        let language = self.detect_language(text);
        let country = self.detect_country(text);
        let industry = self.classify_industry(text);
        let sentiment = self.analyze_sentiment(text);

        let fp = verdict.fake_probability;
        let score = self.calculate_credibility_score(fp, sentiment.label, &industry.label);
        let metrics = self.patterns.measure(text, url);
        let risks = risk_indicators(text, fp, sentiment.label, metrics.has_caps);

        debug!(
            result = %verdict.result,
            model = %verdict.model,
            fake_probability = fp,
            credibility = score,
            risks = risks.len(),
            "comprehensive analysis complete"
        );

        Ok(CredibilityResult {
            id: Uuid::new_v4().to_string(),
            authenticity: FakeNewsVerdict {
                confidence: round2(verdict.confidence),
                fake_probability: round2(verdict.fake_probability),
                ..verdict
            },
            language: DetectedLabel {
                detected: language.label,
                confidence: round2(language.confidence * 100.0),
            },
            country: DetectedLabel {
                detected: country.label,
                confidence: round2(country.confidence * 100.0),
            },
            industry: IndustryCategory {
                category: industry.label,
                confidence: round2(industry.confidence * 100.0),
            },
            sentiment: SentimentReading::new(sentiment.label, round2(sentiment.score)),
            credibility: CredibilityAssessment::from_score(round2(score)),
            metrics,
            risk_indicators: risks,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        })
    }

    pub fn cache_report(&self) -> CacheReport {
        CacheReport {
            language: self.language.stats(),
            country: self.country.stats(),
            industry: self.industry.stats(),
        }
    }
}
