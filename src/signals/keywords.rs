// =============================================================================
// Keyword Classifiers — country and industry by substring matching
// =============================================================================
//
// Each category scores the number of its keywords occurring as substrings of
// the lowercased snippet. The strictly highest score wins; on a tie the
// category declared first keeps the lead.
// =============================================================================

use crate::signal_cache::{normalize_snippet, CacheStats, MemoCache};
use crate::types::Signal;

/// One named category and its keywords (lowercase).
#[derive(Debug, Clone, Copy)]
pub struct Category {
    pub name: &'static str,
    pub keywords: &'static [&'static str],
}

const fn category(name: &'static str, keywords: &'static [&'static str]) -> Category {
    Category { name, keywords }
}

pub const COUNTRY_TABLE: &[Category] = &[
    category(
        "India",
        &["india", "indian", "delhi", "mumbai", "bangalore", "modi", "bharat", "rupee", "rs.", "crore", "lakh"],
    ),
    category(
        "United States",
        &["usa", "america", "american", "washington", "new york", "dollar", "usd", "congress", "senate"],
    ),
    category(
        "United Kingdom",
        &["uk", "britain", "london", "pound", "gbp", "british", "parliament"],
    ),
    category("China", &["china", "chinese", "beijing", "yuan", "cny", "xi"]),
    category("Japan", &["japan", "japanese", "tokyo", "yen", "jpy"]),
    category("Germany", &["germany", "german", "berlin", "euro", "eur"]),
    category("France", &["france", "french", "paris", "euro"]),
    category("Australia", &["australia", "australian", "sydney", "melbourne", "aud"]),
    category("Canada", &["canada", "canadian", "toronto", "ottawa", "cad"]),
    category("Brazil", &["brazil", "brazilian", "sao paulo", "real", "brl"]),
];

pub const INDUSTRY_TABLE: &[Category] = &[
    category(
        "Technology",
        &["tech", "software", "ai", "machine learning", "digital", "internet", "app", "platform", "cyber", "data", "cloud"],
    ),
    category(
        "Finance",
        &["bank", "stock", "market", "investment", "crypto", "currency", "economy", "financial", "trading", "bitcoin"],
    ),
    category(
        "Politics",
        &["election", "government", "minister", "parliament", "policy", "political", "vote", "democracy", "party"],
    ),
    category(
        "Healthcare",
        &["health", "medical", "hospital", "doctor", "patient", "disease", "treatment", "vaccine", "medicine"],
    ),
    category(
        "Entertainment",
        &["movie", "celebrity", "actor", "film", "music", "show", "entertainment", "star", "hollywood"],
    ),
    category(
        "Sports",
        &["sport", "football", "cricket", "match", "player", "team", "championship", "tournament", "game"],
    ),
    category(
        "Media",
        &["news", "journalist", "media", "press", "broadcast", "report", "article", "publisher"],
    ),
    category(
        "Business",
        &["business", "company", "corporate", "industry", "enterprise", "startup", "market"],
    ),
    category(
        "Education",
        &["education", "school", "university", "student", "teacher", "academic", "learning"],
    ),
    category(
        "Science",
        &["science", "research", "scientist", "study", "discovery", "experiment", "laboratory"],
    ),
];

/// `min(ceiling, base + step × matches)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceCurve {
    pub base: f64,
    pub step: f64,
    pub ceiling: f64,
}

impl ConfidenceCurve {
    pub fn at(&self, matches: usize) -> f64 {
        (self.base + self.step * matches as f64).min(self.ceiling)
    }
}

pub const COUNTRY_CURVE: ConfidenceCurve = ConfidenceCurve {
    base: 0.60,
    step: 0.10,
    ceiling: 0.95,
};

pub const INDUSTRY_CURVE: ConfidenceCurve = ConfidenceCurve {
    base: 0.65,
    step: 0.05,
    ceiling: 0.95,
};

const NO_MATCH_CONFIDENCE: f64 = 0.50;

/// Best category for already-lowercased text, with its match count.
/// `None` when nothing matched.
pub fn best_category(table: &[Category], lowered: &str) -> Option<(&'static str, usize)> {
    let mut best: Option<(&'static str, usize)> = None;
    for cat in table {
        let score = cat.keywords.iter().filter(|kw| lowered.contains(*kw)).count();
        if score == 0 {
            continue;
        }
        if best.map_or(true, |(_, top)| score > top) {
            best = Some((cat.name, score));
        }
    }
    best
}

pub struct KeywordClassifier {
    table: &'static [Category],
    curve: ConfidenceCurve,
    fallback: &'static str,
    cache: MemoCache<String, Signal>,
    snippet_limit: usize,
}

impl KeywordClassifier {
    pub fn new(
        table: &'static [Category],
        curve: ConfidenceCurve,
        fallback: &'static str,
        snippet_limit: usize,
        cache_capacity: usize,
    ) -> Self {
        Self {
            table,
            curve,
            fallback,
            cache: MemoCache::new(cache_capacity),
            snippet_limit,
        }
    }

    pub fn country(snippet_limit: usize, cache_capacity: usize) -> Self {
        Self::new(COUNTRY_TABLE, COUNTRY_CURVE, "Unknown", snippet_limit, cache_capacity)
    }

    pub fn industry(snippet_limit: usize, cache_capacity: usize) -> Self {
        Self::new(INDUSTRY_TABLE, INDUSTRY_CURVE, "General", snippet_limit, cache_capacity)
    }

    pub fn classify(&self, text: &str) -> Signal {
        let key = normalize_snippet(text, self.snippet_limit).to_lowercase();
        self.cache.get_or_compute(key, |lowered| self.score(lowered))
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }

    fn score(&self, lowered: &str) -> Signal {
        match best_category(self.table, lowered) {
            Some((name, matches)) => Signal::new(name, self.curve.at(matches)),
            None => Signal::new(self.fallback, NO_MATCH_CONFIDENCE),
        }
    }
}
