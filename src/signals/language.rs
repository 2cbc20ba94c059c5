// =============================================================================
// Language Signal — detection library or script-range heuristic
// =============================================================================
//
// With a detection library the result is the mapped language name at a fixed
// 0.90 confidence; a library failure yields ("Unknown", 0.50). Without one,
// the Unicode script of the text decides. Results are memoised by the
// normalised snippet.
// =============================================================================

use crate::error::SignalError;
use crate::signal_cache::{normalize_snippet, CacheStats, MemoCache};
use crate::types::Signal;

const LIBRARY_CONFIDENCE: f64 = 0.90;
const SCRIPT_CONFIDENCE: f64 = 0.85;
const DEFAULT_CONFIDENCE: f64 = 0.70;
const UNKNOWN_CONFIDENCE: f64 = 0.50;

const LANGUAGE_NAMES: [(&str, &str); 12] = [
    ("en", "English"),
    ("hi", "Hindi"),
    ("es", "Spanish"),
    ("fr", "French"),
    ("de", "German"),
    ("it", "Italian"),
    ("pt", "Portuguese"),
    ("ru", "Russian"),
    ("zh", "Chinese"),
    ("ja", "Japanese"),
    ("ko", "Korean"),
    ("ar", "Arabic"),
];

/// Returns a language code for non-empty text.
pub trait LanguageIdentifier: Send + Sync {
    fn identify(&self, text: &str) -> Result<String, SignalError>;
}

#[cfg(feature = "langdetect")]
pub struct WhatlangIdentifier;

#[cfg(feature = "langdetect")]
impl LanguageIdentifier for WhatlangIdentifier {
    fn identify(&self, text: &str) -> Result<String, SignalError> {
        let info = whatlang::detect(text)
            .ok_or_else(|| SignalError::DetectionFailed("no language features".into()))?;
        Ok(iso639_1(info.lang()).to_string())
    }
}

/// Two-letter code for `lang`. Languages without one keep whatlang's
/// three-letter code.
#[cfg(feature = "langdetect")]
fn iso639_1(lang: whatlang::Lang) -> &'static str {
    use whatlang::Lang;

    match lang {
        Lang::Eng => "en",
        Lang::Hin => "hi",
        Lang::Spa => "es",
        Lang::Fra => "fr",
        Lang::Deu => "de",
        Lang::Ita => "it",
        Lang::Por => "pt",
        Lang::Rus => "ru",
        Lang::Cmn => "zh",
        Lang::Jpn => "ja",
        Lang::Kor => "ko",
        Lang::Ara => "ar",
        Lang::Nld => "nl",
        Lang::Tur => "tr",
        Lang::Pol => "pl",
        Lang::Ukr => "uk",
        Lang::Swe => "sv",
        Lang::Dan => "da",
        Lang::Nob => "no",
        Lang::Fin => "fi",
        Lang::Ces => "cs",
        Lang::Slk => "sk",
        Lang::Slv => "sl",
        Lang::Hun => "hu",
        Lang::Ron => "ro",
        Lang::Bul => "bg",
        Lang::Hrv => "hr",
        Lang::Srp => "sr",
        Lang::Ell => "el",
        Lang::Heb => "he",
        Lang::Pes => "fa",
        Lang::Urd => "ur",
        Lang::Ben => "bn",
        Lang::Tam => "ta",
        Lang::Tel => "te",
        Lang::Mar => "mr",
        Lang::Guj => "gu",
        Lang::Kan => "kn",
        Lang::Mal => "ml",
        Lang::Pan => "pa",
        Lang::Nep => "ne",
        Lang::Tha => "th",
        Lang::Vie => "vi",
        Lang::Ind => "id",
        Lang::Lit => "lt",
        Lang::Lav => "lv",
        Lang::Est => "et",
        Lang::Kat => "ka",
        Lang::Cat => "ca",
        Lang::Afr => "af",
        Lang::Lat => "la",
        Lang::Epo => "eo",
        other => other.code(),
    }
}

/// The identifier compiled into this build, if the probe reported one.
#[cfg(feature = "langdetect")]
pub fn library_identifier(available: bool) -> Option<Box<dyn LanguageIdentifier>> {
    available.then(|| Box::new(WhatlangIdentifier) as Box<dyn LanguageIdentifier>)
}

/// The identifier compiled into this build, if the probe reported one.
#[cfg(not(feature = "langdetect"))]
pub fn library_identifier(_available: bool) -> Option<Box<dyn LanguageIdentifier>> {
    None
}

/// Display name for a language code. Unlisted codes are title-cased.
pub fn language_name(code: &str) -> String {
    LANGUAGE_NAMES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| name.to_string())
        .unwrap_or_else(|| title_case(code))
}

fn title_case(code: &str) -> String {
    let mut out = String::with_capacity(code.len());
    let mut at_word_start = true;
    for c in code.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }
    out
}

/// Devanagari → Hindi, CJK Unified Ideographs → Chinese, else English.
pub fn script_heuristic(text: &str) -> Signal {
    if text.chars().any(|c| ('\u{0900}'..='\u{097F}').contains(&c)) {
        Signal::new("Hindi", SCRIPT_CONFIDENCE)
    } else if text.chars().any(|c| ('\u{4E00}'..='\u{9FFF}').contains(&c)) {
        Signal::new("Chinese", SCRIPT_CONFIDENCE)
    } else {
        Signal::new("English", DEFAULT_CONFIDENCE)
    }
}

fn unknown() -> Signal {
    Signal::new("Unknown", UNKNOWN_CONFIDENCE)
}

pub struct LanguageDetector {
    identifier: Option<Box<dyn LanguageIdentifier>>,
    cache: MemoCache<String, Signal>,
    snippet_limit: usize,
}

impl LanguageDetector {
    pub fn new(
        identifier: Option<Box<dyn LanguageIdentifier>>,
        snippet_limit: usize,
        cache_capacity: usize,
    ) -> Self {
        Self {
            identifier,
            cache: MemoCache::new(cache_capacity),
            snippet_limit,
        }
    }

    pub fn detect(&self, text: &str) -> Signal {
        let key = normalize_snippet(text, self.snippet_limit);
        self.cache.get_or_compute(key, |snippet| self.compute(snippet))
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }

    fn compute(&self, snippet: &str) -> Signal {
        if snippet.is_empty() {
            return unknown();
        }
        match &self.identifier {
            Some(identifier) => match identifier.identify(snippet) {
                Ok(code) => Signal::new(language_name(&code), LIBRARY_CONFIDENCE),
                Err(e) => {
                    tracing::debug!(error = %e, "language detection failed");
                    unknown()
                }
            },
            None => script_heuristic(snippet),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct FixedIdentifier {
        answer: Option<&'static str>,
        calls: Arc<AtomicUsize>,
    }

    impl LanguageIdentifier for FixedIdentifier {
        fn identify(&self, _text: &str) -> Result<String, SignalError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.answer
                .map(str::to_string)
                .ok_or_else(|| SignalError::DetectionFailed("ambiguous".into()))
        }
    }

    fn with_answer(answer: Option<&'static str>) -> (LanguageDetector, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let identifier = FixedIdentifier {
            answer,
            calls: calls.clone(),
        };
        (LanguageDetector::new(Some(Box::new(identifier)), 2000, 16), calls)
    }

    #[test]
    fn library_code_maps_to_name() {
        let (d, _) = with_answer(Some("fr"));
        assert_eq!(d.detect("Bonjour tout le monde"), Signal::new("French", 0.90));
    }

    #[test]
    fn unlisted_codes_are_title_cased() {
        assert_eq!(language_name("nl"), "Nl");
        assert_eq!(language_name("zh-cn"), "Zh-Cn");
        assert_eq!(language_name("ko"), "Korean");
    }

    #[test]
    fn library_failure_is_unknown() {
        let (d, _) = with_answer(None);
        assert_eq!(d.detect("12345 !!!"), Signal::new("Unknown", 0.50));
    }

    #[test]
    fn empty_input_is_unknown() {
        let (d, calls) = with_answer(Some("en"));
        assert_eq!(d.detect("   "), Signal::new("Unknown", 0.50));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn script_heuristic_without_library() {
        let d = LanguageDetector::new(None, 2000, 16);
        assert_eq!(d.detect("नमस्ते दुनिया"), Signal::new("Hindi", 0.85));
        assert_eq!(d.detect("你好世界"), Signal::new("Chinese", 0.85));
        assert_eq!(d.detect("Hello world"), Signal::new("English", 0.70));
    }

    #[test]
    fn repeated_input_hits_cache() {
        let (d, calls) = with_answer(Some("de"));
        let first = d.detect("Guten Tag");
        let second = d.detect("  Guten Tag  ");
        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(d.stats().hits, 1);
    }

    #[cfg(feature = "langdetect")]
    #[test]
    fn whatlang_detects_english_prose() {
        let d = LanguageDetector::new(library_identifier(true), 2000, 16);
        let s = d.detect("The committee published its annual report on public transport yesterday.");
        assert_eq!(s.label, "English");
        assert_eq!(s.confidence, 0.90);
    }

    #[cfg(feature = "langdetect")]
    #[test]
    fn unlisted_languages_use_two_letter_codes() {
        use whatlang::Lang;

        assert_eq!(iso639_1(Lang::Nld), "nl");
        assert_eq!(iso639_1(Lang::Tur), "tr");
        assert_eq!(language_name(iso639_1(Lang::Nld)), "Nl");
        assert_eq!(language_name(iso639_1(Lang::Tur)), "Tr");
        assert_eq!(language_name(iso639_1(Lang::Rus)), "Russian");
    }
}
