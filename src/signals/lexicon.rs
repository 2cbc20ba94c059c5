// =============================================================================
// Polarity Lexicon — averaged word polarity with simple negation
// =============================================================================
//
// File format: one `word<TAB>polarity` pair per line, polarity in [-1, 1].
// Blank lines and lines starting with `#` are ignored.
//
// Text polarity is the mean over matched tokens. A token directly preceded
// by a negator contributes `-0.5 ×` its polarity. No matched tokens → 0.0.
// =============================================================================

use std::collections::HashMap;
use std::path::Path;

use anyhow::{bail, Context, Result};
use tracing::info;

const NEGATORS: [&str; 6] = ["not", "no", "never", "nothing", "neither", "nor"];
const NEGATION_FACTOR: f64 = -0.5;

#[derive(Debug, Clone, Default)]
pub struct PolarityLexicon {
    words: HashMap<String, f64>,
}

impl PolarityLexicon {
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        Self {
            words: entries
                .into_iter()
                .map(|(w, p)| (w.into().to_lowercase(), p.clamp(-1.0, 1.0)))
                .collect(),
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read lexicon {}", path.display()))?;
        let lexicon =
            Self::parse(&raw).with_context(|| format!("Failed to parse lexicon {}", path.display()))?;
        info!(path = %path.display(), words = lexicon.len(), "polarity lexicon loaded");
        Ok(lexicon)
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let mut words = HashMap::new();
        for (lineno, line) in raw.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((word, polarity)) = line.split_once('\t') else {
                bail!("line {}: expected word<TAB>polarity", lineno + 1);
            };
            let polarity: f64 = polarity
                .trim()
                .parse()
                .with_context(|| format!("line {}: bad polarity {:?}", lineno + 1, polarity))?;
            words.insert(word.trim().to_lowercase(), polarity.clamp(-1.0, 1.0));
        }
        if words.is_empty() {
            bail!("lexicon has no entries");
        }
        Ok(Self { words })
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Mean polarity of `text` in `[-1, 1]`.
    pub fn polarity(&self, text: &str) -> f64 {
        let lowered = text.to_lowercase();
        let tokens: Vec<&str> = lowered
            .split(|c: char| !(c.is_alphanumeric() || c == '\''))
            .filter(|t| !t.is_empty())
            .collect();

        let mut total = 0.0;
        let mut matched = 0usize;
        for (i, token) in tokens.iter().enumerate() {
            let Some(&p) = self.words.get(*token) else {
                continue;
            };
            let negated = i > 0 && is_negator(tokens[i - 1]);
            total += if negated { p * NEGATION_FACTOR } else { p };
            matched += 1;
        }

        if matched == 0 {
            0.0
        } else {
            (total / matched as f64).clamp(-1.0, 1.0)
        }
    }
}

fn is_negator(token: &str) -> bool {
    NEGATORS.contains(&token) || token.ends_with("n't")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lexicon() -> PolarityLexicon {
        PolarityLexicon::from_entries([("good", 0.7), ("terrible", -1.0), ("fine", 0.4)])
    }

    #[test]
    fn averages_matched_tokens() {
        let p = lexicon().polarity("Good news, terrible timing");
        assert!((p - (-0.15)).abs() < 1e-9);
    }

    #[test]
    fn negation_flips_and_dampens() {
        let p = lexicon().polarity("this is not good");
        assert!((p - (-0.35)).abs() < 1e-9);
        let p = lexicon().polarity("it isn't fine");
        assert!((p - (-0.2)).abs() < 1e-9);
    }

    #[test]
    fn no_matches_is_zero() {
        assert_eq!(lexicon().polarity("quarterly report filed"), 0.0);
        assert_eq!(lexicon().polarity(""), 0.0);
    }

    #[test]
    fn parse_skips_comments_and_rejects_garbage() {
        let lex = PolarityLexicon::parse("# header\n\ngood\t0.7\nbad\t-0.7\n").unwrap();
        assert_eq!(lex.len(), 2);

        assert!(PolarityLexicon::parse("good 0.7\n").is_err());
        assert!(PolarityLexicon::parse("good\tmaybe\n").is_err());
        assert!(PolarityLexicon::parse("# only comments\n").is_err());
    }

    #[test]
    fn bundled_lexicon_parses() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("assets/polarity_lexicon.tsv");
        let lex = PolarityLexicon::load(path).unwrap();
        assert!(lex.polarity("an excellent result") > 0.1);
        assert!(lex.polarity("a terrible failure") < -0.1);
    }
}
