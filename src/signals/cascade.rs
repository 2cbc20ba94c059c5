// =============================================================================
// Fallback Cascade — ordered strategies, first success wins
// =============================================================================
//
// Each tier returns `Result<T, SignalError>`. Tiers are tried in order; the
// infallible last resort runs only when every tier declined. Inference
// failures are logged at warn (a loaded model misbehaved), every other
// decline at debug.
// =============================================================================

use tracing::{debug, warn};

use crate::error::SignalError;

type Tier<'a, T> = (&'static str, Box<dyn FnOnce() -> Result<T, SignalError> + 'a>);

/// Ordered list of strategies producing one signal.
pub struct Cascade<'a, T> {
    signal: &'static str,
    tiers: Vec<Tier<'a, T>>,
}

impl<'a, T> Cascade<'a, T> {
    pub fn new(signal: &'static str) -> Self {
        Self {
            signal,
            tiers: Vec::new(),
        }
    }

    /// Append a strategy.
    pub fn tier<F>(mut self, name: &'static str, strategy: F) -> Self
    where
        F: FnOnce() -> Result<T, SignalError> + 'a,
    {
        self.tiers.push((name, Box::new(strategy)));
        self
    }

    /// Run tiers in order, falling back to `last_resort`.
    pub fn run<F>(self, last_resort: F) -> T
    where
        F: FnOnce() -> T,
    {
        for (name, strategy) in self.tiers {
            match strategy() {
                Ok(value) => return value,
                Err(e @ SignalError::InferenceFailure(_)) => {
                    warn!(signal = self.signal, tier = name, error = %e, "tier failed, falling back");
                }
                Err(e) => {
                    debug!(signal = self.signal, tier = name, reason = %e, "tier skipped");
                }
            }
        }
        last_resort()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ModelError;
    use crate::types::ModelKind;
    use std::cell::Cell;

    #[test]
    fn first_success_short_circuits() {
        let later_called = Cell::new(false);
        let out = Cascade::new("test")
            .tier("a", || Err(SignalError::ModelUnavailable(ModelKind::SentimentClassifier)))
            .tier("b", || Ok(2))
            .tier("c", || {
                later_called.set(true);
                Ok(3)
            })
            .run(|| 0);
        assert_eq!(out, 2);
        assert!(!later_called.get());
    }

    #[test]
    fn all_declined_uses_last_resort() {
        let out = Cascade::new("test")
            .tier("a", || Err(ModelError::Inference("boom".into()).into()))
            .tier("b", || Err(SignalError::LexiconUnavailable))
            .run(|| 42);
        assert_eq!(out, 42);
    }
}
