// =============================================================================
// Models Module
// =============================================================================
//
// Learned text-classification pipelines:
// - Classifier / loader traits and the disabled fallback loader
// - Process-wide registry with lazy, at-most-once construction per kind
// - ONNX Runtime backend (behind the `onnx` feature)

pub mod classifier;
#[cfg(feature = "onnx")]
pub mod onnx;
pub mod registry;

pub use classifier::{default_loader, Prediction};
pub use registry::{ModelRegistry, ModelStatus};

#[cfg(test)]
pub mod testing {
    //! Scripted pipelines for exercising registry and signal fallbacks.

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use parking_lot::Mutex;

    use super::classifier::{ModelLoader, Prediction, TextClassifier};
    use super::ModelRegistry;
    use crate::capabilities::{Capabilities, Device};
    use crate::error::ModelError;
    use crate::types::ModelKind;

    pub fn enabled_caps() -> Capabilities {
        Capabilities {
            has_learned_classifier: true,
            ..Capabilities::none()
        }
    }

    /// Registry whose every kind answers with `label`/`score`.
    pub fn ready_registry(label: &str, score: f64) -> Arc<ModelRegistry> {
        Arc::new(ModelRegistry::new(
            Arc::new(ScriptedLoader::ready(label, score)),
            &enabled_caps(),
        ))
    }

    /// Registry whose models load but fail every inference call.
    pub fn broken_registry() -> Arc<ModelRegistry> {
        Arc::new(ModelRegistry::new(
            Arc::new(ScriptedLoader::with_classifier(|| {
                ScriptedClassifier::failing("cuda out of memory")
            })),
            &enabled_caps(),
        ))
    }

    /// Registry with no learned pipelines at all.
    pub fn unavailable_registry() -> Arc<ModelRegistry> {
        Arc::new(ModelRegistry::new(
            Arc::new(super::classifier::DisabledLoader),
            &Capabilities::none(),
        ))
    }

    pub struct ScriptedClassifier {
        outcome: Result<Prediction, String>,
        log: Option<Arc<Mutex<Vec<String>>>>,
    }

    impl ScriptedClassifier {
        pub fn ready(label: &str, score: f64) -> Self {
            Self {
                outcome: Ok(Prediction::new(label, score)),
                log: None,
            }
        }

        pub fn failing(message: &str) -> Self {
            Self {
                outcome: Err(message.to_string()),
                log: None,
            }
        }
    }

    impl TextClassifier for ScriptedClassifier {
        fn classify(&self, text: &str) -> Result<Prediction, ModelError> {
            if let Some(log) = &self.log {
                log.lock().push(text.to_string());
            }
            self.outcome.clone().map_err(ModelError::Inference)
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    type Factory = Box<dyn Fn() -> ScriptedClassifier + Send + Sync>;

    pub struct ScriptedLoader {
        factory: Option<Factory>,
        delay: Duration,
        loads: AtomicUsize,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl ScriptedLoader {
        pub fn ready(label: &str, score: f64) -> Self {
            let label = label.to_string();
            Self::with_classifier(move || ScriptedClassifier::ready(&label, score))
        }

        pub fn failing() -> Self {
            Self {
                factory: None,
                delay: Duration::ZERO,
                loads: AtomicUsize::new(0),
                log: Arc::new(Mutex::new(Vec::new())),
            }
        }

        pub fn with_classifier<F>(factory: F) -> Self
        where
            F: Fn() -> ScriptedClassifier + Send + Sync + 'static,
        {
            Self {
                factory: Some(Box::new(factory)),
                ..Self::failing()
            }
        }

        pub fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }

        pub fn loads(&self) -> usize {
            self.loads.load(Ordering::SeqCst)
        }

        pub fn seen_texts(&self) -> Vec<String> {
            self.log.lock().clone()
        }
    }

    impl ModelLoader for ScriptedLoader {
        fn load(
            &self,
            _kind: ModelKind,
            _device: Device,
        ) -> Result<Box<dyn TextClassifier>, ModelError> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(self.delay);
            let factory = self
                .factory
                .as_ref()
                .ok_or_else(|| ModelError::Init("weights download failed".into()))?;
            let mut classifier = factory();
            classifier.log = Some(self.log.clone());
            Ok(Box::new(classifier))
        }
    }
}
