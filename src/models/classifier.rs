use std::sync::Arc;

use crate::capabilities::Device;
use crate::error::ModelError;
use crate::runtime_config::ServiceConfig;
use crate::types::ModelKind;

/// Top label of a single classification call. `score` is a probability in
/// `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub label: String,
    pub score: f64,
}

impl Prediction {
    pub fn new(label: impl Into<String>, score: f64) -> Self {
        Self {
            label: label.into(),
            score,
        }
    }
}

/// A loaded learned text-classification pipeline.
pub trait TextClassifier: Send + Sync {
    fn classify(&self, text: &str) -> Result<Prediction, ModelError>;

    fn name(&self) -> &str;
}

/// Constructs learned pipelines. Called at most once per kind per process.
pub trait ModelLoader: Send + Sync {
    fn load(&self, kind: ModelKind, device: Device) -> Result<Box<dyn TextClassifier>, ModelError>;
}

/// Loader used when no inference backend is compiled in.
pub struct DisabledLoader;

impl ModelLoader for DisabledLoader {
    fn load(&self, _kind: ModelKind, _device: Device) -> Result<Box<dyn TextClassifier>, ModelError> {
        Err(ModelError::Disabled)
    }
}

/// The loader matching the compiled feature set.
#[cfg(feature = "onnx")]
pub fn default_loader(config: &ServiceConfig) -> Arc<dyn ModelLoader> {
    Arc::new(super::onnx::OnnxModelLoader::from_config(config))
}

/// The loader matching the compiled feature set.
#[cfg(not(feature = "onnx"))]
pub fn default_loader(_config: &ServiceConfig) -> Arc<dyn ModelLoader> {
    Arc::new(DisabledLoader)
}
