// =============================================================================
// ONNX Runtime backend — exported HuggingFace sequence classifiers
// =============================================================================
//
// Each model directory must contain:
//   - `model.onnx`     — exported sequence-classification graph
//   - `tokenizer.json` — HuggingFace tokenizer definition
//   - `config.json`    — model config carrying the `id2label` map
//
// Inputs are `input_ids` and `attention_mask`; output 0 is `[1, num_labels]`
// logits. The top softmax probability and its label are returned.
// =============================================================================

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use ort::execution_providers::CUDAExecutionProvider;
use ort::session::Session;
use ort::value::TensorRef;
use parking_lot::Mutex;
use serde::Deserialize;
use tracing::info;

use super::classifier::{ModelLoader, Prediction, TextClassifier};
use crate::capabilities::Device;
use crate::error::ModelError;
use crate::runtime_config::ServiceConfig;
use crate::types::ModelKind;

/// Token ceiling of the exported models.
const MAX_TOKENS: usize = 512;

#[derive(Deserialize)]
struct HfConfig {
    #[serde(default)]
    id2label: HashMap<String, String>,
}

/// Sequence classifier backed by an ONNX Runtime session.
///
/// `Session::run` needs `&mut self`, hence the mutex.
pub struct OnnxClassifier {
    name: String,
    session: Mutex<Session>,
    tokenizer: tokenizers::Tokenizer,
    labels: Vec<String>,
}

impl OnnxClassifier {
    pub fn load(model_dir: &Path, device: Device, threads: usize) -> Result<Self, ModelError> {
        let model_path = model_dir.join("model.onnx");
        let tokenizer_path = model_dir.join("tokenizer.json");
        let config_path = model_dir.join("config.json");

        for path in [&model_path, &tokenizer_path, &config_path] {
            if !path.exists() {
                return Err(ModelError::NotFound(path.clone()));
            }
        }

        let mut builder = Session::builder()
            .map_err(|e: ort::Error| ModelError::Init(e.to_string()))?
            .with_intra_threads(threads)
            .map_err(|e: ort::Error| ModelError::Init(e.to_string()))?;

        if let Device::Cuda(ordinal) = device {
            builder = builder
                .with_execution_providers([CUDAExecutionProvider::default()
                    .with_device_id(ordinal)
                    .build()])
                .map_err(|e: ort::Error| ModelError::Init(format!("CUDA provider: {e}")))?;
        }

        let session = builder
            .commit_from_file(&model_path)
            .map_err(|e: ort::Error| ModelError::Init(format!("ONNX load failed: {e}")))?;

        let mut tokenizer = tokenizers::Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| ModelError::Init(format!("Tokenizer load failed: {e}")))?;
        tokenizer
            .with_truncation(Some(tokenizers::TruncationParams {
                max_length: MAX_TOKENS,
                ..Default::default()
            }))
            .map_err(|e| ModelError::Init(format!("Tokenizer truncation: {e}")))?;

        let labels = read_labels(&config_path)?;
        let name = model_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "onnx".to_string());

        info!(model = %name, labels = ?labels, device = %device, "ONNX classifier loaded");

        Ok(Self {
            name,
            session: Mutex::new(session),
            tokenizer,
            labels,
        })
    }
}

/// `id2label` ordered by class index.
fn read_labels(config_path: &Path) -> Result<Vec<String>, ModelError> {
    let raw = std::fs::read_to_string(config_path)
        .map_err(|e| ModelError::Init(format!("{}: {e}", config_path.display())))?;
    let config: HfConfig = serde_json::from_str(&raw)
        .map_err(|e| ModelError::Init(format!("{}: {e}", config_path.display())))?;

    let mut indexed: Vec<(usize, String)> = config
        .id2label
        .into_iter()
        .filter_map(|(idx, label)| idx.parse().ok().map(|i| (i, label)))
        .collect();
    indexed.sort_by_key(|(i, _)| *i);

    if indexed.is_empty() {
        return Err(ModelError::Init("config.json has no id2label".into()));
    }
    Ok(indexed.into_iter().map(|(_, label)| label).collect())
}

impl TextClassifier for OnnxClassifier {
    fn classify(&self, text: &str) -> Result<Prediction, ModelError> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| ModelError::Inference(format!("tokenization: {e}")))?;

        let input_ids: Vec<i64> = encoding.get_ids().iter().map(|&id| id as i64).collect();
        let attention_mask: Vec<i64> = encoding
            .get_attention_mask()
            .iter()
            .map(|&m| m as i64)
            .collect();
        let seq_len = input_ids.len();

        let ids_array = ndarray::Array2::from_shape_vec((1, seq_len), input_ids)
            .map_err(|e| ModelError::Inference(e.to_string()))?;
        let mask_array = ndarray::Array2::from_shape_vec((1, seq_len), attention_mask)
            .map_err(|e| ModelError::Inference(e.to_string()))?;

        let ids_tensor = TensorRef::from_array_view(&ids_array)
            .map_err(|e| ModelError::Inference(e.to_string()))?;
        let mask_tensor = TensorRef::from_array_view(&mask_array)
            .map_err(|e| ModelError::Inference(e.to_string()))?;

        let mut session = self.session.lock();
        let outputs = session
            .run(ort::inputs![ids_tensor, mask_tensor])
            .map_err(|e| ModelError::Inference(format!("ONNX inference failed: {e}")))?;

        let (_shape, logits) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| ModelError::Inference(format!("output extraction: {e}")))?;

        top_label(logits, &self.labels)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Softmax over `logits`, returning the arg-max label and its probability.
fn top_label(logits: &[f32], labels: &[String]) -> Result<Prediction, ModelError> {
    if logits.len() != labels.len() {
        return Err(ModelError::Inference(format!(
            "expected {} logits, got {}",
            labels.len(),
            logits.len()
        )));
    }

    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f64> = logits.iter().map(|&l| f64::from(l - max).exp()).collect();
    let total: f64 = exps.iter().sum();

    let (best, prob) = exps
        .iter()
        .enumerate()
        .map(|(i, e)| (i, e / total))
        .fold((0, f64::MIN), |acc, cur| if cur.1 > acc.1 { cur } else { acc });

    Ok(Prediction::new(labels[best].clone(), prob))
}

/// Loads each kind from its configured model directory.
pub struct OnnxModelLoader {
    fake_news_dir: Option<PathBuf>,
    sentiment_dir: Option<PathBuf>,
    threads: usize,
}

impl OnnxModelLoader {
    pub fn from_config(config: &ServiceConfig) -> Self {
        Self {
            fake_news_dir: config.fake_news_model_dir.clone(),
            sentiment_dir: config.sentiment_model_dir.clone(),
            threads: config.intra_op_threads,
        }
    }
}

impl ModelLoader for OnnxModelLoader {
    fn load(&self, kind: ModelKind, device: Device) -> Result<Box<dyn TextClassifier>, ModelError> {
        let dir = match kind {
            ModelKind::FakeNewsClassifier => self.fake_news_dir.as_ref(),
            ModelKind::SentimentClassifier => self.sentiment_dir.as_ref(),
        }
        .ok_or_else(|| ModelError::Init(format!("no model directory configured for {kind}")))?;

        Ok(Box::new(OnnxClassifier::load(dir, device, self.threads)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn softmax_picks_largest_logit() {
        let labels = vec!["NEGATIVE".to_string(), "POSITIVE".to_string()];
        let p = top_label(&[-1.0, 2.0], &labels).unwrap();
        assert_eq!(p.label, "POSITIVE");
        assert!(p.score > 0.95 && p.score < 1.0);
    }

    #[test]
    fn logit_label_mismatch_is_an_error() {
        let labels = vec!["A".to_string()];
        assert!(top_label(&[0.1, 0.2], &labels).is_err());
    }

    #[test]
    fn missing_artifacts_are_reported() {
        let dir = std::env::temp_dir().join("credence-missing-model");
        let err = OnnxClassifier::load(&dir, Device::Cpu, 1).err().unwrap();
        assert!(matches!(err, ModelError::NotFound(_)));
    }
}
