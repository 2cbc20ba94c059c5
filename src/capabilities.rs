// =============================================================================
// Capability Probe — which optional backends this process can use
// =============================================================================
//
// Probed once at startup and consulted by every signal producer to pick its
// strategy. Nothing downstream re-checks the environment.
// =============================================================================

use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::runtime_config::{DevicePreference, ServiceConfig};

/// NVIDIA control node, present whenever the driver is loaded.
const NVIDIA_CONTROL_DEVICE: &str = "/dev/nvidiactl";

/// Compute device a learned pipeline is constructed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "ordinal")]
pub enum Device {
    Cuda(i32),
    Cpu,
}

impl Device {
    pub fn is_accelerator(&self) -> bool {
        matches!(self, Self::Cuda(_))
    }
}

impl std::fmt::Display for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cuda(ordinal) => write!(f, "cuda:{ordinal}"),
            Self::Cpu => write!(f, "cpu"),
        }
    }
}

/// Pick the accelerator when allowed and present, else the CPU.
pub fn select_device(preference: DevicePreference, accelerator_present: bool) -> Device {
    match preference {
        DevicePreference::Cpu => Device::Cpu,
        DevicePreference::Cuda => Device::Cuda(0),
        DevicePreference::Auto if accelerator_present => Device::Cuda(0),
        DevicePreference::Auto => Device::Cpu,
    }
}

/// Fixed record of optional capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Capabilities {
    pub has_learned_classifier: bool,
    pub has_language_library: bool,
    pub has_lexicon: bool,
    pub device: Device,
}

impl Capabilities {
    /// Probe compiled features and configured artifacts.
    pub fn probe(config: &ServiceConfig) -> Self {
        let model_configured =
            config.fake_news_model_dir.is_some() || config.sentiment_model_dir.is_some();
        let lexicon_present = config
            .lexicon_path
            .as_deref()
            .map(Path::is_file)
            .unwrap_or(false);

        let caps = Self {
            has_learned_classifier: cfg!(feature = "onnx") && model_configured,
            has_language_library: cfg!(feature = "langdetect"),
            has_lexicon: lexicon_present,
            device: select_device(config.device, Path::new(NVIDIA_CONTROL_DEVICE).exists()),
        };

        info!(
            learned_classifier = caps.has_learned_classifier,
            language_library = caps.has_language_library,
            lexicon = caps.has_lexicon,
            device = %caps.device,
            accelerated = caps.device.is_accelerator(),
            "capabilities probed"
        );

        caps
    }

    /// Nothing optional available: every signal uses its last-resort heuristic.
    #[cfg(test)]
    pub fn none() -> Self {
        Self {
            has_learned_classifier: false,
            has_language_library: false,
            has_lexicon: false,
            device: Device::Cpu,
        }
    }
}
