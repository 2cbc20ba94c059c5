// =============================================================================
// Service Configuration — JSON file with env overrides and atomic save
// =============================================================================
//
// Every tunable of the analysis service lives here. All fields carry
// `#[serde(default)]` so that adding new fields never breaks loading an older
// config file. Environment variables (usually via `.env`) override the file.
// =============================================================================

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_bind_addr() -> String {
    "0.0.0.0:8000".to_string()
}

fn default_snippet_limit() -> usize {
    2000
}

fn default_model_input_limit() -> usize {
    512
}

fn default_cache_capacity() -> usize {
    512
}

fn default_lexicon_path() -> Option<PathBuf> {
    Some(PathBuf::from("assets/polarity_lexicon.tsv"))
}

fn default_intra_op_threads() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .clamp(1, 4)
}

// =============================================================================
// DevicePreference
// =============================================================================

/// Which compute device learned pipelines should run on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DevicePreference {
    /// Use an accelerator when one is present, else the CPU.
    #[default]
    Auto,
    Cpu,
    Cuda,
}

impl std::str::FromStr for DevicePreference {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "cpu" => Ok(Self::Cpu),
            "cuda" | "gpu" => Ok(Self::Cuda),
            other => anyhow::bail!("unknown device preference '{other}'"),
        }
    }
}

impl std::fmt::Display for DevicePreference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Auto => write!(f, "auto"),
            Self::Cpu => write!(f, "cpu"),
            Self::Cuda => write!(f, "cuda"),
        }
    }
}

// =============================================================================
// ServiceConfig
// =============================================================================

/// Top-level configuration for the analysis service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Address the HTTP server binds to.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Character ceiling applied when normalising text for the memo caches.
    #[serde(default = "default_snippet_limit")]
    pub snippet_limit: usize,

    /// Character ceiling of text handed to a learned pipeline.
    #[serde(default = "default_model_input_limit")]
    pub model_input_limit: usize,

    /// Maximum entries per memo cache (language, country, industry).
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,

    /// Compute device for learned pipelines.
    #[serde(default)]
    pub device: DevicePreference,

    /// Directory holding the exported fake-news pipeline
    /// (`model.onnx`, `tokenizer.json`, `config.json`).
    #[serde(default)]
    pub fake_news_model_dir: Option<PathBuf>,

    /// Directory holding the exported sentiment pipeline.
    #[serde(default)]
    pub sentiment_model_dir: Option<PathBuf>,

    /// Tab-separated `word<TAB>polarity` lexicon for the second sentiment tier.
    #[serde(default = "default_lexicon_path")]
    pub lexicon_path: Option<PathBuf>,

    /// Load both learned pipelines in the background right after startup.
    #[serde(default)]
    pub preload_models: bool,

    /// Intra-op threads per inference session.
    #[serde(default = "default_intra_op_threads")]
    pub intra_op_threads: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            snippet_limit: default_snippet_limit(),
            model_input_limit: default_model_input_limit(),
            cache_capacity: default_cache_capacity(),
            device: DevicePreference::default(),
            fake_news_model_dir: None,
            sentiment_model_dir: None,
            lexicon_path: default_lexicon_path(),
            preload_models: false,
            intra_op_threads: default_intra_op_threads(),
        }
    }
}

impl ServiceConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// If the file does not exist, returns an error so the caller can fall
    /// back to defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read service config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse service config from {}", path.display()))?;

        info!(
            path = %path.display(),
            bind_addr = %config.bind_addr,
            device = %config.device,
            "service config loaded"
        );

        Ok(config)
    }

    /// Persist the configuration using an atomic write (tmp file + rename).
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content = serde_json::to_string_pretty(self)
            .context("failed to serialise service config to JSON")?;

        let tmp_path = path.with_extension("json.tmp");

        std::fs::write(&tmp_path, &content)
            .with_context(|| format!("failed to write tmp config to {}", tmp_path.display()))?;

        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("failed to rename tmp config to {}", path.display()))?;

        info!(path = %path.display(), "service config saved (atomic)");
        Ok(())
    }

    /// Apply `CREDENCE_*` overrides from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary key lookup. Unparseable values are
    /// logged and ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(addr) = lookup("CREDENCE_BIND_ADDR") {
            self.bind_addr = addr;
        }
        if let Some(device) = lookup("CREDENCE_DEVICE") {
            match device.parse() {
                Ok(pref) => self.device = pref,
                Err(e) => warn!(error = %e, "ignoring CREDENCE_DEVICE"),
            }
        }
        if let Some(dir) = lookup("CREDENCE_FAKE_NEWS_MODEL") {
            self.fake_news_model_dir = Some(PathBuf::from(dir));
        }
        if let Some(dir) = lookup("CREDENCE_SENTIMENT_MODEL") {
            self.sentiment_model_dir = Some(PathBuf::from(dir));
        }
        if let Some(path) = lookup("CREDENCE_LEXICON") {
            self.lexicon_path = Some(PathBuf::from(path));
        }
        if let Some(flag) = lookup("CREDENCE_PRELOAD") {
            self.preload_models = matches!(flag.to_lowercase().as_str(), "1" | "true" | "yes");
        }
        if let Some(threads) = lookup("CREDENCE_THREADS") {
            match threads.parse::<usize>() {
                Ok(n) if n > 0 => self.intra_op_threads = n,
                _ => warn!(value = %threads, "ignoring CREDENCE_THREADS"),
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn default_config_has_expected_values() {
        let cfg = ServiceConfig::default();
        assert_eq!(cfg.bind_addr, "0.0.0.0:8000");
        assert_eq!(cfg.snippet_limit, 2000);
        assert_eq!(cfg.model_input_limit, 512);
        assert_eq!(cfg.cache_capacity, 512);
        assert_eq!(cfg.device, DevicePreference::Auto);
        assert!(cfg.fake_news_model_dir.is_none());
        assert!(!cfg.preload_models);
        assert!((1..=4).contains(&cfg.intra_op_threads));
    }

    #[test]
    fn deserialise_empty_json_uses_defaults() {
        let cfg: ServiceConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.cache_capacity, 512);
        assert_eq!(
            cfg.lexicon_path.as_deref(),
            Some(Path::new("assets/polarity_lexicon.tsv"))
        );
    }

    #[test]
    fn deserialise_partial_json_fills_defaults() {
        let json = r#"{ "device": "cpu", "fake_news_model_dir": "/models/fake" }"#;
        let cfg: ServiceConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.device, DevicePreference::Cpu);
        assert_eq!(cfg.fake_news_model_dir, Some(PathBuf::from("/models/fake")));
        assert_eq!(cfg.snippet_limit, 2000);
    }

    #[test]
    fn overrides_replace_file_values() {
        let env: HashMap<&str, &str> = [
            ("CREDENCE_BIND_ADDR", "127.0.0.1:9000"),
            ("CREDENCE_DEVICE", "cuda"),
            ("CREDENCE_PRELOAD", "true"),
            ("CREDENCE_THREADS", "2"),
            ("CREDENCE_SENTIMENT_MODEL", "/models/sentiment"),
        ]
        .into_iter()
        .collect();

        let mut cfg = ServiceConfig::default();
        cfg.apply_overrides(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(cfg.bind_addr, "127.0.0.1:9000");
        assert_eq!(cfg.device, DevicePreference::Cuda);
        assert!(cfg.preload_models);
        assert_eq!(cfg.intra_op_threads, 2);
        assert_eq!(cfg.sentiment_model_dir, Some(PathBuf::from("/models/sentiment")));
    }

    #[test]
    fn invalid_overrides_are_ignored() {
        let mut cfg = ServiceConfig::default();
        let before = cfg.intra_op_threads;
        cfg.apply_overrides(|k| match k {
            "CREDENCE_DEVICE" => Some("tpu".to_string()),
            "CREDENCE_THREADS" => Some("zero".to_string()),
            _ => None,
        });
        assert_eq!(cfg.device, DevicePreference::Auto);
        assert_eq!(cfg.intra_op_threads, before);
    }

    #[test]
    fn save_then_load_preserves_fields() {
        let path = std::env::temp_dir().join(format!("credence-{}.json", uuid::Uuid::new_v4()));
        let mut cfg = ServiceConfig::default();
        cfg.cache_capacity = 64;
        cfg.save(&path).unwrap();

        let loaded = ServiceConfig::load(&path).unwrap();
        assert_eq!(loaded.cache_capacity, 64);
        let _ = std::fs::remove_file(&path);
    }
}
