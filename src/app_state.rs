// =============================================================================
// Central Application State — Credence analysis service
// =============================================================================
//
// Built once at startup and shared with every handler via `Arc<AppState>`.
// The analyzer owns the model registry and the memo caches; everything else
// here is bookkeeping for the health endpoint.
//
// Thread safety:
//   - Atomic request counter.
//   - parking_lot::RwLock for the recent-error ring buffer.
//   - The analyzer manages its own interior mutability.
// =============================================================================

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use parking_lot::RwLock;
use serde::Serialize;

use crate::analysis::{Analyzer, CacheReport};
use crate::capabilities::Capabilities;
use crate::models::ModelStatus;
use crate::runtime_config::{DevicePreference, ServiceConfig};
use crate::types::ModelKind;

// =============================================================================
// Error Record
// =============================================================================

/// A request that failed server-side, kept for the health endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorRecord {
    pub route: String,
    pub message: String,
    /// RFC 3339 timestamp.
    pub at: String,
}

// =============================================================================
// AppState
// =============================================================================

/// Maximum number of recent errors to retain.
const MAX_RECENT_ERRORS: usize = 50;

pub struct AppState {
    pub config: ServiceConfig,
    pub capabilities: Capabilities,
    pub analyzer: Arc<Analyzer>,

    /// Analysis requests accepted (any route other than `/health`).
    pub requests_served: AtomicU64,

    pub recent_errors: RwLock<Vec<ErrorRecord>>,

    /// Used for uptime calculations.
    pub start_time: std::time::Instant,
}

impl AppState {
    pub fn new(config: ServiceConfig, capabilities: Capabilities, analyzer: Analyzer) -> Self {
        Self {
            config,
            capabilities,
            analyzer: Arc::new(analyzer),
            requests_served: AtomicU64::new(0),
            recent_errors: RwLock::new(Vec::new()),
            start_time: std::time::Instant::now(),
        }
    }

    pub fn record_request(&self) -> u64 {
        self.requests_served.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Record a server-side failure. Oldest entries are evicted past
    /// [`MAX_RECENT_ERRORS`].
    pub fn push_error(&self, route: &str, message: String) {
        let record = ErrorRecord {
            route: route.to_string(),
            message,
            at: Utc::now().to_rfc3339(),
        };

        let mut errors = self.recent_errors.write();
        errors.push(record);
        while errors.len() > MAX_RECENT_ERRORS {
            errors.remove(0);
        }
    }

    // ── Health Snapshot ─────────────────────────────────────────────────

    /// Readiness report. Reads registry state only; never runs inference or
    /// triggers model construction.
    pub fn build_health(&self) -> HealthSnapshot {
        let registry = self.analyzer.registry();
        let models = ModelsSnapshot {
            fake_news: registry.status(ModelKind::FakeNewsClassifier),
            sentiment: registry.status(ModelKind::SentimentClassifier),
        };

        HealthSnapshot {
            status: "ok",
            version: env!("CARGO_PKG_VERSION"),
            server_time: Utc::now().timestamp_millis(),
            uptime_s: self.start_time.elapsed().as_secs(),
            transformers: self.capabilities.has_learned_classifier,
            model_ready: registry.is_ready(ModelKind::FakeNewsClassifier),
            langdetect: self.capabilities.has_language_library,
            lexicon: self.analyzer.has_lexicon(),
            capabilities: self.capabilities,
            device_preference: self.config.device,
            models,
            caches: self.analyzer.cache_report(),
            requests_served: self.requests_served.load(Ordering::Relaxed),
            recent_errors: self.recent_errors.read().clone(),
        }
    }
}

// =============================================================================
// Serialisable health types
// =============================================================================

/// `GET /health` payload. The first five flags keep the field names existing
/// gateway clients poll for.
#[derive(Debug, Clone, Serialize)]
pub struct HealthSnapshot {
    pub status: &'static str,
    pub version: &'static str,
    pub server_time: i64,
    pub uptime_s: u64,
    pub transformers: bool,
    #[serde(rename = "modelReady")]
    pub model_ready: bool,
    pub langdetect: bool,
    #[serde(rename = "textblob")]
    pub lexicon: bool,
    pub capabilities: Capabilities,
    pub device_preference: DevicePreference,
    pub models: ModelsSnapshot,
    pub caches: CacheReport,
    pub requests_served: u64,
    pub recent_errors: Vec<ErrorRecord>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct ModelsSnapshot {
    pub fake_news: ModelStatus,
    pub sentiment: ModelStatus,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::testing::{enabled_caps, ScriptedLoader};
    use crate::models::ModelRegistry;

    fn state_with(loader: Arc<ScriptedLoader>) -> AppState {
        let caps = enabled_caps();
        let registry = Arc::new(ModelRegistry::new(loader, &caps));
        let config = ServiceConfig::default();
        let analyzer = Analyzer::from_parts(&config, registry, None, None).unwrap();
        AppState::new(config, caps, analyzer)
    }

    #[test]
    fn health_never_constructs_models() {
        let loader = Arc::new(ScriptedLoader::ready("POSITIVE", 0.9));
        let state = state_with(loader.clone());

        let health = state.build_health();
        assert_eq!(health.status, "ok");
        assert!(health.transformers);
        assert!(!health.model_ready);
        assert_eq!(health.models.fake_news, ModelStatus::Uninitialized);
        assert_eq!(loader.loads(), 0);
    }

    #[test]
    fn health_reflects_loaded_models() {
        let loader = Arc::new(ScriptedLoader::ready("POSITIVE", 0.9));
        let state = state_with(loader);
        state.analyzer.run_fake_news_detection("some text");

        let health = state.build_health();
        assert!(health.model_ready);
        assert_eq!(health.models.fake_news, ModelStatus::Ready);
        assert_eq!(health.models.sentiment, ModelStatus::Uninitialized);
    }

    #[test]
    fn error_ring_is_bounded() {
        let state = state_with(Arc::new(ScriptedLoader::failing()));
        for i in 0..(MAX_RECENT_ERRORS + 5) {
            state.push_error("/analyze/comprehensive", format!("failure {i}"));
        }
        let errors = state.recent_errors.read();
        assert_eq!(errors.len(), MAX_RECENT_ERRORS);
        assert_eq!(errors[0].message, "failure 5");
    }

    #[test]
    fn health_serialises_gateway_fields() {
        let state = state_with(Arc::new(ScriptedLoader::failing()));
        let json = serde_json::to_value(state.build_health()).unwrap();
        for key in ["status", "transformers", "modelReady", "langdetect", "textblob"] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
        assert_eq!(json["models"]["sentiment"], "uninitialized");
    }
}
