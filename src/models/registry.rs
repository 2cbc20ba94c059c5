// =============================================================================
// Model Registry — lazy, at-most-once construction of learned pipelines
// =============================================================================
//
// Each kind owns a slot with its own init lock. The first caller of a kind
// constructs it under that lock; every later caller reads the published
// result from a `OnceLock` without locking. A failed construction publishes
// `None` and the kind stays Unavailable for the rest of the process.
//
// Holding one kind's lock never blocks the other kind.
// =============================================================================

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Instant;

use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::capabilities::{Capabilities, Device};
use crate::error::SignalError;
use crate::models::classifier::{ModelLoader, TextClassifier};
use crate::types::ModelKind;

pub type SharedClassifier = Arc<dyn TextClassifier>;

/// Lifecycle of a model slot. Transitions are one-way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelStatus {
    Uninitialized,
    Initializing,
    Ready,
    Unavailable,
}

impl ModelStatus {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Uninitialized,
            1 => Self::Initializing,
            2 => Self::Ready,
            _ => Self::Unavailable,
        }
    }
}

impl std::fmt::Display for ModelStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "uninitialized"),
            Self::Initializing => write!(f, "initializing"),
            Self::Ready => write!(f, "ready"),
            Self::Unavailable => write!(f, "unavailable"),
        }
    }
}

struct ModelSlot {
    status: AtomicU8,
    handle: OnceLock<Option<SharedClassifier>>,
    init_lock: Mutex<()>,
}

impl ModelSlot {
    fn new() -> Self {
        Self {
            status: AtomicU8::new(ModelStatus::Uninitialized as u8),
            handle: OnceLock::new(),
            init_lock: Mutex::new(()),
        }
    }

    fn status(&self) -> ModelStatus {
        ModelStatus::from_u8(self.status.load(Ordering::Acquire))
    }

    fn set_status(&self, status: ModelStatus) {
        self.status.store(status as u8, Ordering::Release);
    }

    fn get_or_init<F>(&self, construct: F) -> Option<SharedClassifier>
    where
        F: FnOnce() -> Option<SharedClassifier>,
    {
        if let Some(published) = self.handle.get() {
            return published.clone();
        }

        let _guard = self.init_lock.lock();
        if let Some(published) = self.handle.get() {
            return published.clone();
        }

        self.set_status(ModelStatus::Initializing);
        let built = construct();
        // Status first: once the handle is visible, health must not lag behind it.
        self.set_status(if built.is_some() {
            ModelStatus::Ready
        } else {
            ModelStatus::Unavailable
        });
        let _ = self.handle.set(built.clone());
        built
    }
}

/// Process-wide owner of the learned pipelines.
pub struct ModelRegistry {
    loader: Arc<dyn ModelLoader>,
    enabled: bool,
    device: Device,
    fake_news: ModelSlot,
    sentiment: ModelSlot,
}

impl ModelRegistry {
    pub fn new(loader: Arc<dyn ModelLoader>, capabilities: &Capabilities) -> Self {
        Self {
            loader,
            enabled: capabilities.has_learned_classifier,
            device: capabilities.device,
            fake_news: ModelSlot::new(),
            sentiment: ModelSlot::new(),
        }
    }

    fn slot(&self, kind: ModelKind) -> &ModelSlot {
        match kind {
            ModelKind::FakeNewsClassifier => &self.fake_news,
            ModelKind::SentimentClassifier => &self.sentiment,
        }
    }

    /// Handle for `kind`, constructing it on first use.
    pub fn get(&self, kind: ModelKind) -> Result<SharedClassifier, SignalError> {
        self.slot(kind)
            .get_or_init(|| self.construct(kind))
            .ok_or(SignalError::ModelUnavailable(kind))
    }

    /// Current lifecycle state of `kind`. Never triggers construction.
    pub fn status(&self, kind: ModelKind) -> ModelStatus {
        self.slot(kind).status()
    }

    pub fn is_ready(&self, kind: ModelKind) -> bool {
        self.status(kind) == ModelStatus::Ready
    }

    /// Construct both kinds now instead of on first request.
    pub fn preload(&self) {
        for kind in [ModelKind::FakeNewsClassifier, ModelKind::SentimentClassifier] {
            let _ = self.get(kind);
        }
    }

    fn construct(&self, kind: ModelKind) -> Option<SharedClassifier> {
        if !self.enabled {
            info!(kind = %kind, "no learned pipeline available, heuristics will be used");
            return None;
        }

        let started = Instant::now();
        let loaded = catch_unwind(AssertUnwindSafe(|| self.loader.load(kind, self.device)));
        let classifier: SharedClassifier = match loaded {
            Ok(Ok(classifier)) => Arc::from(classifier),
            Ok(Err(e)) => {
                warn!(
                    kind = %kind,
                    device = %self.device,
                    error = %e,
                    "learned pipeline failed to load, heuristics will be used for this process"
                );
                return None;
            }
            Err(payload) => {
                warn!(
                    kind = %kind,
                    device = %self.device,
                    panic = panic_message(payload.as_ref()),
                    "learned pipeline panicked while loading, heuristics will be used for this process"
                );
                return None;
            }
        };

        match catch_unwind(AssertUnwindSafe(|| classifier.classify(kind.warmup_text()))) {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => debug!(kind = %kind, error = %e, "warmup inference failed"),
            Err(payload) => warn!(
                kind = %kind,
                panic = panic_message(payload.as_ref()),
                "warmup inference panicked"
            ),
        }

        info!(
            kind = %kind,
            model = classifier.name(),
            device = %self.device,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "learned pipeline ready"
        );
        Some(classifier)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}
