// =============================================================================
// Error taxonomy
// =============================================================================
//
// ModelError    — raised by learned-pipeline loading and inference.
// SignalError   — why one strategy of a fallback cascade could not produce a
//                 signal. Never escapes the signal producers.
// AnalysisError — the only errors a caller of the analysis contracts sees.
// =============================================================================

use std::path::PathBuf;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::types::ModelKind;

/// Errors from loading or running a learned pipeline.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("learned pipeline support is not compiled in")]
    Disabled,

    #[error("model artifact not found: {0}")]
    NotFound(PathBuf),

    #[error("model initialisation failed: {0}")]
    Init(String),

    #[error("inference failed: {0}")]
    Inference(String),
}

/// Reasons a single strategy in a fallback cascade declined to answer.
#[derive(Debug, Error)]
pub enum SignalError {
    #[error("{0} model unavailable")]
    ModelUnavailable(ModelKind),

    #[error("inference failure: {0}")]
    InferenceFailure(#[from] ModelError),

    #[error("unmapped model label: {0}")]
    UnmappedLabel(String),

    #[error("polarity lexicon not loaded")]
    LexiconUnavailable,

    #[error("language detection failed: {0}")]
    DetectionFailed(String),
}

/// Errors surfaced at the analysis boundary.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("No text provided")]
    EmptyInput,

    #[error("No file uploaded")]
    MissingFile,

    #[error("invalid image: {0}")]
    InvalidImage(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AnalysisError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::EmptyInput | Self::MissingFile | Self::InvalidImage(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AnalysisError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "error": self.to_string(),
        });
        (self.status(), Json(body)).into_response()
    }
}
