// =============================================================================
// REST API Endpoints — Axum 0.7
// =============================================================================
//
// Paths match the ones the Node gateway already calls. Every analysis runs
// on the blocking pool; the core is synchronous and may load a model on
// first use.
//
// A missing, blank or unparsable `text` is always a 400 with
// `{"error": "No text provided"}`. Everything else that reaches the core
// yields a 200 with a well-formed body.
// =============================================================================

use std::sync::Arc;

use axum::{
    extract::{
        multipart::{Multipart, MultipartRejection},
        rejection::JsonRejection,
        DefaultBodyLimit, Json, State,
    },
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, error};

use crate::analysis::{CredibilityResult, DetectedLabel};
use crate::app_state::AppState;
use crate::error::AnalysisError;
use crate::media::{self, ImageVerdict};
use crate::signals::{FakeNewsVerdict, SentimentReading};
use crate::types::round2;

/// Upload ceiling for `/predict/deepfake`.
const MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

// =============================================================================
// Router construction
// =============================================================================

/// Build the full REST router with CORS and request tracing.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/predict/fake-news", post(predict_fake_news))
        .route("/predict/deepfake", post(predict_deepfake))
        .route("/analyze/comprehensive", post(analyze_comprehensive))
        .route("/analyze/sentiment", post(analyze_sentiment))
        .route("/analyze/language", post(analyze_language))
        // ── Middleware & State ───────────────────────────────────────
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// =============================================================================
// Helpers
// =============================================================================

#[derive(Deserialize)]
struct TextRequest {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

/// Non-blank `text` and optional `url` from a JSON body.
fn require_text(
    body: Result<Json<TextRequest>, JsonRejection>,
) -> Result<(String, Option<String>), AnalysisError> {
    let Json(req) = body.map_err(|rejection| {
        debug!(reason = %rejection.body_text(), "request body rejected");
        AnalysisError::EmptyInput
    })?;

    match req.text {
        Some(text) if !text.trim().is_empty() => Ok((text, req.url)),
        _ => Err(AnalysisError::EmptyInput),
    }
}

/// Run `work` on the blocking pool. A panicked task becomes a 500.
async fn run_blocking<T, F>(state: &AppState, route: &str, work: F) -> Result<T, AnalysisError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work).await.map_err(|e| {
        error!(route, error = %e, "analysis task failed");
        state.push_error(route, e.to_string());
        AnalysisError::Internal("analysis task failed".into())
    })
}

// =============================================================================
// Health
// =============================================================================

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.build_health())
}

// =============================================================================
// Text analysis
// =============================================================================

async fn predict_fake_news(
    State(state): State<Arc<AppState>>,
    body: Result<Json<TextRequest>, JsonRejection>,
) -> Result<Json<FakeNewsVerdict>, AnalysisError> {
    let (text, _) = require_text(body)?;
    state.record_request();

    let analyzer = state.analyzer.clone();
    let verdict = run_blocking(&state, "/predict/fake-news", move || {
        analyzer.run_fake_news_detection(&text)
    })
    .await?;
    Ok(Json(verdict))
}

async fn analyze_comprehensive(
    State(state): State<Arc<AppState>>,
    body: Result<Json<TextRequest>, JsonRejection>,
) -> Result<Json<CredibilityResult>, AnalysisError> {
    let (text, url) = require_text(body)?;
    state.record_request();

    let analyzer = state.analyzer.clone();
    let result = run_blocking(&state, "/analyze/comprehensive", move || {
        analyzer.build_comprehensive_result(&text, url.as_deref())
    })
    .await??;
    Ok(Json(result))
}

async fn analyze_sentiment(
    State(state): State<Arc<AppState>>,
    body: Result<Json<TextRequest>, JsonRejection>,
) -> Result<Json<SentimentReading>, AnalysisError> {
    let (text, _) = require_text(body)?;
    state.record_request();

    let analyzer = state.analyzer.clone();
    let reading = run_blocking(&state, "/analyze/sentiment", move || {
        analyzer.analyze_sentiment(&text)
    })
    .await?;
    Ok(Json(SentimentReading::new(reading.label, round2(reading.score))))
}

async fn analyze_language(
    State(state): State<Arc<AppState>>,
    body: Result<Json<TextRequest>, JsonRejection>,
) -> Result<Json<DetectedLabel>, AnalysisError> {
    let (text, _) = require_text(body)?;
    state.record_request();

    let analyzer = state.analyzer.clone();
    let signal = run_blocking(&state, "/analyze/language", move || {
        analyzer.detect_language(&text)
    })
    .await?;
    Ok(Json(DetectedLabel {
        detected: signal.label,
        confidence: round2(signal.confidence * 100.0),
    }))
}

// =============================================================================
// Image upload
// =============================================================================

async fn predict_deepfake(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ImageVerdict>, AnalysisError> {
    let mut multipart = multipart.map_err(|_| AnalysisError::MissingFile)?;

    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AnalysisError::InvalidImage(e.body_text()))?
    {
        if field.name() == Some("file") {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AnalysisError::InvalidImage(e.body_text()))?;
            upload = Some(bytes);
            break;
        }
    }
    let bytes = upload.ok_or(AnalysisError::MissingFile)?;
    state.record_request();

    let verdict = run_blocking(&state, "/predict/deepfake", move || {
        media::analyze_image(&bytes)
    })
    .await??;
    Ok(Json(verdict))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::analysis::Analyzer;
    use crate::capabilities::Capabilities;
    use crate::media::tests::png_bytes;
    use crate::models::testing::unavailable_registry;
    use crate::runtime_config::ServiceConfig;

    fn app() -> Router {
        let config = ServiceConfig::default();
        let analyzer = Analyzer::from_parts(&config, unavailable_registry(), None, None).unwrap();
        router(Arc::new(AppState::new(config, Capabilities::none(), analyzer)))
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn send(req: Request<Body>) -> (StatusCode, Value) {
        let resp = app().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let (status, body) = send(req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["modelReady"], false);
    }

    #[tokio::test]
    async fn blank_or_missing_text_is_bad_request() {
        for payload in [r#"{"text": ""}"#, r#"{"text": "   "}"#, "{}", "not json", r#"{"text": 5}"#] {
            for uri in ["/predict/fake-news", "/analyze/comprehensive"] {
                let (status, body) = send(post_json(uri, payload)).await;
                assert_eq!(status, StatusCode::BAD_REQUEST, "{uri} {payload}");
                assert_eq!(body["error"], "No text provided");
            }
        }
    }

    #[tokio::test]
    async fn fake_news_uses_heuristic_without_models() {
        let (status, body) = send(post_json(
            "/predict/fake-news",
            r#"{"text": "breaking exclusive shocking rumor"}"#,
        ))
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["result"], "FAKE");
        assert_eq!(body["fake_probability"], 70.0);
        assert_eq!(body["confidence"], 30.0);
        assert_eq!(body["model"], "heuristic");
    }

    #[tokio::test]
    async fn comprehensive_returns_full_report() {
        let (status, body) = send(post_json(
            "/analyze/comprehensive",
            r#"{"text": "India Modi Delhi", "url": "https://news.example/in"}"#,
        ))
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["country"]["detected"], "India");
        assert_eq!(body["country"]["confidence"], 90.0);
        assert_eq!(body["metrics"]["has_url"], true);
        assert_eq!(body["authenticity"]["model"], "heuristic");
        assert!(body["risk_indicators"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn sentiment_and_language_endpoints() {
        let (status, body) = send(post_json("/analyze/sentiment", r#"{"text": "good great win"}"#)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["label"], "Positive");
        assert_eq!(body["score"], 75.0);

        let (status, body) = send(post_json("/analyze/language", r#"{"text": "你好世界"}"#)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["detected"], "Chinese");
        assert_eq!(body["confidence"], 85.0);
    }

    fn multipart_request(field: &str, payload: &[u8]) -> Request<Body> {
        let boundary = "credence-test-boundary";
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"up.png\"\r\nContent-Type: image/png\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(payload);
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri("/predict/deepfake")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn deepfake_accepts_png_upload() {
        let png = png_bytes(3, 3, |_| 128);
        let (status, body) = send(multipart_request("file", &png)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["brightness"], 128.0);
        assert_eq!(body["risk_factors"], serde_json::json!(["Low contrast"]));
        let result = body["result"].as_str().unwrap();
        assert!(result == "fake" || result == "authentic");
    }

    #[tokio::test]
    async fn deepfake_rejects_missing_or_broken_uploads() {
        let (status, body) = send(multipart_request("other", b"abc")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "No file uploaded");

        let (status, _) = send(multipart_request("file", b"not an image")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(post_json("/predict/deepfake", "{}")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "No file uploaded");
    }
}
