// =============================================================================
// Credence — Main Entry Point
// =============================================================================
//
// News credibility analysis service. Learned pipelines load lazily on first
// use (or in the background when `preload_models` is set); every signal has
// a heuristic fallback, so the service answers even with no models at all.
// =============================================================================

// ── Module declarations ──────────────────────────────────────────────────────
mod analysis;
mod api;
mod app_state;
mod capabilities;
mod error;
mod media;
mod models;
mod runtime_config;
mod signal_cache;
mod signals;
mod types;

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::analysis::Analyzer;
use crate::app_state::AppState;
use crate::capabilities::Capabilities;
use crate::models::ModelRegistry;
use crate::runtime_config::ServiceConfig;

const DEFAULT_CONFIG_PATH: &str = "credence_config.json";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("╔══════════════════════════════════════════════════════════╗");
    info!("║        Credence Analysis Service — Starting Up          ║");
    info!("╚══════════════════════════════════════════════════════════╝");

    let config_path =
        std::env::var("CREDENCE_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());

    let mut config = if Path::new(&config_path).exists() {
        ServiceConfig::load(&config_path).unwrap_or_else(|e| {
            warn!(path = %config_path, error = %format!("{e:#}"), "Failed to load config, using defaults");
            ServiceConfig::default()
        })
    } else {
        let defaults = ServiceConfig::default();
        match defaults.save(&config_path) {
            Ok(()) => info!(path = %config_path, "Wrote default config"),
            Err(e) => warn!(path = %config_path, error = %e, "Could not write default config"),
        }
        defaults
    };
    config.apply_env_overrides();

    // ── 2. Capabilities & model registry ─────────────────────────────────
    let capabilities = Capabilities::probe(&config);

    let registry = Arc::new(ModelRegistry::new(
        models::default_loader(&config),
        &capabilities,
    ));

    // ── 3. Build shared state ────────────────────────────────────────────
    let analyzer = Analyzer::new(&config, &capabilities, registry.clone())
        .context("Failed to build analyzer")?;
    let bind_addr = config.bind_addr.clone();
    let preload = config.preload_models;
    let state = Arc::new(AppState::new(config, capabilities, analyzer));

    // ── 4. Optional background preload ───────────────────────────────────
    if preload && capabilities.has_learned_classifier {
        let registry = registry.clone();
        tokio::task::spawn_blocking(move || {
            info!("Preloading learned pipelines");
            registry.preload();
        });
    }

    // ── 5. Start the API server ──────────────────────────────────────────
    let app = api::rest::router(state.clone());
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind API server on {bind_addr}"))?;
    info!(addr = %bind_addr, "API server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("API server failed")?;

    info!(
        requests = state.requests_served.load(std::sync::atomic::Ordering::Relaxed),
        "Credence shut down complete."
    );
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    warn!("Shutdown signal received — stopping gracefully");
}
