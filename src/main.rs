// =============================================================================
// Aegis News Sentinel — Main Entry Point
// =============================================================================
//
// News-cluster consensus and manipulation-detection engine: articles arrive
// over the REST API, a worker pool clusters and classifies them, background
// sweeps decay quarantines and purge stale clusters, and the trading-signal
// layer reads per-cluster trust through the query endpoints.
// =============================================================================

// ── Module declarations ──────────────────────────────────────────────────────
mod api;
mod app_state;
mod calendar;
mod classifier;
mod cluster;
mod cooling;
mod credibility;
mod error;
mod ingest;
mod repository;
mod retention;
mod runtime_config;
mod signals;
mod types;

use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::app_state::AppState;
use crate::runtime_config::RuntimeConfig;

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
    info!("║        Aegis News Sentinel — Starting Up                ║");
    info!("╚══════════════════════════════════════════════════════════╝");

    let config = RuntimeConfig::load("runtime_config.json").unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        RuntimeConfig::default()
    });

    info!(
        ingest_mode = %config.ingest_mode,
        workers = config.worker_count,
        retention_days = config.retention_days,
        "engine configuration"
    );

    // ── 2. Build shared state ────────────────────────────────────────────
    let worker_count = config.worker_count;
    let (state, ingest_rx) = AppState::new(config);
    let state = Arc::new(state);

    // ── 3. Ingest worker pool ────────────────────────────────────────────
    ingest::spawn_ingest_workers(state.clone(), ingest_rx, worker_count);
    info!(count = worker_count, "ingest workers launched");

    // ── 4. Calendar collector ────────────────────────────────────────────
    let calendar_store = state.calendar.clone();
    let calendar_params = state.runtime_config.read().calendar.clone();
    tokio::spawn(async move {
        calendar::collector::run_calendar_collector(calendar_store, calendar_params).await;
    });

    // ── 5. Cooling decay sweep ───────────────────────────────────────────
    let cooling_manager = state.cluster_manager.clone();
    let cooling_config = state.runtime_config.clone();
    tokio::spawn(async move {
        cooling::run_cooling_sweep(cooling_manager, cooling_config).await;
    });

    // ── 6. Retention cleanup sweep ───────────────────────────────────────
    let retention_manager = state.cluster_manager.clone();
    let retention_config = state.runtime_config.clone();
    tokio::spawn(async move {
        retention::run_retention_sweep(retention_manager, retention_config).await;
    });

    // ── 7. API server ────────────────────────────────────────────────────
    let api_state = state.clone();
    let bind_addr = std::env::var("AEGIS_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3100".into());
    let bind_addr_clone = bind_addr.clone();

    tokio::spawn(async move {
        let app = api::rest::router(api_state);
        let listener = tokio::net::TcpListener::bind(&bind_addr_clone)
            .await
            .expect("Failed to bind API server");
        info!(addr = %bind_addr_clone, "API server listening");
        axum::serve(listener, app)
            .await
            .expect("API server failed");
    });

    info!("All subsystems running. Press Ctrl+C to stop.");

    // ── 8. Graceful shutdown ─────────────────────────────────────────────
    tokio::signal::ctrl_c().await?;
    warn!("Shutdown signal received — stopping gracefully");

    if let Err(e) = state.runtime_config.read().save("runtime_config.json") {
        error!(error = %e, "Failed to save runtime config on shutdown");
    }

    info!("Aegis News Sentinel shut down complete.");
    Ok(())
}
