// =============================================================================
// REST API Endpoints — Axum 0.7
// =============================================================================
//
// All endpoints live under `/api/v1/`. Public endpoints (health) require no
// authentication. All other endpoints require a valid Bearer token checked
// via the `AuthBearer` extractor.
//
// Article submission is fire-and-forget: the handler only enqueues; the
// worker pool does the clustering. Callers retry on 5xx.
//
// CORS is configured permissively for development; tighten
// `allowed_origins` in production.
// =============================================================================

use std::sync::Arc;

use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::api::auth::AuthBearer;
use crate::app_state::AppState;
use crate::calendar::EconomicCalendarEvent;
use crate::classifier::Verdict;
use crate::runtime_config::ClassifierParams;
use crate::types::{Article, IngestMode};

// =============================================================================
// Router construction
// =============================================================================

/// Build the full REST API router with CORS middleware and shared state.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // ── Public ──────────────────────────────────────────────────
        .route("/api/v1/health", get(health))
        // ── Ingestion ───────────────────────────────────────────────
        .route("/api/v1/articles", post(submit_article))
        .route("/api/v1/articles/:id/sentiment", post(enrich_sentiment))
        // ── Consumer queries ────────────────────────────────────────
        .route("/api/v1/trust", get(cluster_trust))
        .route("/api/v1/clusters", get(clusters))
        .route("/api/v1/clusters/suspicious", get(suspicious))
        .route("/api/v1/clusters/high-confidence", get(high_confidence))
        .route("/api/v1/clusters/:fingerprint/history", get(cluster_history))
        // ── Collaborator feedback ───────────────────────────────────
        .route("/api/v1/credibility", get(credibility))
        .route("/api/v1/credibility/outcome", post(credibility_outcome))
        .route("/api/v1/credibility/flag", post(credibility_flag))
        .route("/api/v1/calendar", get(calendar_events))
        .route("/api/v1/calendar/events", post(calendar_upsert))
        // ── Operations ──────────────────────────────────────────────
        .route("/api/v1/state", get(full_state))
        .route("/api/v1/config/thresholds", get(get_thresholds))
        .route("/api/v1/config/thresholds", post(set_thresholds))
        .route("/api/v1/control/pause", post(control_pause))
        .route("/api/v1/control/resume", post(control_resume))
        // ── WebSocket (handled in ws module, mounted here) ──────────
        .route("/api/v1/ws", get(crate::api::ws::ws_handler))
        // ── Middleware & State ──────────────────────────────────────
        .layer(cors)
        .with_state(state)
}

// =============================================================================
// Health (public)
// =============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    state_version: u64,
    server_time: i64,
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let resp = HealthResponse {
        status: "ok",
        state_version: state.current_state_version(),
        server_time: Utc::now().timestamp_millis(),
    };
    Json(resp)
}

// =============================================================================
// Article submission (authenticated)
// =============================================================================

async fn submit_article(
    _auth: AuthBearer,
    State(state): State<Arc<AppState>>,
    Json(article): Json<Article>,
) -> impl IntoResponse {
    if state.runtime_config.read().ingest_mode == IngestMode::Paused {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({ "error": "ingestion is paused" })),
        );
    }

    if article.id.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": "article id must not be empty" })),
        );
    }

    match state.ingest_tx.try_send(article) {
        Ok(()) => (
            StatusCode::ACCEPTED,
            Json(serde_json::json!({ "queued": true })),
        ),
        Err(e) => {
            warn!(error = %e, "ingest queue full — article rejected");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({ "error": "ingest queue full, retry later" })),
            )
        }
    }
}

#[derive(Deserialize)]
struct SentimentUpdate {
    sentiment: f64,
}

/// Late-arriving sentiment enrichment for an already-ingested article.
async fn enrich_sentiment(
    _auth: AuthBearer,
    State(state): State<Arc<AppState>>,
    Path(article_id): Path<String>,
    Json(update): Json<SentimentUpdate>,
) -> impl IntoResponse {
    match state.repository.update_sentiment(&article_id, update.sentiment) {
        Ok(true) => {
            state.increment_version();
            (StatusCode::OK, Json(serde_json::json!({ "updated": true })))
        }
        Ok(false) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": format!("unknown article '{article_id}'") })),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": e.to_string() })),
        ),
    }
}

// =============================================================================
// Trust query (authenticated)
// =============================================================================

#[derive(Deserialize)]
struct TrustQuery {
    ticker: String,
    theme: String,
}

async fn cluster_trust(
    _auth: AuthBearer,
    State(state): State<Arc<AppState>>,
    Query(query): Query<TrustQuery>,
) -> impl IntoResponse {
    match state
        .cluster_manager
        .cluster_trust(&query.ticker, &query.theme, Utc::now())
    {
        Ok(Some(trust)) => Json(trust).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({
                "error": "no cluster for that ticker/theme",
            })),
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": e.to_string() })),
        )
            .into_response(),
    }
}

// =============================================================================
// Cluster listings (authenticated)
// =============================================================================

#[derive(Deserialize)]
struct ClustersQuery {
    #[serde(default = "default_limit")]
    limit: usize,
}

fn default_limit() -> usize {
    100
}

async fn clusters(
    _auth: AuthBearer,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ClustersQuery>,
) -> impl IntoResponse {
    match state.repository.list_recent(query.limit.min(500)) {
        Ok(list) => Json(list).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": e.to_string() })),
        )
            .into_response(),
    }
}

#[derive(Deserialize)]
struct SuspiciousQuery {
    #[serde(default)]
    within_cooling: bool,
}

async fn suspicious(
    _auth: AuthBearer,
    State(state): State<Arc<AppState>>,
    Query(query): Query<SuspiciousQuery>,
) -> impl IntoResponse {
    let verdicts = [
        Verdict::ManipulationAttack,
        Verdict::PrCampaign,
        Verdict::Watch,
    ];
    match state
        .repository
        .list_suspicious(&verdicts, query.within_cooling, Utc::now())
    {
        Ok(list) => Json(list).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": e.to_string() })),
        )
            .into_response(),
    }
}

#[derive(Deserialize)]
struct HighConfidenceQuery {
    #[serde(default = "default_min_multiplier")]
    min_multiplier: f64,
    #[serde(default = "default_within_hours")]
    within_hours: i64,
}

fn default_min_multiplier() -> f64 {
    1.1
}

fn default_within_hours() -> i64 {
    24
}

async fn high_confidence(
    _auth: AuthBearer,
    State(state): State<Arc<AppState>>,
    Query(query): Query<HighConfidenceQuery>,
) -> impl IntoResponse {
    let verdicts = [Verdict::OrganicConsensus, Verdict::EmbargoEvent];
    match state.repository.list_high_confidence(
        &verdicts,
        query.min_multiplier,
        query.within_hours,
        Utc::now(),
    ) {
        Ok(list) => Json(list).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": e.to_string() })),
        )
            .into_response(),
    }
}

async fn cluster_history(
    _auth: AuthBearer,
    State(state): State<Arc<AppState>>,
    Path(fingerprint): Path<String>,
) -> impl IntoResponse {
    let cluster = match state.repository.get_cluster(&fingerprint) {
        Ok(Some(c)) => c,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(serde_json::json!({ "error": "unknown cluster" })),
            )
                .into_response()
        }
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    };

    match state.repository.history(cluster.id) {
        Ok(history) => Json(serde_json::json!({
            "cluster": cluster,
            "history": history,
        }))
        .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": e.to_string() })),
        )
            .into_response(),
    }
}

// =============================================================================
// Credibility feedback (authenticated)
// =============================================================================

async fn credibility(_auth: AuthBearer, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.credibility.snapshot())
}

#[derive(Deserialize)]
struct OutcomeRequest {
    source: String,
    was_correct: bool,
}

async fn credibility_outcome(
    _auth: AuthBearer,
    State(state): State<Arc<AppState>>,
    Json(req): Json<OutcomeRequest>,
) -> impl IntoResponse {
    match state.credibility.record_outcome(&req.source, req.was_correct) {
        Some(updated) => {
            state.increment_version();
            Json(updated).into_response()
        }
        None => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({
                "error": format!("unknown source '{}'", req.source),
            })),
        )
            .into_response(),
    }
}

#[derive(Deserialize)]
struct FlagRequest {
    source: String,
    #[serde(default = "default_flag_tier")]
    tier: u8,
}

fn default_flag_tier() -> u8 {
    5
}

async fn credibility_flag(
    _auth: AuthBearer,
    State(state): State<Arc<AppState>>,
    Json(req): Json<FlagRequest>,
) -> impl IntoResponse {
    let updated = state.credibility.flag_manipulation(&req.source, req.tier);
    state.increment_version();
    Json(updated)
}

// =============================================================================
// Calendar (authenticated)
// =============================================================================

async fn calendar_events(
    _auth: AuthBearer,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    Json(state.calendar.snapshot())
}

async fn calendar_upsert(
    _auth: AuthBearer,
    State(state): State<Arc<AppState>>,
    Json(events): Json<Vec<EconomicCalendarEvent>>,
) -> impl IntoResponse {
    let count = state.calendar.upsert(events);
    state.increment_version();
    info!(count, "calendar events upserted via API");
    Json(serde_json::json!({ "upserted": count }))
}

// =============================================================================
// State snapshot + configuration (authenticated)
// =============================================================================

async fn full_state(_auth: AuthBearer, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.build_snapshot())
}

async fn get_thresholds(
    _auth: AuthBearer,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    Json(state.runtime_config.read().classifier.clone())
}

async fn set_thresholds(
    _auth: AuthBearer,
    State(state): State<Arc<AppState>>,
    Json(thresholds): Json<ClassifierParams>,
) -> impl IntoResponse {
    let config_clone = {
        let mut config = state.runtime_config.write();
        config.classifier = thresholds;
        config.clone()
    };

    // Save to disk (best-effort).
    if let Err(e) = config_clone.save("runtime_config.json") {
        warn!(error = %e, "failed to save thresholds to disk");
    }

    state.increment_version();
    info!("classifier thresholds updated via API");
    Json(config_clone.classifier)
}

// =============================================================================
// Control endpoints (authenticated)
// =============================================================================

#[derive(Serialize)]
struct ControlResponse {
    ingest_mode: IngestMode,
    message: String,
}

async fn control_pause(
    _auth: AuthBearer,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    {
        let mut config = state.runtime_config.write();
        config.ingest_mode = IngestMode::Paused;
    }
    state.increment_version();
    info!("Ingestion PAUSED via API");

    Json(ControlResponse {
        ingest_mode: IngestMode::Paused,
        message: "Ingestion paused".to_string(),
    })
}

async fn control_resume(
    _auth: AuthBearer,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    {
        let mut config = state.runtime_config.write();
        config.ingest_mode = IngestMode::Active;
    }
    state.increment_version();
    info!("Ingestion RESUMED via API");

    Json(ControlResponse {
        ingest_mode: IngestMode::Active,
        message: "Ingestion resumed".to_string(),
    })
}
