// =============================================================================
// Central Application State — Aegis News Sentinel
// =============================================================================
//
// The single source of truth for the engine. Subsystems hold Arc references
// to their own state; AppState ties them together and provides a unified
// snapshot for the dashboard API and WebSocket feed.
//
// Thread safety:
//   - Atomic counters for lock-free version tracking.
//   - parking_lot::RwLock for the mutable shared collections.
//   - Arc wrappers for subsystem engines that manage their own interior
//     mutability.
// =============================================================================

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use parking_lot::RwLock;
use serde::Serialize;
use tokio::sync::mpsc;

use crate::calendar::{CalendarStore, EconomicCalendarEvent};
use crate::classifier::Verdict;
use crate::cluster::ClusterManager;
use crate::credibility::{CredibilityRegistry, SourceCredibility};
use crate::repository::{ClusterRecord, ClusterRepository, MemoryRepository};
use crate::runtime_config::RuntimeConfig;
use crate::types::{Article, IngestMode};

// =============================================================================
// Error Record
// =============================================================================

/// A recorded error event for the dashboard error log.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorRecord {
    /// Human-readable error message.
    pub message: String,
    /// ISO 8601 timestamp.
    pub at: String,
}

// =============================================================================
// AppState
// =============================================================================

/// Maximum number of recent errors to retain.
const MAX_RECENT_ERRORS: usize = 50;
/// Clusters included in a snapshot.
const SNAPSHOT_CLUSTER_LIMIT: usize = 50;

/// Central application state shared across all async tasks via
/// `Arc<AppState>`.
pub struct AppState {
    // ── Version tracking ────────────────────────────────────────────────
    /// Monotonically increasing version counter. Incremented on every
    /// meaningful state mutation; the WebSocket feed uses it to detect
    /// changes and push updates.
    pub state_version: AtomicU64,

    /// WebSocket message sequence number (incremented per message sent).
    pub ws_sequence_number: AtomicU64,

    // ── Configuration ───────────────────────────────────────────────────
    pub runtime_config: Arc<RwLock<RuntimeConfig>>,

    // ── Engine subsystems ───────────────────────────────────────────────
    pub repository: Arc<dyn ClusterRepository>,
    pub credibility: Arc<CredibilityRegistry>,
    pub calendar: Arc<CalendarStore>,
    pub cluster_manager: Arc<ClusterManager>,

    // ── Ingest queue ────────────────────────────────────────────────────
    pub ingest_tx: mpsc::Sender<Article>,
    pub ingested_total: AtomicU64,
    pub dropped_total: AtomicU64,

    // ── Error Log ───────────────────────────────────────────────────────
    pub recent_errors: RwLock<Vec<ErrorRecord>>,

    // ── Timing ──────────────────────────────────────────────────────────
    /// Instant when the engine was started. Used for uptime calculations.
    pub start_time: std::time::Instant,
}

impl AppState {
    /// Construct the full engine state from the given runtime configuration.
    ///
    /// Returns the state plus the receiving half of the ingest queue, which
    /// the caller hands to the worker pool.
    pub fn new(config: RuntimeConfig) -> (Self, mpsc::Receiver<Article>) {
        let (ingest_tx, ingest_rx) = mpsc::channel(config.queue_capacity.max(1));

        let runtime_config = Arc::new(RwLock::new(config));
        let repository: Arc<dyn ClusterRepository> = Arc::new(MemoryRepository::new());
        let credibility = Arc::new(CredibilityRegistry::new());
        let calendar = Arc::new(CalendarStore::new());
        let cluster_manager = Arc::new(ClusterManager::new(
            repository.clone(),
            credibility.clone(),
            calendar.clone(),
            runtime_config.clone(),
        ));

        let state = Self {
            state_version: AtomicU64::new(1),
            ws_sequence_number: AtomicU64::new(0),
            runtime_config,
            repository,
            credibility,
            calendar,
            cluster_manager,
            ingest_tx,
            ingested_total: AtomicU64::new(0),
            dropped_total: AtomicU64::new(0),
            recent_errors: RwLock::new(Vec::new()),
            start_time: std::time::Instant::now(),
        };

        (state, ingest_rx)
    }

    // ── Version Management ──────────────────────────────────────────────

    /// Atomically increment the state version. Call after every meaningful
    /// mutation to signal WebSocket clients that fresh data is available.
    pub fn increment_version(&self) -> u64 {
        self.state_version.fetch_add(1, Ordering::SeqCst)
    }

    /// Read the current state version without modifying it.
    pub fn current_state_version(&self) -> u64 {
        self.state_version.load(Ordering::SeqCst)
    }

    // ── Error Logging ───────────────────────────────────────────────────

    /// Record an error message. The ring buffer is capped at
    /// [`MAX_RECENT_ERRORS`]; oldest entries are evicted when the limit is
    /// reached.
    pub fn push_error(&self, msg: String) {
        let record = ErrorRecord {
            message: msg,
            at: Utc::now().to_rfc3339(),
        };

        let mut errors = self.recent_errors.write();
        errors.push(record);
        while errors.len() > MAX_RECENT_ERRORS {
            errors.remove(0);
        }

        self.increment_version();
    }

    // ── Snapshot Builder ────────────────────────────────────────────────

    /// Build a complete, serialisable snapshot of the engine state.
    ///
    /// This is the payload sent to the dashboard via the REST
    /// `GET /api/v1/state` endpoint and the WebSocket push feed.
    pub fn build_snapshot(&self) -> EngineSnapshot {
        let now = Utc::now();
        let config = self.runtime_config.read();
        let version = self.current_state_version();

        let truth = TruthHeader {
            ingest_mode: config.ingest_mode,
            ingested_total: self.ingested_total.load(Ordering::Relaxed),
            dropped_total: self.dropped_total.load(Ordering::Relaxed),
            queue_free: self.ingest_tx.capacity() as u64,
            uptime_secs: self.start_time.elapsed().as_secs(),
            state_version: version,
            ws_sequence_number: self.ws_sequence_number.load(Ordering::Relaxed),
            server_time: now.timestamp_millis(),
        };

        let clusters = self
            .repository
            .list_recent(SNAPSHOT_CLUSTER_LIMIT)
            .unwrap_or_default();

        let suspicious = self
            .repository
            .list_suspicious(
                &[Verdict::ManipulationAttack, Verdict::PrCampaign, Verdict::Watch],
                false,
                now,
            )
            .unwrap_or_default();

        let (cluster_count, article_count, history_count) =
            self.repository.counts().unwrap_or((0, 0, 0));

        EngineSnapshot {
            state_version: version,
            server_time: now.timestamp_millis(),
            truth,
            clusters,
            suspicious,
            credibility: self.credibility.snapshot(),
            calendar_events: self.calendar.snapshot(),
            recent_errors: self.recent_errors.read().clone(),
            store_stats: StoreStats {
                cluster_count,
                article_count,
                history_count,
            },
        }
    }
}

// =============================================================================
// Serialisable snapshot types
// =============================================================================

/// Full engine state snapshot sent to the dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct EngineSnapshot {
    pub state_version: u64,
    pub server_time: i64,
    pub truth: TruthHeader,
    pub clusters: Vec<ClusterRecord>,
    pub suspicious: Vec<ClusterRecord>,
    pub credibility: Vec<SourceCredibility>,
    pub calendar_events: Vec<EconomicCalendarEvent>,
    pub recent_errors: Vec<ErrorRecord>,
    pub store_stats: StoreStats,
}

/// Operational truth header — the dashboard's primary status banner.
#[derive(Debug, Clone, Serialize)]
pub struct TruthHeader {
    pub ingest_mode: IngestMode,
    pub ingested_total: u64,
    pub dropped_total: u64,
    /// Remaining slots in the bounded ingest queue.
    pub queue_free: u64,
    pub uptime_secs: u64,
    pub state_version: u64,
    pub ws_sequence_number: u64,
    pub server_time: i64,
}

/// Repository cardinalities for the dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct StoreStats {
    pub cluster_count: usize,
    pub article_count: usize,
    pub history_count: usize,
}
