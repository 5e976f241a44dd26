// =============================================================================
// Runtime Configuration — Hot-reloadable engine settings with atomic save
// =============================================================================
//
// Central configuration hub for the Aegis news engine.  Every tunable
// parameter lives here so that classification policy can be re-tuned at
// runtime without a restart.
//
// Persistence uses an atomic tmp + rename pattern to prevent corruption on
// crash.  All fields carry `#[serde(default)]` so that adding new fields
// never breaks loading an older config file.
//
// The classifier thresholds default to the reviewed policy values; they are
// config fields (not constants) so they can be re-tuned from backtests
// against labelled manipulation cases.
//
// =============================================================================

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::types::IngestMode;

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_worker_count() -> usize {
    4
}

fn default_queue_capacity() -> usize {
    1024
}

fn default_di_organic_floor() -> f64 {
    0.6
}

fn default_di_attack_ceiling() -> f64 {
    0.3
}

fn default_ni_organic_floor() -> f64 {
    0.6
}

fn default_ni_attack_ceiling() -> f64 {
    0.3
}

fn default_ni_campaign_ceiling() -> f64 {
    0.4
}

fn default_tn_attack_ceiling() -> f64 {
    -0.5
}

fn default_tn_watch_ceiling() -> f64 {
    -0.2
}

fn default_el_confidence_floor() -> f64 {
    0.7
}

fn default_boundary_margin() -> f64 {
    0.05
}

fn default_attack_cooling_hours() -> i64 {
    24
}

fn default_watch_cooling_hours() -> i64 {
    4
}

fn default_organic_mean_gap_minutes() -> f64 {
    45.0
}

fn default_min_temporal_samples() -> usize {
    3
}

fn default_reference_weight_sum() -> f64 {
    6.0
}

fn default_calendar_lookback_hours() -> i64 {
    12
}

fn default_calendar_lookahead_hours() -> i64 {
    12
}

fn default_proximity_horizon_hours() -> i64 {
    6
}

fn default_calendar_refresh_secs() -> u64 {
    300
}

fn default_calendar_timeout_secs() -> u64 {
    10
}

fn default_cooling_sweep_secs() -> u64 {
    60
}

fn default_retention_sweep_secs() -> u64 {
    3600
}

fn default_retention_days() -> i64 {
    7
}

// =============================================================================
// ClassifierParams
// =============================================================================

/// Threshold table for the verdict classifier.
///
/// One field per cutoff in the decision rules, so that a policy change is a
/// config edit rather than a code change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierParams {
    /// Minimum DI for ORGANIC_CONSENSUS.
    #[serde(default = "default_di_organic_floor")]
    pub di_organic_floor: f64,

    /// Maximum DI for MANIPULATION_ATTACK.
    #[serde(default = "default_di_attack_ceiling")]
    pub di_attack_ceiling: f64,

    /// Minimum NI for ORGANIC_CONSENSUS.
    #[serde(default = "default_ni_organic_floor")]
    pub ni_organic_floor: f64,

    /// Maximum NI for MANIPULATION_ATTACK.
    #[serde(default = "default_ni_attack_ceiling")]
    pub ni_attack_ceiling: f64,

    /// Maximum NI for PR_CAMPAIGN.
    #[serde(default = "default_ni_campaign_ceiling")]
    pub ni_campaign_ceiling: f64,

    /// Maximum TN for MANIPULATION_ATTACK.
    #[serde(default = "default_tn_attack_ceiling")]
    pub tn_attack_ceiling: f64,

    /// TN at or below which a cluster lands in WATCH.
    #[serde(default = "default_tn_watch_ceiling")]
    pub tn_watch_ceiling: f64,

    /// Minimum EL confidence for EMBARGO_EVENT.
    #[serde(default = "default_el_confidence_floor")]
    pub el_confidence_floor: f64,

    /// Distance from any governing threshold that counts as "near the
    /// boundary" for the WATCH rule.
    #[serde(default = "default_boundary_margin")]
    pub boundary_margin: f64,

    /// Quarantine duration after MANIPULATION_ATTACK.
    #[serde(default = "default_attack_cooling_hours")]
    pub attack_cooling_hours: i64,

    /// Quarantine duration after WATCH.
    #[serde(default = "default_watch_cooling_hours")]
    pub watch_cooling_hours: i64,
}

impl Default for ClassifierParams {
    fn default() -> Self {
        Self {
            di_organic_floor: default_di_organic_floor(),
            di_attack_ceiling: default_di_attack_ceiling(),
            ni_organic_floor: default_ni_organic_floor(),
            ni_attack_ceiling: default_ni_attack_ceiling(),
            ni_campaign_ceiling: default_ni_campaign_ceiling(),
            tn_attack_ceiling: default_tn_attack_ceiling(),
            tn_watch_ceiling: default_tn_watch_ceiling(),
            el_confidence_floor: default_el_confidence_floor(),
            boundary_margin: default_boundary_margin(),
            attack_cooling_hours: default_attack_cooling_hours(),
            watch_cooling_hours: default_watch_cooling_hours(),
        }
    }
}

// =============================================================================
// SignalParams
// =============================================================================

/// Tunables for the raw signal computations (DI / TN).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalParams {
    /// Mean inter-article gap (minutes) considered fully organic pacing.
    #[serde(default = "default_organic_mean_gap_minutes")]
    pub organic_mean_gap_minutes: f64,

    /// Minimum timestamped articles before TN is computed at all.
    /// Below this, TN is neutral (0.0).
    #[serde(default = "default_min_temporal_samples")]
    pub min_temporal_samples: usize,

    /// Total credibility weight at which DI's breadth term saturates.
    #[serde(default = "default_reference_weight_sum")]
    pub reference_weight_sum: f64,
}

impl Default for SignalParams {
    fn default() -> Self {
        Self {
            organic_mean_gap_minutes: default_organic_mean_gap_minutes(),
            min_temporal_samples: default_min_temporal_samples(),
            reference_weight_sum: default_reference_weight_sum(),
        }
    }
}

// =============================================================================
// CalendarParams
// =============================================================================

/// Economic-calendar matching and collection tunables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarParams {
    /// Hours before a cluster's first_seen to search for scheduled events.
    #[serde(default = "default_calendar_lookback_hours")]
    pub lookback_hours: i64,

    /// Hours after a cluster's last_seen to search for scheduled events.
    #[serde(default = "default_calendar_lookahead_hours")]
    pub lookahead_hours: i64,

    /// Distance (hours) from the scheduled time at which match confidence
    /// falls to zero.
    #[serde(default = "default_proximity_horizon_hours")]
    pub proximity_horizon_hours: i64,

    /// Optional HTTP feed to refresh the event store from. When unset, the
    /// store is populated solely via the calendar upsert endpoint.
    #[serde(default)]
    pub feed_url: Option<String>,

    /// Seconds between collector refreshes.
    #[serde(default = "default_calendar_refresh_secs")]
    pub refresh_secs: u64,

    /// HTTP timeout for a single collector fetch.
    #[serde(default = "default_calendar_timeout_secs")]
    pub fetch_timeout_secs: u64,
}

impl Default for CalendarParams {
    fn default() -> Self {
        Self {
            lookback_hours: default_calendar_lookback_hours(),
            lookahead_hours: default_calendar_lookahead_hours(),
            proximity_horizon_hours: default_proximity_horizon_hours(),
            feed_url: None,
            refresh_secs: default_calendar_refresh_secs(),
            fetch_timeout_secs: default_calendar_timeout_secs(),
        }
    }
}

// =============================================================================
// RuntimeConfig
// =============================================================================

/// Top-level runtime configuration for the Aegis engine.
///
/// Every field has a serde default so that older JSON files missing new
/// fields will still deserialise correctly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    // --- Operational mode ----------------------------------------------------

    /// Whether the ingest endpoint is accepting articles.
    #[serde(default)]
    pub ingest_mode: IngestMode,

    // --- Ingestion pool ------------------------------------------------------

    /// Number of concurrent ingest workers.
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,

    /// Bounded capacity of the ingest queue.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    // --- Policy --------------------------------------------------------------

    /// Verdict classifier threshold table.
    #[serde(default)]
    pub classifier: ClassifierParams,

    /// Raw signal tunables.
    #[serde(default)]
    pub signals: SignalParams,

    /// Calendar matching and collection.
    #[serde(default)]
    pub calendar: CalendarParams,

    // --- Background sweeps ---------------------------------------------------

    /// Seconds between cooling decay sweeps.
    #[serde(default = "default_cooling_sweep_secs")]
    pub cooling_sweep_secs: u64,

    /// Seconds between retention cleanup sweeps.
    #[serde(default = "default_retention_sweep_secs")]
    pub retention_sweep_secs: u64,

    /// Clusters idle longer than this many days are garbage-collected.
    #[serde(default = "default_retention_days")]
    pub retention_days: i64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            ingest_mode: IngestMode::Active,
            worker_count: default_worker_count(),
            queue_capacity: default_queue_capacity(),
            classifier: ClassifierParams::default(),
            signals: SignalParams::default(),
            calendar: CalendarParams::default(),
            cooling_sweep_secs: default_cooling_sweep_secs(),
            retention_sweep_secs: default_retention_sweep_secs(),
            retention_days: default_retention_days(),
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// If the file does not exist, returns an error so the caller can fall
    /// back to defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read runtime config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse runtime config from {}", path.display()))?;

        info!(
            path = %path.display(),
            ingest_mode = %config.ingest_mode,
            workers = config.worker_count,
            "runtime config loaded"
        );

        Ok(config)
    }

    /// Persist the current configuration to `path` using an atomic write
    /// (write to `.tmp`, then rename).
    ///
    /// This prevents corruption if the process crashes mid-write.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content = serde_json::to_string_pretty(self)
            .context("failed to serialise runtime config to JSON")?;

        // Atomic write: write to a temporary sibling file, then rename.
        let tmp_path = path.with_extension("json.tmp");

        std::fs::write(&tmp_path, &content)
            .with_context(|| format!("failed to write tmp config to {}", tmp_path.display()))?;

        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("failed to rename tmp config to {}", path.display()))?;

        info!(path = %path.display(), "runtime config saved (atomic)");
        Ok(())
    }
}
