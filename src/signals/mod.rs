// =============================================================================
// Signal Computation Engine — the four cluster trust signals
// =============================================================================
//
// Derives the current DI / TN / NI / EL values from a cluster's article set
// plus read-only collaborator lookups:
//
//   DI — Diversity Integrity      (credibility-weighted source evenness)
//   TN — Temporal Naturalness     (arrival pacing vs organic diffusion)
//   NI — Narrative Independence   (pairwise wording dissimilarity)
//   EL — Event Legitimacy         (scheduled-calendar explanation)
//
// Recomputation is deterministic and idempotent: identical article sets and
// an identical `now` always yield identical values. No ambient clock reads,
// no randomness.

pub mod diversity;
pub mod narrative;
pub mod temporal;

pub use diversity::diversity_integrity;
pub use narrative::narrative_independence;
pub use temporal::temporal_naturalness;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::calendar::{CalendarStore, ElMatch};
use crate::credibility::CredibilityRegistry;
use crate::repository::ArticleRecord;
use crate::runtime_config::{CalendarParams, SignalParams};

/// The four signals for one cluster at one recompute.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalSet {
    /// Diversity Integrity, [0, 1].
    pub di: f64,
    /// Temporal Naturalness, [-1, 1].
    pub tn: f64,
    /// Narrative Independence, [0, 1].
    pub ni: f64,
    /// Event Legitimacy match.
    pub el: ElMatch,
}

/// Recompute all four signals from the cluster's current article set.
///
/// `now` is passed in explicitly for TN-window normalization; article
/// timestamps are the only other time inputs.
pub fn compute_signals(
    articles: &[ArticleRecord],
    registry: &CredibilityRegistry,
    calendar: &CalendarStore,
    ticker: &str,
    first_seen: DateTime<Utc>,
    last_seen: DateTime<Utc>,
    now: DateTime<Utc>,
    signal_params: &SignalParams,
    calendar_params: &CalendarParams,
) -> SignalSet {
    // DI over credibility-weighted source samples.
    let samples: Vec<(&str, f64)> = articles
        .iter()
        .map(|a| {
            (
                a.source.as_str(),
                registry.weight_of(&a.source, a.source_tier),
            )
        })
        .collect();
    let di = diversity_integrity(&samples, signal_params.reference_weight_sum);

    // TN over the timestamped subset only (malformed articles are excluded
    // from temporal scoring but still count everywhere else).
    let published: Vec<DateTime<Utc>> = articles.iter().filter_map(|a| a.published_at).collect();
    let tn = temporal_naturalness(
        &published,
        now,
        signal_params.organic_mean_gap_minutes,
        signal_params.min_temporal_samples,
    );

    // NI over title + summary wording.
    let texts: Vec<String> = articles
        .iter()
        .map(|a| format!("{} {}", a.title, a.summary))
        .collect();
    let ni = narrative_independence(&texts);

    // EL against the scheduled calendar.
    let el = calendar.matches(ticker, first_seen, last_seen, calendar_params);

    SignalSet { di, tn, ni, el }
}

/// News Fraud Probability Index, [0, 100]. Audit/reporting only — never an
/// input to classification.
pub fn nfpi(signals: &SignalSet) -> f64 {
    let trust = 0.3 * signals.di
        + 0.3 * signals.ni
        + 0.2 * signals.el.confidence
        + 0.2 * signals.tn.max(0.0);
    (100.0 * (1.0 - trust)).clamp(0.0, 100.0)
}
