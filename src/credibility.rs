// =============================================================================
// Source Credibility Registry — per-publisher trust weights
// =============================================================================
//
// Weights seed from the publisher tier and drift toward a target derived
// from the source's historical accuracy as the outcome-scoring process
// reports back. A manipulation flag applies an immediate halving penalty.
//
// Read-heavy, write-rare: signal computation reads weights on every
// recompute, feedback arrives occasionally. All state is behind a
// `parking_lot::RwLock` so concurrent readers never block ingestion.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{info, warn};

/// Fraction of the distance to the accuracy-derived target applied per
/// outcome report.
const WEIGHT_NUDGE_ALPHA: f64 = 0.2;

/// Multiplier applied to the weight when a source is flagged for
/// manipulation.
const MANIPULATION_PENALTY: f64 = 0.5;

/// Weights never fall below this floor.
const WEIGHT_FLOOR: f64 = 0.1;

/// Tracked credibility state for a single publisher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceCredibility {
    pub source: String,
    /// Publisher tier, 1 (wire service) .. 5 (unvetted aggregator).
    pub tier: u8,
    pub total_signals: u64,
    pub correct_signals: u64,
    /// correct_signals / total_signals, 0.0 before any feedback.
    pub accuracy_rate: f64,
    pub manipulation_flags: u32,
    pub credibility_weight: f64,
}

/// Seed weight for a publisher tier.
pub fn tier_seed_weight(tier: u8) -> f64 {
    match tier {
        1 => 2.0,
        2 => 1.5,
        3 => 1.0,
        4 => 0.75,
        _ => 0.5,
    }
}

/// Thread-safe registry of per-source credibility state.
pub struct CredibilityRegistry {
    sources: RwLock<HashMap<String, SourceCredibility>>,
}

impl CredibilityRegistry {
    pub fn new() -> Self {
        Self {
            sources: RwLock::new(HashMap::new()),
        }
    }

    /// Current weight for `source`. Unknown sources get their tier seed
    /// without inserting a record, so the read path never takes the write
    /// lock.
    pub fn weight_of(&self, source: &str, tier: u8) -> f64 {
        let sources = self.sources.read();
        sources
            .get(source)
            .map(|s| s.credibility_weight)
            .unwrap_or_else(|| tier_seed_weight(tier))
    }

    /// Ensure a record exists for `source`, seeding it from `tier` on first
    /// sight. Called on article ingest so that feedback later has a record
    /// to land on.
    pub fn observe(&self, source: &str, tier: u8) {
        let mut sources = self.sources.write();
        sources.entry(source.to_string()).or_insert_with(|| {
            SourceCredibility {
                source: source.to_string(),
                tier,
                total_signals: 0,
                correct_signals: 0,
                accuracy_rate: 0.0,
                manipulation_flags: 0,
                credibility_weight: tier_seed_weight(tier),
            }
        });
    }

    /// Record the outcome of a past signal attributed to `source`.
    ///
    /// Updates the accuracy counters and nudges the weight a fraction of the
    /// way toward `0.5 + 1.5 * accuracy_rate`, so a consistently-correct
    /// source converges on the tier-1 seed and a consistently-wrong one on
    /// the tier-5 seed regardless of its starting tier.
    pub fn record_outcome(&self, source: &str, was_correct: bool) -> Option<SourceCredibility> {
        let mut sources = self.sources.write();
        let entry = match sources.get_mut(source) {
            Some(e) => e,
            None => {
                warn!(source, "outcome reported for unknown source — ignored");
                return None;
            }
        };

        entry.total_signals += 1;
        if was_correct {
            entry.correct_signals += 1;
        }
        entry.accuracy_rate = entry.correct_signals as f64 / entry.total_signals as f64;

        let target = 0.5 + 1.5 * entry.accuracy_rate;
        entry.credibility_weight += (target - entry.credibility_weight) * WEIGHT_NUDGE_ALPHA;
        entry.credibility_weight = entry.credibility_weight.max(WEIGHT_FLOOR);

        info!(
            source,
            was_correct,
            accuracy = format!("{:.3}", entry.accuracy_rate),
            weight = format!("{:.3}", entry.credibility_weight),
            "source outcome recorded"
        );

        Some(entry.clone())
    }

    /// Flag `source` for suspected manipulation: increments the counter and
    /// halves the weight immediately (floored).
    pub fn flag_manipulation(&self, source: &str, tier: u8) -> SourceCredibility {
        let mut sources = self.sources.write();
        let entry = sources.entry(source.to_string()).or_insert_with(|| {
            SourceCredibility {
                source: source.to_string(),
                tier,
                total_signals: 0,
                correct_signals: 0,
                accuracy_rate: 0.0,
                manipulation_flags: 0,
                credibility_weight: tier_seed_weight(tier),
            }
        });

        entry.manipulation_flags += 1;
        entry.credibility_weight =
            (entry.credibility_weight * MANIPULATION_PENALTY).max(WEIGHT_FLOOR);

        warn!(
            source,
            flags = entry.manipulation_flags,
            weight = format!("{:.3}", entry.credibility_weight),
            "source flagged for manipulation"
        );

        entry.clone()
    }

    /// Snapshot of every tracked source, sorted by descending weight.
    pub fn snapshot(&self) -> Vec<SourceCredibility> {
        let sources = self.sources.read();
        let mut all: Vec<SourceCredibility> = sources.values().cloned().collect();
        all.sort_by(|a, b| {
            b.credibility_weight
                .partial_cmp(&a.credibility_weight)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        all
    }
}

impl Default for CredibilityRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_seeds_descend() {
        assert!((tier_seed_weight(1) - 2.0).abs() < f64::EPSILON);
        assert!((tier_seed_weight(2) - 1.5).abs() < f64::EPSILON);
        assert!((tier_seed_weight(3) - 1.0).abs() < f64::EPSILON);
        assert!((tier_seed_weight(4) - 0.75).abs() < f64::EPSILON);
        assert!((tier_seed_weight(5) - 0.5).abs() < f64::EPSILON);
        // Out-of-range tiers collapse to the lowest seed.
        assert!((tier_seed_weight(9) - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn unknown_source_returns_tier_seed() {
        let reg = CredibilityRegistry::new();
        assert!((reg.weight_of("reuters", 1) - 2.0).abs() < f64::EPSILON);
        assert!((reg.weight_of("pump-blog", 5) - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn correct_outcomes_raise_weight_toward_target() {
        let reg = CredibilityRegistry::new();
        reg.observe("smallcap-wire", 4);
        let start = reg.weight_of("smallcap-wire", 4);

        for _ in 0..20 {
            reg.record_outcome("smallcap-wire", true);
        }

        let after = reg.weight_of("smallcap-wire", 4);
        assert!(after > start, "weight should rise: {start} -> {after}");
        // Converging on the perfect-accuracy target of 2.0.
        assert!(after > 1.8, "expected near 2.0, got {after}");
    }

    #[test]
    fn wrong_outcomes_lower_weight() {
        let reg = CredibilityRegistry::new();
        reg.observe("bigwire", 1);

        for _ in 0..20 {
            reg.record_outcome("bigwire", false);
        }

        let after = reg.weight_of("bigwire", 1);
        // Converging on the zero-accuracy target of 0.5.
        assert!(after < 0.7, "expected near 0.5, got {after}");
    }

    #[test]
    fn outcome_for_unknown_source_is_ignored() {
        let reg = CredibilityRegistry::new();
        assert!(reg.record_outcome("ghost", true).is_none());
    }

    #[test]
    fn manipulation_flag_halves_weight() {
        let reg = CredibilityRegistry::new();
        reg.observe("sketchy", 3);
        let state = reg.flag_manipulation("sketchy", 3);
        assert_eq!(state.manipulation_flags, 1);
        assert!((state.credibility_weight - 0.5).abs() < f64::EPSILON);

        // Repeated flags keep halving down to the floor.
        for _ in 0..10 {
            reg.flag_manipulation("sketchy", 3);
        }
        let w = reg.weight_of("sketchy", 3);
        assert!((w - 0.1).abs() < f64::EPSILON);
    }

    #[test]
    fn accuracy_rate_tracks_counts() {
        let reg = CredibilityRegistry::new();
        reg.observe("mixed", 2);
        reg.record_outcome("mixed", true);
        reg.record_outcome("mixed", true);
        let state = reg.record_outcome("mixed", false).unwrap();
        assert_eq!(state.total_signals, 3);
        assert_eq!(state.correct_signals, 2);
        assert!((state.accuracy_rate - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn snapshot_sorted_by_weight() {
        let reg = CredibilityRegistry::new();
        reg.observe("low", 5);
        reg.observe("high", 1);
        let snap = reg.snapshot();
        assert_eq!(snap.len(), 2);
        assert_eq!(snap[0].source, "high");
        assert_eq!(snap[1].source, "low");
    }
}
