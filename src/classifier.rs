// =============================================================================
// Verdict Classifier — deterministic signals -> trust verdict policy
// =============================================================================
//
// Maps the four current signals plus the article count onto a closed verdict
// enum. First matching rule wins:
//
//   1. article_count < 2                          -> PENDING
//   2. el_matched && el_confidence >= floor       -> EMBARGO_EVENT
//   3. di >= floor && ni >= floor && tn >= 0      -> ORGANIC_CONSENSUS
//   4. di <= cap && tn <= cap && ni <= cap && !el -> MANIPULATION_ATTACK
//   5. ni <= cap && tn < 0 && !el                 -> PR_CAMPAIGN
//   6. tn <= watch cap, or near any boundary      -> WATCH
//   7. else                                       -> NOISE
//
// The rule table is the single source of truth for verdicts: no verdict
// string exists anywhere else in the codebase. Classification is a pure
// function of its inputs — re-running on an unchanged tuple yields an
// identical outcome, reason included.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::runtime_config::ClassifierParams;
use crate::signals::{nfpi, SignalSet};

// =============================================================================
// Verdict
// =============================================================================

/// Categorical trust judgment for a cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    Pending,
    Noise,
    Watch,
    EmbargoEvent,
    OrganicConsensus,
    PrCampaign,
    ManipulationAttack,
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Noise => write!(f, "NOISE"),
            Self::Watch => write!(f, "WATCH"),
            Self::EmbargoEvent => write!(f, "EMBARGO_EVENT"),
            Self::OrganicConsensus => write!(f, "ORGANIC_CONSENSUS"),
            Self::PrCampaign => write!(f, "PR_CAMPAIGN"),
            Self::ManipulationAttack => write!(f, "MANIPULATION_ATTACK"),
        }
    }
}

// =============================================================================
// ClassifierOutcome
// =============================================================================

/// Full result of one classification pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierOutcome {
    pub verdict: Verdict,
    /// Which rule fired and the values that triggered it.
    pub reason: String,
    /// [0, 2] scaling factor for downstream signal consumers.
    pub confidence_multiplier: f64,
    /// [0, 1] suppression strength while quarantined.
    pub cooling_intensity: f64,
    /// End of the quarantine window; Some iff cooling_intensity > 0.
    pub cooling_until: Option<DateTime<Utc>>,
    /// News Fraud Probability Index, [0, 100], audit only.
    pub nfpi: f64,
}

// =============================================================================
// Classification
// =============================================================================

/// Classify a cluster from its current signals.
///
/// `now` anchors the cooling windows and is supplied by the caller — the
/// classifier itself never reads the clock.
pub fn classify(
    signals: &SignalSet,
    article_count: u32,
    now: DateTime<Utc>,
    params: &ClassifierParams,
) -> ClassifierOutcome {
    let SignalSet { di, tn, ni, el } = signals;
    let (di, tn, ni) = (*di, *tn, *ni);
    let index = nfpi(signals);

    // Rule 1: insufficient evidence.
    if article_count < 2 {
        return ClassifierOutcome {
            verdict: Verdict::Pending,
            reason: format!("insufficient evidence: article_count={article_count}"),
            confidence_multiplier: 1.0,
            cooling_intensity: 0.0,
            cooling_until: None,
            nfpi: index,
        };
    }

    // Rule 2: a scheduled event explains the burst, however compressed.
    if el.matched && el.confidence >= params.el_confidence_floor {
        let event = el.event_name.as_deref().unwrap_or("scheduled event");
        return ClassifierOutcome {
            verdict: Verdict::EmbargoEvent,
            reason: format!(
                "scheduled event '{}' explains burst (el_confidence={:.2})",
                event, el.confidence
            ),
            confidence_multiplier: (1.0 + 0.5 * el.confidence).min(2.0),
            cooling_intensity: 0.0,
            cooling_until: None,
            nfpi: index,
        };
    }

    // Rule 3: diverse, independently-worded, naturally-paced corroboration.
    if di >= params.di_organic_floor && ni >= params.ni_organic_floor && tn >= 0.0 {
        let boost = ((di + ni) / 2.0 - 0.5).min(0.5);
        return ClassifierOutcome {
            verdict: Verdict::OrganicConsensus,
            reason: format!("organic consensus: di={di:.2} ni={ni:.2} tn={tn:.2}"),
            confidence_multiplier: (1.0 + boost).clamp(0.0, 2.0),
            cooling_intensity: 0.0,
            cooling_until: None,
            nfpi: index,
        };
    }

    // Rule 4: concentrated, synchronized, templated, with no calendar cover.
    if di <= params.di_attack_ceiling
        && tn <= params.tn_attack_ceiling
        && ni <= params.ni_attack_ceiling
        && !el.matched
    {
        return ClassifierOutcome {
            verdict: Verdict::ManipulationAttack,
            reason: format!(
                "manipulation attack: di={di:.2} tn={tn:.2} ni={ni:.2}, no calendar match"
            ),
            confidence_multiplier: (0.2 * di).max(0.0),
            cooling_intensity: 1.0,
            cooling_until: Some(now + Duration::hours(params.attack_cooling_hours)),
            nfpi: index,
        };
    }

    // Rule 5: templated and synchronized but not severe enough for rule 4 —
    // promotional placement, not malicious. Never boosted, never quarantined.
    if ni <= params.ni_campaign_ceiling && tn < 0.0 && !el.matched {
        return ClassifierOutcome {
            verdict: Verdict::PrCampaign,
            reason: format!("templated campaign: ni={ni:.2} tn={tn:.2}, no calendar match"),
            confidence_multiplier: 1.0,
            cooling_intensity: 0.0,
            cooling_until: None,
            nfpi: index,
        };
    }

    // Rule 6: temporal stress or a score hovering at a decision boundary.
    if tn <= params.tn_watch_ceiling {
        return watch_outcome(
            format!("temporal stress: tn={tn:.2}"),
            now,
            params,
            index,
        );
    }
    if let Some(boundary) = nearest_boundary(di, tn, ni, el.matched, el.confidence, params) {
        return watch_outcome(
            format!("near decision boundary: {boundary}"),
            now,
            params,
            index,
        );
    }

    // Rule 7: totality — everything else is unremarkable noise.
    ClassifierOutcome {
        verdict: Verdict::Noise,
        reason: format!("no pattern: di={di:.2} ni={ni:.2} tn={tn:.2}"),
        confidence_multiplier: 1.0,
        cooling_intensity: 0.0,
        cooling_until: None,
        nfpi: index,
    }
}

fn watch_outcome(
    reason: String,
    now: DateTime<Utc>,
    params: &ClassifierParams,
    index: f64,
) -> ClassifierOutcome {
    ClassifierOutcome {
        verdict: Verdict::Watch,
        reason,
        confidence_multiplier: 1.0,
        cooling_intensity: 0.3,
        cooling_until: Some(now + Duration::hours(params.watch_cooling_hours)),
        nfpi: index,
    }
}

/// Describe the first governing threshold a score sits within the boundary
/// margin of, if any.
fn nearest_boundary(
    di: f64,
    tn: f64,
    ni: f64,
    el_matched: bool,
    el_confidence: f64,
    params: &ClassifierParams,
) -> Option<String> {
    let margin = params.boundary_margin;
    let near = |value: f64, threshold: f64| (value - threshold).abs() <= margin;

    if near(di, params.di_organic_floor) || near(di, params.di_attack_ceiling) {
        return Some(format!("di={di:.2}"));
    }
    if near(ni, params.ni_organic_floor)
        || near(ni, params.ni_attack_ceiling)
        || near(ni, params.ni_campaign_ceiling)
    {
        return Some(format!("ni={ni:.2}"));
    }
    if near(tn, 0.0) || near(tn, params.tn_attack_ceiling) || near(tn, params.tn_watch_ceiling) {
        return Some(format!("tn={tn:.2}"));
    }
    if el_matched && near(el_confidence, params.el_confidence_floor) {
        return Some(format!("el_confidence={el_confidence:.2}"));
    }
    None
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::ElMatch;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap()
    }

    fn params() -> ClassifierParams {
        ClassifierParams::default()
    }

    fn set(di: f64, tn: f64, ni: f64) -> SignalSet {
        SignalSet {
            di,
            tn,
            ni,
            el: ElMatch::none(),
        }
    }

    fn set_with_event(di: f64, tn: f64, ni: f64, confidence: f64) -> SignalSet {
        SignalSet {
            di,
            tn,
            ni,
            el: ElMatch {
                matched: true,
                confidence,
                event_name: Some("AAPL earnings release".to_string()),
            },
        }
    }

    #[test]
    fn single_article_is_pending() {
        let out = classify(&set(0.0, 0.0, 1.0), 1, now(), &params());
        assert_eq!(out.verdict, Verdict::Pending);
        assert!((out.confidence_multiplier - 1.0).abs() < f64::EPSILON);
        assert!(out.cooling_until.is_none());
    }

    #[test]
    fn pending_even_with_attack_signals() {
        // article_count < 2 wins over everything.
        let out = classify(&set(0.0, -1.0, 0.0), 1, now(), &params());
        assert_eq!(out.verdict, Verdict::Pending);
    }

    #[test]
    fn scheduled_event_overrides_burst() {
        // Heavily synchronized, but an earnings release explains it.
        let out = classify(&set_with_event(0.2, -0.9, 0.2, 0.9), 4, now(), &params());
        assert_eq!(out.verdict, Verdict::EmbargoEvent);
        assert!((out.confidence_multiplier - 1.45).abs() < 1e-9);
        assert!(out.cooling_until.is_none());
        assert!(out.reason.contains("AAPL earnings release"));
    }

    #[test]
    fn embargo_multiplier_caps_at_two() {
        let out = classify(&set_with_event(0.5, 0.0, 0.5, 1.0), 3, now(), &params());
        assert_eq!(out.verdict, Verdict::EmbargoEvent);
        assert!(out.confidence_multiplier <= 2.0);
    }

    #[test]
    fn weak_event_match_does_not_embargo() {
        let out = classify(&set_with_event(0.7, 0.2, 0.8, 0.5), 4, now(), &params());
        assert_ne!(out.verdict, Verdict::EmbargoEvent);
    }

    #[test]
    fn organic_consensus_boosts_confidence() {
        let out = classify(&set(0.72, 0.15, 0.81), 5, now(), &params());
        assert_eq!(out.verdict, Verdict::OrganicConsensus);
        let expected = 1.0 + ((0.72 + 0.81) / 2.0 - 0.5);
        assert!((out.confidence_multiplier - expected).abs() < 1e-9);
        assert!(out.cooling_until.is_none());
    }

    #[test]
    fn organic_boost_caps_at_half() {
        let out = classify(&set(1.0, 0.5, 1.0), 8, now(), &params());
        assert_eq!(out.verdict, Verdict::OrganicConsensus);
        assert!((out.confidence_multiplier - 1.5).abs() < 1e-9);
    }

    #[test]
    fn organic_multiplier_monotone_in_di_ni() {
        let low = classify(&set(0.62, 0.1, 0.65), 4, now(), &params());
        let high = classify(&set(0.8, 0.1, 0.9), 5, now(), &params());
        assert_eq!(low.verdict, Verdict::OrganicConsensus);
        assert_eq!(high.verdict, Verdict::OrganicConsensus);
        assert!(high.confidence_multiplier >= low.confidence_multiplier);
    }

    #[test]
    fn manipulation_attack_quarantines_hard() {
        let out = classify(&set(0.1, -0.85, 0.12), 5, now(), &params());
        assert_eq!(out.verdict, Verdict::ManipulationAttack);
        assert!((out.confidence_multiplier - 0.02).abs() < 1e-9);
        assert!((out.cooling_intensity - 1.0).abs() < f64::EPSILON);
        assert_eq!(out.cooling_until, Some(now() + Duration::hours(24)));
    }

    #[test]
    fn attack_with_zero_di_zeroes_multiplier() {
        let out = classify(&set(0.0, -1.0, 0.0), 5, now(), &params());
        assert_eq!(out.verdict, Verdict::ManipulationAttack);
        assert!((out.confidence_multiplier - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn calendar_match_blocks_attack() {
        // Same severity, but a (weak) calendar match exists — rule 4 requires
        // no match at all, so this falls through to WATCH via temporal stress.
        let out = classify(&set_with_event(0.1, -0.85, 0.12, 0.4), 5, now(), &params());
        assert_ne!(out.verdict, Verdict::ManipulationAttack);
        assert_eq!(out.verdict, Verdict::Watch);
    }

    #[test]
    fn templated_but_not_severe_is_pr_campaign() {
        // Moderate diversity keeps it out of rule 4; low NI + negative TN
        // reads as a press-release push.
        let out = classify(&set(0.45, -0.3, 0.3), 4, now(), &params());
        assert_eq!(out.verdict, Verdict::PrCampaign);
        assert!((out.confidence_multiplier - 1.0).abs() < f64::EPSILON);
        assert!(out.cooling_until.is_none());
    }

    #[test]
    fn temporal_stress_lands_in_watch() {
        let out = classify(&set(0.5, -0.25, 0.7), 4, now(), &params());
        assert_eq!(out.verdict, Verdict::Watch);
        assert!((out.cooling_intensity - 0.3).abs() < f64::EPSILON);
        assert_eq!(out.cooling_until, Some(now() + Duration::hours(4)));
    }

    #[test]
    fn boundary_proximity_lands_in_watch() {
        // tn exactly at 0 with otherwise unremarkable scores: two diverse
        // articles two hours apart (scenario B shape).
        let out = classify(&set(0.48, 0.0, 0.85), 2, now(), &params());
        assert_eq!(out.verdict, Verdict::Watch);
        assert!(out.reason.contains("boundary"));
    }

    #[test]
    fn unremarkable_scores_are_noise() {
        let out = classify(&set(0.45, 0.4, 0.5), 4, now(), &params());
        assert_eq!(out.verdict, Verdict::Noise);
        assert!((out.confidence_multiplier - 1.0).abs() < f64::EPSILON);
        assert!(out.cooling_until.is_none());
    }

    #[test]
    fn classification_is_deterministic() {
        let s = set(0.31, -0.52, 0.28);
        let a = classify(&s, 6, now(), &params());
        let b = classify(&s, 6, now(), &params());
        assert_eq!(a.verdict, b.verdict);
        assert_eq!(a.reason, b.reason);
        assert!((a.confidence_multiplier - b.confidence_multiplier).abs() < f64::EPSILON);
    }

    #[test]
    fn cooling_invariant_holds_for_every_rule() {
        let cases = [
            set(0.0, 0.0, 1.0),
            set_with_event(0.2, -0.9, 0.2, 0.9),
            set(0.72, 0.15, 0.81),
            set(0.1, -0.85, 0.12),
            set(0.45, -0.3, 0.3),
            set(0.5, -0.25, 0.7),
            set(0.45, 0.4, 0.5),
        ];
        for s in &cases {
            for count in [1, 2, 5] {
                let out = classify(s, count, now(), &params());
                assert_eq!(
                    out.cooling_until.is_some(),
                    out.cooling_intensity > 0.0,
                    "invariant violated for {:?} count={count}",
                    out.verdict
                );
                assert!((0.0..=2.0).contains(&out.confidence_multiplier));
                assert!((0.0..=1.0).contains(&out.cooling_intensity));
                assert!((0.0..=100.0).contains(&out.nfpi));
            }
        }
    }

    #[test]
    fn verdict_serialises_screaming_snake() {
        let json = serde_json::to_string(&Verdict::ManipulationAttack).unwrap();
        assert_eq!(json, "\"MANIPULATION_ATTACK\"");
        let back: Verdict = serde_json::from_str("\"ORGANIC_CONSENSUS\"").unwrap();
        assert_eq!(back, Verdict::OrganicConsensus);
    }
}
