// =============================================================================
// Temporal Naturalness (TN) — arrival pacing vs organic diffusion
// =============================================================================
//
// Organic news diffusion is front-loaded with a long decaying tail: an
// initial report, fast early pickups, then stragglers over hours. A
// coordinated placement arrives as a synchronized burst instead.
//
// Two components blend into [-1, +1]:
//
//   pace   — mean inter-arrival gap against the organic reference gap,
//            mapped to [-1, +1] (tiny gaps => strongly negative)
//   shape  — front-loaded-ness: articles in the first half of the span
//            minus the second half, over the total (organic => positive)
//
//   tn = 0.7 * pace + 0.3 * shape
//
// Fewer than `min_samples` timestamped articles is not a distribution; TN
// is neutral (0.0). Spans shorter than five minutes are pure bursts and
// score on pace alone.
//
// Timestamps are clamped to the supplied `now` so that future-dated
// articles cannot stretch the window. `now` is always passed in explicitly;
// this function never reads ambient time.

use chrono::{DateTime, Utc};

/// Pace dominates; shape refines.
const PACE_BLEND: f64 = 0.7;
const SHAPE_BLEND: f64 = 0.3;

/// Below this span the shape term is meaningless (everything is "first
/// half") and the score is pace alone.
const MIN_SHAPE_SPAN_SECS: i64 = 300;

/// Compute TN over the cluster's timestamped articles.
pub fn temporal_naturalness(
    published: &[DateTime<Utc>],
    now: DateTime<Utc>,
    organic_mean_gap_minutes: f64,
    min_samples: usize,
) -> f64 {
    if published.len() < min_samples.max(2) {
        return 0.0;
    }

    let mut times: Vec<DateTime<Utc>> = published.iter().map(|t| (*t).min(now)).collect();
    times.sort();

    let n = times.len();
    let first = times[0];
    let last = times[n - 1];
    let span_secs = (last - first).num_seconds();

    // Mean inter-arrival gap vs the organic reference.
    let mean_gap_secs = span_secs as f64 / (n - 1) as f64;
    let organic_gap_secs = (organic_mean_gap_minutes * 60.0).max(1.0);
    let pace = 2.0 * (mean_gap_secs / organic_gap_secs).clamp(0.0, 1.0) - 1.0;

    if span_secs < MIN_SHAPE_SPAN_SECS {
        return pace.clamp(-1.0, 1.0);
    }

    // Front-loaded-ness over the observed span.
    let midpoint = first + chrono::Duration::seconds(span_secs / 2);
    let front = times.iter().filter(|t| **t <= midpoint).count() as f64;
    let back = n as f64 - front;
    let shape = (front - back) / n as f64;

    (PACE_BLEND * pace + SHAPE_BLEND * shape).clamp(-1.0, 1.0)
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const ORGANIC_GAP_MIN: f64 = 45.0;
    const MIN_SAMPLES: usize = 3;

    fn t(mins: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap() + chrono::Duration::minutes(mins)
    }

    fn tn(published: &[DateTime<Utc>], now: DateTime<Utc>) -> f64 {
        temporal_naturalness(published, now, ORGANIC_GAP_MIN, MIN_SAMPLES)
    }

    #[test]
    fn empty_and_single_are_neutral() {
        assert!((tn(&[], t(100)) - 0.0).abs() < f64::EPSILON);
        assert!((tn(&[t(0)], t(100)) - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn pair_is_neutral() {
        // A single gap is not a distribution.
        assert!((tn(&[t(0), t(120)], t(200)) - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn synchronized_burst_scores_strongly_negative() {
        // Five articles in three minutes.
        let times = vec![t(0), t(0), t(1), t(2), t(3)];
        let score = tn(&times, t(10));
        assert!(score <= -0.5, "burst should score <= -0.5, got {score}");
    }

    #[test]
    fn simultaneous_arrivals_score_minimum() {
        let times = vec![t(0), t(0), t(0), t(0)];
        let score = tn(&times, t(10));
        assert!((score + 1.0).abs() < 1e-9, "got {score}");
    }

    #[test]
    fn organic_decay_scores_positive() {
        // Front-loaded with a long tail: 0, 20, 50, 120, 360 minutes.
        let times = vec![t(0), t(20), t(50), t(120), t(360)];
        let score = tn(&times, t(400));
        assert!(score > 0.5, "organic spread should score positive, got {score}");
    }

    #[test]
    fn evenly_spread_coverage_is_mildly_positive() {
        let times = vec![t(0), t(30), t(60), t(90), t(120)];
        let score = tn(&times, t(200));
        assert!(score > 0.0 && score < 0.7, "got {score}");
    }

    #[test]
    fn future_timestamps_clamp_to_now() {
        // Two articles "published" an hour in the future collapse onto now,
        // so the cluster reads as a burst rather than a spread.
        let now = t(5);
        let times = vec![t(0), t(2), t(60), t(65)];
        let score = tn(&times, now);
        let clamped_equiv = tn(&[t(0), t(2), t(5), t(5)], now);
        assert!((score - clamped_equiv).abs() < 1e-9);
    }

    #[test]
    fn deterministic_regardless_of_input_order() {
        let a = vec![t(0), t(20), t(50), t(120)];
        let b = vec![t(120), t(0), t(50), t(20)];
        assert!((tn(&a, t(200)) - tn(&b, t(200))).abs() < f64::EPSILON);
    }

    #[test]
    fn tn_is_bounded() {
        let tight = vec![t(0); 20];
        let spread: Vec<_> = (0..20).map(|i| t(i * 240)).collect();
        assert!(tn(&tight, t(0)) >= -1.0);
        assert!(tn(&spread, t(5000)) <= 1.0);
    }
}
