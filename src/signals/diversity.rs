// =============================================================================
// Diversity Integrity (DI) — credibility-weighted source evenness
// =============================================================================
//
// Measures how broadly a cluster's coverage is spread across independent,
// credible publishers. Three factors multiply into [0, 1]:
//
//   evenness  — normalized Shannon entropy of the credibility-weighted
//               per-source mass distribution (1.0 = perfectly even)
//   breadth   — total distinct-source credibility weight against a
//               reference sum (saturates at the reference)
//   quality   — mean source weight scaled between the tier-5 and tier-1
//               seeds
//
// One source, thin total weight, or uniformly low tiers each pull DI down;
// several independent high/medium-tier sources push it toward 1.

/// Tier-5 seed weight — the quality scale's zero point.
const LOW_SEED_WEIGHT: f64 = 0.5;

/// Tier-1 seed weight — the quality scale's upper anchor.
const HIGH_SEED_WEIGHT: f64 = 2.0;

/// One (source, credibility_weight) pair per article in the cluster.
pub type SourceSample<'a> = (&'a str, f64);

/// Compute DI over the cluster's article set.
///
/// `reference_weight_sum` is the total distinct-source weight at which the
/// breadth term saturates (config `signals.reference_weight_sum`).
pub fn diversity_integrity(samples: &[SourceSample<'_>], reference_weight_sum: f64) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }

    // Aggregate per distinct source: article count and weight.
    let mut per_source: Vec<(&str, usize, f64)> = Vec::new();
    for &(source, weight) in samples {
        match per_source.iter_mut().find(|(s, _, _)| *s == source) {
            Some((_, count, _)) => *count += 1,
            None => per_source.push((source, 1, weight.max(0.0))),
        }
    }

    let distinct = per_source.len();
    if distinct < 2 {
        // All coverage from one publisher — no diversity whatsoever.
        return 0.0;
    }

    // Credibility-weighted mass per source.
    let masses: Vec<f64> = per_source
        .iter()
        .map(|(_, count, weight)| *count as f64 * weight)
        .collect();
    let total_mass: f64 = masses.iter().sum();
    if total_mass <= f64::EPSILON {
        return 0.0;
    }

    // Normalized Shannon entropy of the mass distribution.
    let entropy: f64 = masses
        .iter()
        .map(|m| {
            let p = m / total_mass;
            if p > 0.0 {
                -p * p.ln()
            } else {
                0.0
            }
        })
        .sum();
    let evenness = entropy / (distinct as f64).ln();

    // Breadth: total independent weight vs the reference.
    let weight_sum: f64 = per_source.iter().map(|(_, _, w)| *w).sum();
    let breadth = (weight_sum / reference_weight_sum.max(f64::EPSILON)).min(1.0);

    // Quality: mean source weight on the tier-5..tier-1 seed scale.
    let mean_weight = weight_sum / distinct as f64;
    let quality =
        ((mean_weight - LOW_SEED_WEIGHT) / (HIGH_SEED_WEIGHT - LOW_SEED_WEIGHT)).clamp(0.0, 1.0);

    (evenness * breadth * quality).clamp(0.0, 1.0)
}
