// =============================================================================
// Narrative Independence (NI) — pairwise wording dissimilarity
// =============================================================================
//
// Syndicated press-release placements repeat near-identical phrasing across
// outlets; independently reported coverage words the same story differently.
// NI is the mean pairwise Jaccard distance between the token sets of each
// article's title + summary: near-duplicates drive it toward 0, independent
// wording toward 1.

use std::collections::HashSet;

/// Lower-cased alphanumeric token set for one article's text.
fn token_set(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_string())
        .collect()
}

/// Jaccard distance between two token sets. Two empty sets are identical.
fn jaccard_distance(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count() as f64;
    let union = a.union(b).count() as f64;
    1.0 - intersection / union
}

/// Compute NI over the cluster's article texts (title + summary each).
///
/// A single article has no pairs to compare and carries no duplication
/// evidence; it scores 1.0.
pub fn narrative_independence(texts: &[String]) -> f64 {
    if texts.len() < 2 {
        return 1.0;
    }

    let sets: Vec<HashSet<String>> = texts.iter().map(|t| token_set(t)).collect();

    let mut total = 0.0;
    let mut pairs = 0usize;
    for i in 0..sets.len() {
        for j in (i + 1)..sets.len() {
            total += jaccard_distance(&sets[i], &sets[j]);
            pairs += 1;
        }
    }

    (total / pairs as f64).clamp(0.0, 1.0)
}
