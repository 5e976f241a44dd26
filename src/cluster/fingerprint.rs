// =============================================================================
// Cluster Fingerprinting — deterministic identity for (ticker, theme)
// =============================================================================
//
// A cluster's identity is a sha256 over the normalized ticker and the sorted
// set of theme keywords. Normalization strips case, punctuation and stop
// words so that "Guidance cut!" and "the guidance CUT" land in the same
// cluster, while distinct keyword sets always produce distinct fingerprints.

use sha2::{Digest, Sha256};

/// Stop words stripped from theme text before keyword extraction.
const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "but", "by", "for", "from",
    "has", "have", "in", "into", "is", "it", "its", "of", "on", "or", "over",
    "that", "the", "their", "this", "to", "was", "were", "will", "with",
];

/// Uppercased, trimmed ticker. Empty output means the article is
/// unresolvable.
pub fn normalize_ticker(ticker: &str) -> String {
    ticker.trim().to_uppercase()
}

/// Lower-cased, stop-word-stripped, deduplicated and sorted theme keywords.
pub fn theme_keywords(theme: &str) -> Vec<String> {
    let mut keywords: Vec<String> = theme
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .filter(|t| !STOP_WORDS.contains(t))
        .map(|t| t.to_string())
        .collect();

    keywords.sort();
    keywords.dedup();
    keywords
}

/// Stable fingerprint for a normalized (ticker, theme) pair.
///
/// Pure function: identical inputs always hash identically, regardless of
/// word order or casing in the raw theme text.
pub fn fingerprint(ticker: &str, theme: &str) -> String {
    let ticker = normalize_ticker(ticker);
    let keywords = theme_keywords(theme);

    let mut hasher = Sha256::new();
    hasher.update(ticker.as_bytes());
    hasher.update(b"|");
    hasher.update(keywords.join(" ").as_bytes());
    hex::encode(hasher.finalize())
}
