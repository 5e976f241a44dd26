// =============================================================================
// Shared types used across the Aegis news engine
// =============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single news article as submitted by an upstream feed.
///
/// `published_at` is optional: feeds occasionally deliver articles without a
/// usable timestamp. Such articles still count toward cluster membership and
/// the diversity/narrative signals but are excluded from temporal scoring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    /// External article id assigned by the upstream feed.
    pub id: String,
    pub ticker: String,
    /// Free-text theme the feed attached to the article (e.g. "guidance cut").
    pub theme: String,
    pub title: String,
    #[serde(default)]
    pub summary: String,
    pub source: String,
    /// Publisher tier, 1 (wire service) .. 5 (unvetted aggregator).
    #[serde(default = "default_source_tier")]
    pub source_tier: u8,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    /// Sentiment in [-1, 1] when the upstream enricher has produced one.
    #[serde(default)]
    pub sentiment: Option<f64>,
}

fn default_source_tier() -> u8 {
    5
}

/// Whether the engine is accepting new articles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IngestMode {
    Active,
    Paused,
}

impl Default for IngestMode {
    fn default() -> Self {
        Self::Active
    }
}

impl std::fmt::Display for IngestMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "Active"),
            Self::Paused => write!(f, "Paused"),
        }
    }
}
