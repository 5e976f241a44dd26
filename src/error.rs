// =============================================================================
// Engine error taxonomy
// =============================================================================
//
// Only persistence failures propagate out of `ingest` — the caller owns the
// retry. Collaborator outages degrade to documented fallback values inside
// the signal pipeline and never abort classification.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// The article carries no resolvable ticker. It is dropped (logged and
    /// counted), never clustered.
    #[error("article '{id}' has no resolvable ticker")]
    UnresolvableArticle { id: String },

    /// An external collaborator (calendar feed, credibility registry) timed
    /// out or is unreachable. Callers substitute the documented fallback.
    #[error("collaborator '{name}' unavailable: {detail}")]
    CollaboratorUnavailable { name: &'static str, detail: String },

    /// Persistence-layer failure. Surfaced unmodified so the ingestion
    /// pipeline can retry the article.
    #[error(transparent)]
    Persistence(#[from] anyhow::Error),
}
