// =============================================================================
// Ingest worker pool — concurrent article intake
// =============================================================================
//
// Articles arrive on a bounded mpsc queue (fed by the REST endpoint) and are
// drained by a pool of workers. Each worker hands articles to the cluster
// manager, which serializes per fingerprint internally — so the pool runs
// distinct stories fully in parallel while same-story articles queue behind
// one another.
//
// Ingestion is fire-and-forget per article: unresolvable articles are
// dropped with a logged alert, persistence failures are logged for the
// submitting pipeline to retry. Nothing here retries internally.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::app_state::AppState;
use crate::error::EngineError;
use crate::types::Article;

/// Spawn `worker_count` workers draining `rx` until the channel closes.
pub fn spawn_ingest_workers(
    state: Arc<AppState>,
    rx: mpsc::Receiver<Article>,
    worker_count: usize,
) {
    let rx = Arc::new(tokio::sync::Mutex::new(rx));

    for worker_id in 0..worker_count.max(1) {
        let state = state.clone();
        let rx = rx.clone();
        tokio::spawn(async move {
            info!(worker_id, "ingest worker started");
            loop {
                let article = {
                    let mut guard = rx.lock().await;
                    guard.recv().await
                };
                let Some(article) = article else {
                    info!(worker_id, "ingest queue closed — worker exiting");
                    break;
                };
                process_article(&state, &article);
            }
        });
    }
}

/// Run one article through the cluster pipeline and record the outcome on
/// the shared state.
fn process_article(state: &Arc<AppState>, article: &Article) {
    match state.cluster_manager.ingest(article, Utc::now()) {
        Ok(_) => {
            state.ingested_total.fetch_add(1, Ordering::Relaxed);
            state.increment_version();
        }
        Err(EngineError::UnresolvableArticle { id }) => {
            // Dropped, not silently lost: alert and count.
            warn!(article_id = %id, source = %article.source, "article dropped: no resolvable ticker");
            state.dropped_total.fetch_add(1, Ordering::Relaxed);
            state.push_error(format!("article '{id}' dropped: no resolvable ticker"));
        }
        Err(e) => {
            // Persistence failure — the submitting pipeline owns the retry.
            error!(article_id = %article.id, error = %e, "ingest failed");
            state.push_error(format!("ingest of '{}' failed: {e}", article.id));
        }
    }
}
