// =============================================================================
// Cluster Manager — ingest pipeline with per-fingerprint serialization
// =============================================================================
//
// Owns cluster identity and drives the full per-article pipeline:
//
//   resolve fingerprint -> create-if-absent -> append member ->
//   recompute signals -> classify -> persist -> audit snapshot
//
// Concurrency model: single-writer-per-key, many keys in parallel. A lock
// map holds one mutex per fingerprint; creation of the map entry is atomic
// under the map's write lock, which makes first-article cluster creation
// exactly-once even when two feeds deliver the same new story
// simultaneously. Distinct fingerprints never contend.
//
// The cooling decay sweep and retention purge run through the same lock map
// so maintenance never races an in-flight ingest for the same cluster.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::calendar::CalendarStore;
use crate::classifier::{classify, Verdict};
use crate::cluster::fingerprint::{fingerprint, normalize_ticker};
use crate::cooling::suppression_factor;
use crate::credibility::CredibilityRegistry;
use crate::error::EngineError;
use crate::repository::{ArticleRecord, ClusterId, ClusterRepository, SignalHistorySnapshot};
use crate::runtime_config::RuntimeConfig;
use crate::signals::compute_signals;
use crate::types::Article;

/// Read-only trust answer for downstream signal consumers.
#[derive(Debug, Clone, Serialize)]
pub struct ClusterTrust {
    pub verdict: Verdict,
    pub confidence_multiplier: f64,
    /// 0 = trust fully, 1 = fully blocked. Applied multiplicatively against
    /// the confidence multiplier by the consumer.
    pub suppression_factor: f64,
}

pub struct ClusterManager {
    repo: Arc<dyn ClusterRepository>,
    registry: Arc<CredibilityRegistry>,
    calendar: Arc<CalendarStore>,
    config: Arc<RwLock<RuntimeConfig>>,
    /// One mutex per live fingerprint; entry creation is the atomic
    /// create-if-absent point.
    locks: RwLock<HashMap<String, Arc<Mutex<()>>>>,
}

impl ClusterManager {
    pub fn new(
        repo: Arc<dyn ClusterRepository>,
        registry: Arc<CredibilityRegistry>,
        calendar: Arc<CalendarStore>,
        config: Arc<RwLock<RuntimeConfig>>,
    ) -> Self {
        Self {
            repo,
            registry,
            calendar,
            config,
            locks: RwLock::new(HashMap::new()),
        }
    }

    /// The per-fingerprint mutex, created atomically on first sight.
    fn lock_for(&self, fp: &str) -> Arc<Mutex<()>> {
        {
            let locks = self.locks.read();
            if let Some(slot) = locks.get(fp) {
                return slot.clone();
            }
        }
        let mut locks = self.locks.write();
        locks
            .entry(fp.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Ingest one article: cluster it, recompute signals, classify, persist.
    ///
    /// `now` anchors TN normalization and cooling windows; the pipeline
    /// never reads ambient time itself. Exactly one history snapshot is
    /// appended per successful ingest. Re-delivery of an already-recorded
    /// article id is a no-op returning the existing cluster.
    pub fn ingest(&self, article: &Article, now: DateTime<Utc>) -> Result<ClusterId, EngineError> {
        let ticker = normalize_ticker(&article.ticker);
        if ticker.is_empty() {
            return Err(EngineError::UnresolvableArticle {
                id: article.id.clone(),
            });
        }

        let fp = fingerprint(&ticker, &article.theme);
        let slot = self.lock_for(&fp);
        let _guard = slot.lock();

        let seen_at = article.published_at.unwrap_or(now);
        let (cluster_id, created) = self
            .repo
            .get_or_create_cluster(&fp, &ticker, &article.theme, seen_at)?;
        if created {
            info!(fingerprint = %fp, ticker = %ticker, theme = %article.theme, "new cluster");
        }

        // Seed a credibility record so outcome feedback has somewhere to land.
        self.registry.observe(&article.source, article.source_tier);

        let appended = self.repo.append_article(ArticleRecord {
            id: article.id.clone(),
            cluster_id,
            ticker: ticker.clone(),
            title: article.title.clone(),
            summary: article.summary.clone(),
            source: article.source.clone(),
            source_tier: article.source_tier,
            published_at: article.published_at,
            added_at: now,
            sentiment: article.sentiment,
        })?;
        if !appended {
            debug!(article_id = %article.id, fingerprint = %fp, "duplicate delivery — no recompute");
            return Ok(cluster_id);
        }

        self.recompute_locked(&fp, cluster_id, now)?;
        Ok(cluster_id)
    }

    /// Recompute signals and verdict for a cluster. Caller must hold the
    /// fingerprint's mutex.
    fn recompute_locked(
        &self,
        fp: &str,
        cluster_id: ClusterId,
        now: DateTime<Utc>,
    ) -> Result<(), EngineError> {
        let (signal_params, calendar_params, classifier_params) = {
            let config = self.config.read();
            (
                config.signals.clone(),
                config.calendar.clone(),
                config.classifier.clone(),
            )
        };

        let cluster = self
            .repo
            .get_cluster(fp)?
            .ok_or_else(|| anyhow::anyhow!("cluster vanished mid-ingest: {fp}"))?;
        let articles = self.repo.articles_of(cluster_id)?;

        let signals = compute_signals(
            &articles,
            &self.registry,
            &self.calendar,
            &cluster.ticker,
            cluster.first_seen,
            cluster.last_seen,
            now,
            &signal_params,
            &calendar_params,
        );
        let mut outcome = classify(&signals, cluster.article_count, now, &classifier_params);

        // Corroboration never reduces trust: while a cluster stays in
        // organic consensus, the multiplier only ratchets upward.
        if cluster.verdict == Verdict::OrganicConsensus
            && outcome.verdict == Verdict::OrganicConsensus
            && outcome.confidence_multiplier < cluster.confidence_multiplier
        {
            outcome.confidence_multiplier = cluster.confidence_multiplier;
        }

        self.repo.update_signals(cluster_id, &signals)?;
        self.repo.update_verdict(cluster_id, &outcome)?;
        self.repo.append_history_snapshot(SignalHistorySnapshot {
            cluster_id,
            di: signals.di,
            tn: signals.tn,
            ni: signals.ni,
            el_matched: signals.el.matched,
            el_confidence: signals.el.confidence,
            verdict: outcome.verdict,
            confidence_multiplier: outcome.confidence_multiplier,
            article_count: cluster.article_count,
            snapshot_at: now,
        })?;

        info!(
            fingerprint = %fp,
            ticker = %cluster.ticker,
            articles = cluster.article_count,
            verdict = %outcome.verdict,
            multiplier = format!("{:.2}", outcome.confidence_multiplier),
            di = format!("{:.2}", signals.di),
            tn = format!("{:.2}", signals.tn),
            ni = format!("{:.2}", signals.ni),
            "cluster classified"
        );

        Ok(())
    }

    /// Read-only trust query for the signal-consuming layer.
    pub fn cluster_trust(
        &self,
        ticker: &str,
        theme: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<ClusterTrust>, EngineError> {
        let fp = fingerprint(ticker, theme);
        let cluster = match self.repo.get_cluster(&fp)? {
            Some(c) => c,
            None => return Ok(None),
        };
        Ok(Some(ClusterTrust {
            verdict: cluster.verdict,
            confidence_multiplier: cluster.confidence_multiplier,
            suppression_factor: suppression_factor(
                cluster.cooling_intensity,
                cluster.cooling_until,
                now,
            ),
        }))
    }

    /// Clear expired cooling windows. Returns how many clusters were
    /// cleared. Takes each cluster's fingerprint lock so the sweep never
    /// races an ingest.
    pub fn decay_cooling(&self, now: DateTime<Utc>) -> Result<usize, EngineError> {
        let expired = self.repo.list_cooling_expired(now)?;
        let mut cleared = 0usize;
        for fp in expired {
            let slot = self.lock_for(&fp);
            let _guard = slot.lock();
            if self.repo.clear_cooling_if_expired(&fp, now)? {
                debug!(fingerprint = %fp, "cooling window expired — cleared");
                cleared += 1;
            }
        }
        Ok(cleared)
    }

    /// Delete clusters idle past the retention window (cascading to their
    /// articles and history). Returns how many were purged.
    pub fn purge_stale(&self, now: DateTime<Utc>, retention_days: i64) -> Result<usize, EngineError> {
        let stale = self.repo.list_stale(now, retention_days)?;
        let mut purged = 0usize;
        for fp in stale {
            let slot = self.lock_for(&fp);
            {
                let _guard = slot.lock();
                if self.repo.delete_cluster(&fp)? {
                    purged += 1;
                }
            }
            // Drop the lock-map entry; a racing ingest simply recreates it.
            self.locks.write().remove(&fp);
        }
        if purged > 0 {
            warn!(purged, retention_days, "stale clusters purged");
        }
        Ok(purged)
    }
}
