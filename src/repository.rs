// =============================================================================
// Cluster Repository — narrow persistence contract + in-memory store
// =============================================================================
//
// The persistent store is an external collaborator: the engine only ever
// talks to the `ClusterRepository` trait. The in-memory implementation here
// backs production single-node deployments and every test; a database-backed
// implementation can be swapped in behind the same trait.
//
// Numeric bounds are enforced at this boundary: out-of-range signal values
// are clamped before persistence, and the cooling invariant
// (`cooling_until` is Some iff `cooling_intensity > 0`) is normalised on
// every verdict write.

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};
use uuid::Uuid;

use crate::classifier::{ClassifierOutcome, Verdict};
use crate::signals::SignalSet;

pub type ClusterId = Uuid;

// =============================================================================
// Records
// =============================================================================

/// A news cluster and its latest signal/verdict state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterRecord {
    pub id: ClusterId,
    /// Deterministic hash of normalized ticker + theme keywords.
    pub fingerprint: String,
    pub ticker: String,
    pub theme: String,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub article_count: u32,

    pub di: f64,
    pub tn: f64,
    pub ni: f64,
    pub el_matched: bool,
    pub el_confidence: f64,
    pub el_event_name: Option<String>,

    pub verdict: Verdict,
    pub verdict_reason: String,
    pub confidence_multiplier: f64,
    pub cooling_intensity: f64,
    pub cooling_until: Option<DateTime<Utc>>,
    pub nfpi: f64,
}

/// A cluster member article as persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleRecord {
    /// External article id from the upstream feed.
    pub id: String,
    pub cluster_id: ClusterId,
    pub ticker: String,
    pub title: String,
    pub summary: String,
    pub source: String,
    pub source_tier: u8,
    /// None = malformed feed timestamp; excluded from TN only.
    pub published_at: Option<DateTime<Utc>>,
    pub added_at: DateTime<Utc>,
    pub sentiment: Option<f64>,
}

/// Append-only audit record, one per recompute.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalHistorySnapshot {
    pub cluster_id: ClusterId,
    pub di: f64,
    pub tn: f64,
    pub ni: f64,
    pub el_matched: bool,
    pub el_confidence: f64,
    pub verdict: Verdict,
    pub confidence_multiplier: f64,
    pub article_count: u32,
    pub snapshot_at: DateTime<Utc>,
}

// =============================================================================
// Contract
// =============================================================================

/// Narrow persistence contract consumed by the engine.
///
/// Only persistence failures are errors; "not found" is expressed in the
/// return types. Every method is safe to call concurrently.
pub trait ClusterRepository: Send + Sync {
    /// Atomic create-if-absent on the fingerprint key. Returns the cluster
    /// id and whether this call created it.
    fn get_or_create_cluster(
        &self,
        fingerprint: &str,
        ticker: &str,
        theme: &str,
        seen_at: DateTime<Utc>,
    ) -> Result<(ClusterId, bool)>;

    /// Append a member article and bump `last_seen`/`article_count`.
    /// Duplicate external ids within the cluster are idempotently ignored
    /// (returns false).
    fn append_article(&self, article: ArticleRecord) -> Result<bool>;

    /// Current member articles in insertion order.
    fn articles_of(&self, cluster_id: ClusterId) -> Result<Vec<ArticleRecord>>;

    /// Persist the latest signal values (clamped to their valid ranges).
    fn update_signals(&self, cluster_id: ClusterId, signals: &SignalSet) -> Result<()>;

    /// Persist a classification outcome (clamped, invariant-normalised).
    fn update_verdict(&self, cluster_id: ClusterId, outcome: &ClassifierOutcome) -> Result<()>;

    /// Append one audit snapshot.
    fn append_history_snapshot(&self, snapshot: SignalHistorySnapshot) -> Result<()>;

    /// Audit trail for a cluster, oldest first.
    fn history(&self, cluster_id: ClusterId) -> Result<Vec<SignalHistorySnapshot>>;

    /// Look up a cluster by fingerprint.
    fn get_cluster(&self, fingerprint: &str) -> Result<Option<ClusterRecord>>;

    /// Late sentiment enrichment for an already-recorded article. Does not
    /// trigger reclassification. Returns false when the article is unknown.
    fn update_sentiment(&self, article_id: &str, sentiment: f64) -> Result<bool>;

    /// Fingerprints whose cooling window has expired at `now`.
    fn list_cooling_expired(&self, now: DateTime<Utc>) -> Result<Vec<String>>;

    /// Clear an expired cooling window. No-op (false) if still active.
    fn clear_cooling_if_expired(&self, fingerprint: &str, now: DateTime<Utc>) -> Result<bool>;

    /// Fingerprints of clusters idle longer than the retention window.
    fn list_stale(&self, now: DateTime<Utc>, retention_days: i64) -> Result<Vec<String>>;

    /// Delete one cluster, cascading to its articles and history.
    fn delete_cluster(&self, fingerprint: &str) -> Result<bool>;

    /// Most recently active clusters, newest first.
    fn list_recent(&self, limit: usize) -> Result<Vec<ClusterRecord>>;

    /// Clusters with one of `verdicts`, optionally only those still inside
    /// their cooling window at `now`.
    fn list_suspicious(
        &self,
        verdicts: &[Verdict],
        within_cooling: bool,
        now: DateTime<Utc>,
    ) -> Result<Vec<ClusterRecord>>;

    /// Clusters with one of `verdicts`, multiplier >= `min_multiplier`,
    /// active within the last `within_hours`.
    fn list_high_confidence(
        &self,
        verdicts: &[Verdict],
        min_multiplier: f64,
        within_hours: i64,
        now: DateTime<Utc>,
    ) -> Result<Vec<ClusterRecord>>;

    /// (clusters, articles, history snapshots) currently stored.
    fn counts(&self) -> Result<(usize, usize, usize)>;
}

// =============================================================================
// In-memory implementation
// =============================================================================

#[derive(Default)]
pub struct MemoryRepository {
    /// fingerprint -> cluster.
    clusters: RwLock<HashMap<String, ClusterRecord>>,
    /// cluster id -> fingerprint (reverse index).
    by_id: RwLock<HashMap<ClusterId, String>>,
    /// cluster id -> member articles in insertion order.
    articles: RwLock<HashMap<ClusterId, Vec<ArticleRecord>>>,
    /// cluster id -> audit snapshots, oldest first.
    history: RwLock<HashMap<ClusterId, Vec<SignalHistorySnapshot>>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ClusterRepository for MemoryRepository {
    fn get_or_create_cluster(
        &self,
        fingerprint: &str,
        ticker: &str,
        theme: &str,
        seen_at: DateTime<Utc>,
    ) -> Result<(ClusterId, bool)> {
        let mut clusters = self.clusters.write();
        if let Some(existing) = clusters.get(fingerprint) {
            return Ok((existing.id, false));
        }

        let id = Uuid::new_v4();
        let record = ClusterRecord {
            id,
            fingerprint: fingerprint.to_string(),
            ticker: ticker.to_string(),
            theme: theme.to_string(),
            first_seen: seen_at,
            last_seen: seen_at,
            article_count: 0,
            di: 0.0,
            tn: 0.0,
            ni: 0.0,
            el_matched: false,
            el_confidence: 0.0,
            el_event_name: None,
            verdict: Verdict::Pending,
            verdict_reason: "awaiting first classification".to_string(),
            confidence_multiplier: 1.0,
            cooling_intensity: 0.0,
            cooling_until: None,
            nfpi: 0.0,
        };
        clusters.insert(fingerprint.to_string(), record);
        self.by_id.write().insert(id, fingerprint.to_string());

        debug!(fingerprint, ticker, "cluster created");
        Ok((id, true))
    }

    fn append_article(&self, article: ArticleRecord) -> Result<bool> {
        let fingerprint = {
            let by_id = self.by_id.read();
            match by_id.get(&article.cluster_id) {
                Some(fp) => fp.clone(),
                None => anyhow::bail!("append_article: unknown cluster {}", article.cluster_id),
            }
        };

        {
            let mut articles = self.articles.write();
            let members = articles.entry(article.cluster_id).or_default();
            if members.iter().any(|a| a.id == article.id) {
                debug!(article_id = %article.id, "duplicate article id — ignored");
                return Ok(false);
            }
            members.push(article.clone());
        }

        let mut clusters = self.clusters.write();
        if let Some(cluster) = clusters.get_mut(&fingerprint) {
            cluster.article_count += 1;
            if let Some(published) = article.published_at {
                if published > cluster.last_seen {
                    cluster.last_seen = published;
                }
                if published < cluster.first_seen {
                    cluster.first_seen = published;
                }
            }
        }
        Ok(true)
    }

    fn articles_of(&self, cluster_id: ClusterId) -> Result<Vec<ArticleRecord>> {
        Ok(self
            .articles
            .read()
            .get(&cluster_id)
            .cloned()
            .unwrap_or_default())
    }

    fn update_signals(&self, cluster_id: ClusterId, signals: &SignalSet) -> Result<()> {
        // Resolve and release the index before touching the cluster map —
        // get_or_create acquires these locks in the opposite order.
        let fingerprint = self
            .by_id
            .read()
            .get(&cluster_id)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("update_signals: unknown cluster {cluster_id}"))?;

        let mut clusters = self.clusters.write();
        if let Some(cluster) = clusters.get_mut(&fingerprint) {
            cluster.di = signals.di.clamp(0.0, 1.0);
            cluster.tn = signals.tn.clamp(-1.0, 1.0);
            cluster.ni = signals.ni.clamp(0.0, 1.0);
            cluster.el_matched = signals.el.matched;
            cluster.el_confidence = signals.el.confidence.clamp(0.0, 1.0);
            cluster.el_event_name = signals.el.event_name.clone();
        }
        Ok(())
    }

    fn update_verdict(&self, cluster_id: ClusterId, outcome: &ClassifierOutcome) -> Result<()> {
        let fingerprint = self
            .by_id
            .read()
            .get(&cluster_id)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("update_verdict: unknown cluster {cluster_id}"))?;

        let mut clusters = self.clusters.write();
        if let Some(cluster) = clusters.get_mut(&fingerprint) {
            cluster.verdict = outcome.verdict;
            cluster.verdict_reason = outcome.reason.clone();
            cluster.confidence_multiplier = outcome.confidence_multiplier.clamp(0.0, 2.0);
            cluster.nfpi = outcome.nfpi.clamp(0.0, 100.0);

            let intensity = outcome.cooling_intensity.clamp(0.0, 1.0);
            // Normalise the cooling invariant at the boundary.
            if intensity > 0.0 {
                cluster.cooling_intensity = intensity;
                cluster.cooling_until = outcome.cooling_until;
                if cluster.cooling_until.is_none() {
                    cluster.cooling_intensity = 0.0;
                }
            } else {
                cluster.cooling_intensity = 0.0;
                cluster.cooling_until = None;
            }
        }
        Ok(())
    }

    fn append_history_snapshot(&self, snapshot: SignalHistorySnapshot) -> Result<()> {
        self.history
            .write()
            .entry(snapshot.cluster_id)
            .or_default()
            .push(snapshot);
        Ok(())
    }

    fn history(&self, cluster_id: ClusterId) -> Result<Vec<SignalHistorySnapshot>> {
        Ok(self
            .history
            .read()
            .get(&cluster_id)
            .cloned()
            .unwrap_or_default())
    }

    fn get_cluster(&self, fingerprint: &str) -> Result<Option<ClusterRecord>> {
        Ok(self.clusters.read().get(fingerprint).cloned())
    }

    fn update_sentiment(&self, article_id: &str, sentiment: f64) -> Result<bool> {
        let mut articles = self.articles.write();
        for members in articles.values_mut() {
            if let Some(article) = members.iter_mut().find(|a| a.id == article_id) {
                article.sentiment = Some(sentiment.clamp(-1.0, 1.0));
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn list_cooling_expired(&self, now: DateTime<Utc>) -> Result<Vec<String>> {
        Ok(self
            .clusters
            .read()
            .values()
            .filter(|c| matches!(c.cooling_until, Some(until) if now >= until))
            .map(|c| c.fingerprint.clone())
            .collect())
    }

    fn clear_cooling_if_expired(&self, fingerprint: &str, now: DateTime<Utc>) -> Result<bool> {
        let mut clusters = self.clusters.write();
        if let Some(cluster) = clusters.get_mut(fingerprint) {
            if let Some(until) = cluster.cooling_until {
                if now >= until {
                    cluster.cooling_intensity = 0.0;
                    cluster.cooling_until = None;
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    fn list_stale(&self, now: DateTime<Utc>, retention_days: i64) -> Result<Vec<String>> {
        let cutoff = now - Duration::days(retention_days);
        Ok(self
            .clusters
            .read()
            .values()
            .filter(|c| c.last_seen < cutoff)
            .map(|c| c.fingerprint.clone())
            .collect())
    }

    fn delete_cluster(&self, fingerprint: &str) -> Result<bool> {
        let removed = self.clusters.write().remove(fingerprint);
        match removed {
            Some(cluster) => {
                // Cascade: articles and history go with the cluster.
                self.by_id.write().remove(&cluster.id);
                self.articles.write().remove(&cluster.id);
                self.history.write().remove(&cluster.id);
                info!(fingerprint, ticker = %cluster.ticker, "cluster deleted (cascade)");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn list_recent(&self, limit: usize) -> Result<Vec<ClusterRecord>> {
        let clusters = self.clusters.read();
        let mut all: Vec<ClusterRecord> = clusters.values().cloned().collect();
        all.sort_by_key(|c| std::cmp::Reverse(c.last_seen));
        all.truncate(limit);
        Ok(all)
    }

    fn list_suspicious(
        &self,
        verdicts: &[Verdict],
        within_cooling: bool,
        now: DateTime<Utc>,
    ) -> Result<Vec<ClusterRecord>> {
        let clusters = self.clusters.read();
        let mut matches: Vec<ClusterRecord> = clusters
            .values()
            .filter(|c| verdicts.contains(&c.verdict))
            .filter(|c| {
                !within_cooling || matches!(c.cooling_until, Some(until) if now < until)
            })
            .cloned()
            .collect();
        matches.sort_by_key(|c| std::cmp::Reverse(c.last_seen));
        Ok(matches)
    }

    fn list_high_confidence(
        &self,
        verdicts: &[Verdict],
        min_multiplier: f64,
        within_hours: i64,
        now: DateTime<Utc>,
    ) -> Result<Vec<ClusterRecord>> {
        let cutoff = now - Duration::hours(within_hours);
        let clusters = self.clusters.read();
        let mut matches: Vec<ClusterRecord> = clusters
            .values()
            .filter(|c| verdicts.contains(&c.verdict))
            .filter(|c| c.confidence_multiplier >= min_multiplier)
            .filter(|c| c.last_seen >= cutoff)
            .cloned()
            .collect();
        matches.sort_by(|a, b| {
            b.confidence_multiplier
                .partial_cmp(&a.confidence_multiplier)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Ok(matches)
    }

    fn counts(&self) -> Result<(usize, usize, usize)> {
        let clusters = self.clusters.read().len();
        let articles = self.articles.read().values().map(|v| v.len()).sum();
        let history = self.history.read().values().map(|v| v.len()).sum();
        Ok((clusters, articles, history))
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::ElMatch;
    use chrono::TimeZone;

    fn t(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 10, h, 0, 0).unwrap()
    }

    fn article(id: &str, cluster_id: ClusterId, published: Option<DateTime<Utc>>) -> ArticleRecord {
        ArticleRecord {
            id: id.to_string(),
            cluster_id,
            ticker: "AAPL".to_string(),
            title: format!("title {id}"),
            summary: String::new(),
            source: "wire".to_string(),
            source_tier: 1,
            published_at: published,
            added_at: t(12),
            sentiment: None,
        }
    }

    #[test]
    fn create_is_idempotent_per_fingerprint() {
        let repo = MemoryRepository::new();
        let (id1, created1) = repo.get_or_create_cluster("fp1", "AAPL", "guidance cut", t(9)).unwrap();
        let (id2, created2) = repo.get_or_create_cluster("fp1", "AAPL", "guidance cut", t(10)).unwrap();
        assert!(created1);
        assert!(!created2);
        assert_eq!(id1, id2);
    }

    #[test]
    fn new_cluster_starts_pending() {
        let repo = MemoryRepository::new();
        repo.get_or_create_cluster("fp1", "AAPL", "guidance cut", t(9)).unwrap();
        let cluster = repo.get_cluster("fp1").unwrap().unwrap();
        assert_eq!(cluster.verdict, Verdict::Pending);
        assert_eq!(cluster.article_count, 0);
        assert!((cluster.confidence_multiplier - 1.0).abs() < f64::EPSILON);
        assert!(cluster.cooling_until.is_none());
    }

    #[test]
    fn append_bumps_count_and_last_seen() {
        let repo = MemoryRepository::new();
        let (id, _) = repo.get_or_create_cluster("fp1", "AAPL", "guidance cut", t(9)).unwrap();
        repo.append_article(article("a1", id, Some(t(9)))).unwrap();
        repo.append_article(article("a2", id, Some(t(11)))).unwrap();

        let cluster = repo.get_cluster("fp1").unwrap().unwrap();
        assert_eq!(cluster.article_count, 2);
        assert_eq!(cluster.last_seen, t(11));
    }

    #[test]
    fn out_of_order_arrival_extends_first_seen() {
        let repo = MemoryRepository::new();
        let (id, _) = repo.get_or_create_cluster("fp1", "AAPL", "guidance cut", t(9)).unwrap();
        repo.append_article(article("a1", id, Some(t(9)))).unwrap();
        // Late delivery of an earlier-published article.
        repo.append_article(article("a0", id, Some(t(7)))).unwrap();

        let cluster = repo.get_cluster("fp1").unwrap().unwrap();
        assert_eq!(cluster.first_seen, t(7));
        assert_eq!(cluster.last_seen, t(9));
    }

    #[test]
    fn duplicate_article_id_is_ignored() {
        let repo = MemoryRepository::new();
        let (id, _) = repo.get_or_create_cluster("fp1", "AAPL", "guidance cut", t(9)).unwrap();
        assert!(repo.append_article(article("a1", id, Some(t(9)))).unwrap());
        assert!(!repo.append_article(article("a1", id, Some(t(10)))).unwrap());

        let cluster = repo.get_cluster("fp1").unwrap().unwrap();
        assert_eq!(cluster.article_count, 1);
    }

    #[test]
    fn signal_update_clamps_out_of_range() {
        let repo = MemoryRepository::new();
        let (id, _) = repo.get_or_create_cluster("fp1", "AAPL", "guidance cut", t(9)).unwrap();
        repo.update_signals(
            id,
            &SignalSet {
                di: 1.4,
                tn: -2.0,
                ni: -0.1,
                el: ElMatch {
                    matched: true,
                    confidence: 3.0,
                    event_name: None,
                },
            },
        )
        .unwrap();

        let cluster = repo.get_cluster("fp1").unwrap().unwrap();
        assert!((cluster.di - 1.0).abs() < f64::EPSILON);
        assert!((cluster.tn + 1.0).abs() < f64::EPSILON);
        assert!((cluster.ni - 0.0).abs() < f64::EPSILON);
        assert!((cluster.el_confidence - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn verdict_update_normalises_cooling_invariant() {
        let repo = MemoryRepository::new();
        let (id, _) = repo.get_or_create_cluster("fp1", "AAPL", "guidance cut", t(9)).unwrap();

        // Intensity without a window: dropped to no cooling.
        repo.update_verdict(
            id,
            &ClassifierOutcome {
                verdict: Verdict::Watch,
                reason: "test".to_string(),
                confidence_multiplier: 1.0,
                cooling_intensity: 0.3,
                cooling_until: None,
                nfpi: 50.0,
            },
        )
        .unwrap();
        let cluster = repo.get_cluster("fp1").unwrap().unwrap();
        assert!((cluster.cooling_intensity - 0.0).abs() < f64::EPSILON);
        assert!(cluster.cooling_until.is_none());

        // Window without intensity: window dropped.
        repo.update_verdict(
            id,
            &ClassifierOutcome {
                verdict: Verdict::Noise,
                reason: "test".to_string(),
                confidence_multiplier: 1.0,
                cooling_intensity: 0.0,
                cooling_until: Some(t(20)),
                nfpi: 50.0,
            },
        )
        .unwrap();
        let cluster = repo.get_cluster("fp1").unwrap().unwrap();
        assert!(cluster.cooling_until.is_none());
    }

    #[test]
    fn cooling_expiry_round_trip() {
        let repo = MemoryRepository::new();
        let (id, _) = repo.get_or_create_cluster("fp1", "AAPL", "guidance cut", t(9)).unwrap();
        repo.update_verdict(
            id,
            &ClassifierOutcome {
                verdict: Verdict::ManipulationAttack,
                reason: "test".to_string(),
                confidence_multiplier: 0.0,
                cooling_intensity: 1.0,
                cooling_until: Some(t(12)),
                nfpi: 90.0,
            },
        )
        .unwrap();

        assert!(repo.list_cooling_expired(t(11)).unwrap().is_empty());
        assert!(!repo.clear_cooling_if_expired("fp1", t(11)).unwrap());

        assert_eq!(repo.list_cooling_expired(t(12)).unwrap(), vec!["fp1"]);
        assert!(repo.clear_cooling_if_expired("fp1", t(12)).unwrap());

        let cluster = repo.get_cluster("fp1").unwrap().unwrap();
        assert!((cluster.cooling_intensity - 0.0).abs() < f64::EPSILON);
        assert!(cluster.cooling_until.is_none());
    }

    #[test]
    fn delete_cascades_articles_and_history() {
        let repo = MemoryRepository::new();
        let (id, _) = repo.get_or_create_cluster("fp1", "AAPL", "guidance cut", t(9)).unwrap();
        repo.append_article(article("a1", id, Some(t(9)))).unwrap();
        repo.append_history_snapshot(SignalHistorySnapshot {
            cluster_id: id,
            di: 0.0,
            tn: 0.0,
            ni: 1.0,
            el_matched: false,
            el_confidence: 0.0,
            verdict: Verdict::Pending,
            confidence_multiplier: 1.0,
            article_count: 1,
            snapshot_at: t(9),
        })
        .unwrap();

        assert!(repo.delete_cluster("fp1").unwrap());
        assert!(repo.get_cluster("fp1").unwrap().is_none());
        assert!(repo.articles_of(id).unwrap().is_empty());
        assert!(repo.history(id).unwrap().is_empty());
        assert_eq!(repo.counts().unwrap(), (0, 0, 0));
    }

    #[test]
    fn stale_listing_respects_retention_window() {
        let repo = MemoryRepository::new();
        let (old_id, _) = repo.get_or_create_cluster("old", "AAPL", "old story", t(9)).unwrap();
        repo.append_article(article("a1", old_id, Some(t(9)))).unwrap();
        let (new_id, _) = repo.get_or_create_cluster("new", "MSFT", "new story", t(9)).unwrap();
        repo.append_article(article("a2", new_id, Some(t(9) + Duration::days(6)))).unwrap();

        let now = t(9) + Duration::days(7) + Duration::hours(1);
        let stale = repo.list_stale(now, 7).unwrap();
        assert_eq!(stale, vec!["old"]);
    }

    #[test]
    fn late_sentiment_enrichment() {
        let repo = MemoryRepository::new();
        let (id, _) = repo.get_or_create_cluster("fp1", "AAPL", "guidance cut", t(9)).unwrap();
        repo.append_article(article("a1", id, Some(t(9)))).unwrap();

        assert!(repo.update_sentiment("a1", -0.6).unwrap());
        assert!(!repo.update_sentiment("ghost", 0.0).unwrap());

        let members = repo.articles_of(id).unwrap();
        assert_eq!(members[0].sentiment, Some(-0.6));

        // Out-of-range enrichment clamps at the boundary.
        repo.update_sentiment("a1", 7.0).unwrap();
        assert_eq!(repo.articles_of(id).unwrap()[0].sentiment, Some(1.0));
    }

    #[test]
    fn suspicious_and_high_confidence_queries() {
        let repo = MemoryRepository::new();
        let (bad, _) = repo.get_or_create_cluster("bad", "AAPL", "pump", t(9)).unwrap();
        repo.append_article(article("a1", bad, Some(t(9)))).unwrap();
        repo.update_verdict(
            bad,
            &ClassifierOutcome {
                verdict: Verdict::ManipulationAttack,
                reason: "test".to_string(),
                confidence_multiplier: 0.0,
                cooling_intensity: 1.0,
                cooling_until: Some(t(9) + Duration::hours(24)),
                nfpi: 95.0,
            },
        )
        .unwrap();

        let (good, _) = repo.get_or_create_cluster("good", "MSFT", "earnings beat", t(10)).unwrap();
        repo.append_article(article("a2", good, Some(t(10)))).unwrap();
        repo.update_verdict(
            good,
            &ClassifierOutcome {
                verdict: Verdict::OrganicConsensus,
                reason: "test".to_string(),
                confidence_multiplier: 1.4,
                cooling_intensity: 0.0,
                cooling_until: None,
                nfpi: 10.0,
            },
        )
        .unwrap();

        let sus = repo
            .list_suspicious(&[Verdict::ManipulationAttack, Verdict::PrCampaign], true, t(12))
            .unwrap();
        assert_eq!(sus.len(), 1);
        assert_eq!(sus[0].fingerprint, "bad");

        // Outside the cooling window the within_cooling filter drops it.
        let sus_late = repo
            .list_suspicious(&[Verdict::ManipulationAttack], true, t(9) + Duration::hours(25))
            .unwrap();
        assert!(sus_late.is_empty());

        let high = repo
            .list_high_confidence(&[Verdict::OrganicConsensus, Verdict::EmbargoEvent], 1.2, 24, t(12))
            .unwrap();
        assert_eq!(high.len(), 1);
        assert_eq!(high[0].fingerprint, "good");

        let too_high = repo
            .list_high_confidence(&[Verdict::OrganicConsensus], 1.5, 24, t(12))
            .unwrap();
        assert!(too_high.is_empty());
    }
}
