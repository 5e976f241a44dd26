// =============================================================================
// Retention sweep — lifecycle GC of stale clusters
// =============================================================================
//
// Clusters idle past the retention window are deleted wholesale, cascading
// to their articles and history. The sweep goes through the cluster
// manager's per-fingerprint locks, so it never races an in-flight ingest
// for the same cluster.

use std::sync::Arc;

use chrono::Utc;
use parking_lot::RwLock;
use tracing::{error, info};

use crate::cluster::ClusterManager;
use crate::runtime_config::RuntimeConfig;

/// Background loop: purge stale clusters every `retention_sweep_secs`.
pub async fn run_retention_sweep(manager: Arc<ClusterManager>, config: Arc<RwLock<RuntimeConfig>>) {
    let (sweep_secs, retention_days) = {
        let cfg = config.read();
        (cfg.retention_sweep_secs.max(60), cfg.retention_days)
    };
    info!(sweep_secs, retention_days, "retention sweep starting");

    let mut interval = tokio::time::interval(std::time::Duration::from_secs(sweep_secs));
    loop {
        interval.tick().await;

        // Re-read the window each pass so config changes apply without a
        // restart.
        let retention_days = config.read().retention_days;
        match manager.purge_stale(Utc::now(), retention_days) {
            Ok(purged) if purged > 0 => info!(purged, "retention sweep complete"),
            Ok(_) => {}
            Err(e) => error!(error = %e, "retention sweep failed"),
        }
    }
}
