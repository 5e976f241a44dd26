// =============================================================================
// Cooling / Quarantine Manager — time-bounded trust suppression
// =============================================================================
//
// A negative verdict opens a cooling window; while the window is open the
// cluster's effective trust is suppressed by `cooling_intensity`. Decay is
// one-directional: the periodic sweep only ever clears expired windows, and
// nothing re-escalates without a fresh classifier transition.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tracing::{error, info};

use crate::cluster::ClusterManager;
use crate::runtime_config::RuntimeConfig;

/// Effective suppression factor for a cluster at `now`.
///
/// 0.0 = trust fully, 1.0 = fully blocked. Downstream consumers apply this
/// multiplicatively against the confidence multiplier.
pub fn suppression_factor(
    cooling_intensity: f64,
    cooling_until: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> f64 {
    match cooling_until {
        Some(until) if now < until => cooling_intensity.clamp(0.0, 1.0),
        _ => 0.0,
    }
}

/// Background loop: clear expired cooling windows every
/// `cooling_sweep_secs`.
pub async fn run_cooling_sweep(manager: Arc<ClusterManager>, config: Arc<RwLock<RuntimeConfig>>) {
    let sweep_secs = config.read().cooling_sweep_secs.max(5);
    info!(sweep_secs, "cooling sweep starting");

    let mut interval = tokio::time::interval(std::time::Duration::from_secs(sweep_secs));
    loop {
        interval.tick().await;

        match manager.decay_cooling(Utc::now()) {
            Ok(cleared) if cleared > 0 => {
                info!(cleared, "cooling windows expired and cleared");
            }
            Ok(_) => {}
            Err(e) => error!(error = %e, "cooling sweep failed"),
        }
    }
}
