// =============================================================================
// Calendar Collector — periodic HTTP refresh of the event store
// =============================================================================
//
// Polls a configured JSON feed of scheduled events and upserts them into the
// `CalendarStore`. A failed or slow fetch logs a warning and leaves the
// previous store intact; the matcher degrades to its documented fallback
// rather than blocking or failing classification.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{debug, info, warn};

use crate::calendar::{CalendarStore, EconomicCalendarEvent};
use crate::error::EngineError;
use crate::runtime_config::CalendarParams;

/// Days of past events kept in the store before pruning.
const KEEP_PAST_DAYS: i64 = 7;

/// Fetches scheduled events from an HTTP feed.
pub struct CalendarCollector {
    client: reqwest::Client,
    feed_url: String,
}

impl CalendarCollector {
    /// Build a collector for `feed_url` with a bounded request timeout.
    pub fn new(feed_url: String, timeout_secs: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build reqwest client for CalendarCollector")?;

        Ok(Self { client, feed_url })
    }

    /// Fetch the feed once and parse it into events.
    ///
    /// Any transport, status or parse failure maps to
    /// `CollaboratorUnavailable` — the caller degrades, never aborts.
    pub async fn fetch(&self) -> Result<Vec<EconomicCalendarEvent>, EngineError> {
        let unavailable = |detail: String| EngineError::CollaboratorUnavailable {
            name: "calendar-feed",
            detail,
        };

        let resp = self
            .client
            .get(&self.feed_url)
            .send()
            .await
            .map_err(|e| unavailable(format!("GET {}: {e}", self.feed_url)))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(unavailable(format!("feed returned {status}")));
        }

        let events: Vec<EconomicCalendarEvent> = resp
            .json()
            .await
            .map_err(|e| unavailable(format!("malformed feed body: {e}")))?;

        debug!(count = events.len(), "calendar feed fetched");
        Ok(events)
    }
}

/// Background loop: refresh the store every `params.refresh_secs`.
///
/// Runs only when a feed URL is configured; otherwise the store is fed
/// exclusively through the upsert endpoint.
pub async fn run_calendar_collector(store: Arc<CalendarStore>, params: CalendarParams) {
    let feed_url = match &params.feed_url {
        Some(url) => url.clone(),
        None => {
            info!("no calendar feed configured — collector idle");
            return;
        }
    };

    let collector = match CalendarCollector::new(feed_url.clone(), params.fetch_timeout_secs) {
        Ok(c) => c,
        Err(e) => {
            warn!(error = %e, "calendar collector failed to initialise — store will rely on upserts");
            return;
        }
    };

    info!(url = %feed_url, refresh_secs = params.refresh_secs, "calendar collector starting");

    let mut interval = tokio::time::interval(Duration::from_secs(params.refresh_secs.max(30)));
    loop {
        interval.tick().await;

        match collector.fetch().await {
            Ok(events) => {
                let count = store.upsert(events);
                let pruned = store.prune_older_than(Utc::now(), KEEP_PAST_DAYS);
                info!(upserted = count, pruned, "calendar store refreshed");
            }
            Err(e) => {
                // Degraded collaborator: keep the previous store, matcher
                // falls back to no-match for windows it cannot cover.
                warn!(error = %e, "calendar refresh failed — keeping previous store");
            }
        }
    }
}
