// =============================================================================
// Economic Calendar — scheduled-event store and burst matcher
// =============================================================================
//
// Answers "is there a scheduled legitimate event explaining this news
// burst?". The store is populated by the HTTP collector (see `collector`)
// and by the authenticated upsert endpoint; the matcher only ever reads it.
//
// An empty or stale store is a designed fallback, not an error: the matcher
// returns `matched = false, confidence = 0.0` and classification continues.

pub mod collector;

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

use crate::runtime_config::CalendarParams;

/// A scheduled economic event (earnings release, FOMC, CPI print, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EconomicCalendarEvent {
    /// External event id.
    pub id: String,
    /// e.g. "earnings", "fomc", "cpi".
    pub event_type: String,
    /// None for macro events that affect every ticker.
    #[serde(default)]
    pub ticker: Option<String>,
    pub scheduled_time: DateTime<Utc>,
    /// 1 (minor) .. 3 (major).
    #[serde(default = "default_importance")]
    pub importance: u8,
    #[serde(default)]
    pub event_name: String,
}

fn default_importance() -> u8 {
    1
}

/// Result of a calendar match for a cluster's burst window.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ElMatch {
    pub matched: bool,
    /// [0, 1]; higher when the burst start tightly brackets the scheduled
    /// time and the event is important.
    pub confidence: f64,
    #[serde(default)]
    pub event_name: Option<String>,
}

impl ElMatch {
    /// The documented degraded-collaborator fallback.
    pub fn none() -> Self {
        Self::default()
    }
}

/// Thread-safe in-memory calendar with the burst-window matcher.
pub struct CalendarStore {
    events: RwLock<HashMap<String, EconomicCalendarEvent>>,
}

impl CalendarStore {
    pub fn new() -> Self {
        Self {
            events: RwLock::new(HashMap::new()),
        }
    }

    /// Insert or replace events by id. Returns how many were upserted.
    pub fn upsert(&self, incoming: Vec<EconomicCalendarEvent>) -> usize {
        let mut events = self.events.write();
        let count = incoming.len();
        for ev in incoming {
            events.insert(ev.id.clone(), ev);
        }
        count
    }

    /// Drop events scheduled more than `keep_days` days in the past.
    pub fn prune_older_than(&self, now: DateTime<Utc>, keep_days: i64) -> usize {
        let cutoff = now - Duration::days(keep_days);
        let mut events = self.events.write();
        let before = events.len();
        events.retain(|_, ev| ev.scheduled_time >= cutoff);
        before - events.len()
    }

    /// All stored events, soonest first.
    pub fn snapshot(&self) -> Vec<EconomicCalendarEvent> {
        let events = self.events.read();
        let mut all: Vec<EconomicCalendarEvent> = events.values().cloned().collect();
        all.sort_by_key(|ev| ev.scheduled_time);
        all
    }

    /// Match a cluster's burst window against the calendar.
    ///
    /// The search window is `[window_start - lookback, window_end +
    /// lookahead]`. Among candidate events for `ticker` (ticker-specific or
    /// macro), confidence is proximity of the burst start to the scheduled
    /// time, scaled by event importance; the best candidate wins.
    pub fn matches(
        &self,
        ticker: &str,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
        params: &CalendarParams,
    ) -> ElMatch {
        let search_start = window_start - Duration::hours(params.lookback_hours);
        let search_end = window_end + Duration::hours(params.lookahead_hours);
        let horizon_secs = (params.proximity_horizon_hours.max(1) * 3600) as f64;

        let events = self.events.read();

        let mut best = ElMatch::none();
        for ev in events.values() {
            if let Some(ev_ticker) = &ev.ticker {
                if ev_ticker != ticker {
                    continue;
                }
            }
            if ev.scheduled_time < search_start || ev.scheduled_time > search_end {
                continue;
            }

            let dist_secs = (window_start - ev.scheduled_time).num_seconds().abs() as f64;
            let proximity = (1.0 - dist_secs / horizon_secs).clamp(0.0, 1.0);
            let importance_factor = 0.5 + 0.5 * (ev.importance.min(3) as f64 / 3.0);
            let confidence = proximity * importance_factor;

            if confidence > best.confidence {
                best = ElMatch {
                    matched: confidence > 0.0,
                    confidence,
                    event_name: Some(if ev.event_name.is_empty() {
                        ev.event_type.clone()
                    } else {
                        ev.event_name.clone()
                    }),
                };
            }
        }

        debug!(
            ticker,
            matched = best.matched,
            confidence = format!("{:.3}", best.confidence),
            event = ?best.event_name,
            "calendar match"
        );

        best
    }
}

impl Default for CalendarStore {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 10, h, m, 0).unwrap()
    }

    fn earnings(id: &str, ticker: &str, at: DateTime<Utc>, importance: u8) -> EconomicCalendarEvent {
        EconomicCalendarEvent {
            id: id.to_string(),
            event_type: "earnings".to_string(),
            ticker: Some(ticker.to_string()),
            scheduled_time: at,
            importance,
            event_name: format!("{ticker} earnings release"),
        }
    }

    #[test]
    fn empty_store_returns_fallback() {
        let store = CalendarStore::new();
        let m = store.matches("AAPL", t(14, 0), t(14, 30), &CalendarParams::default());
        assert!(!m.matched);
        assert!((m.confidence - 0.0).abs() < f64::EPSILON);
        assert!(m.event_name.is_none());
    }

    #[test]
    fn tight_bracket_high_importance_scores_high() {
        let store = CalendarStore::new();
        store.upsert(vec![earnings("e1", "AAPL", t(14, 0), 3)]);

        // Burst starts 15 minutes after the scheduled time.
        let m = store.matches("AAPL", t(14, 15), t(14, 45), &CalendarParams::default());
        assert!(m.matched);
        assert!(m.confidence > 0.9, "got {}", m.confidence);
        assert_eq!(m.event_name.as_deref(), Some("AAPL earnings release"));
    }

    #[test]
    fn distant_event_scores_low() {
        let store = CalendarStore::new();
        store.upsert(vec![earnings("e1", "AAPL", t(2, 0), 3)]);

        // Burst starts 9 hours after the scheduled time — inside the search
        // window (12h lookback) but beyond the 6h proximity horizon.
        let m = store.matches("AAPL", t(11, 0), t(11, 30), &CalendarParams::default());
        assert!(!m.matched);
        assert!((m.confidence - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn wrong_ticker_does_not_match() {
        let store = CalendarStore::new();
        store.upsert(vec![earnings("e1", "MSFT", t(14, 0), 3)]);
        let m = store.matches("AAPL", t(14, 0), t(14, 30), &CalendarParams::default());
        assert!(!m.matched);
    }

    #[test]
    fn macro_event_matches_any_ticker() {
        let store = CalendarStore::new();
        store.upsert(vec![EconomicCalendarEvent {
            id: "fomc-1".to_string(),
            event_type: "fomc".to_string(),
            ticker: None,
            scheduled_time: t(18, 0),
            importance: 3,
            event_name: "FOMC rate decision".to_string(),
        }]);

        let m = store.matches("AAPL", t(18, 5), t(18, 30), &CalendarParams::default());
        assert!(m.matched);
        assert_eq!(m.event_name.as_deref(), Some("FOMC rate decision"));
    }

    #[test]
    fn lower_importance_attenuates_confidence() {
        let store = CalendarStore::new();
        store.upsert(vec![earnings("hi", "AAPL", t(14, 0), 3)]);
        let hi = store
            .matches("AAPL", t(14, 10), t(14, 30), &CalendarParams::default())
            .confidence;

        let store2 = CalendarStore::new();
        store2.upsert(vec![earnings("lo", "AAPL", t(14, 0), 1)]);
        let lo = store2
            .matches("AAPL", t(14, 10), t(14, 30), &CalendarParams::default())
            .confidence;

        assert!(hi > lo, "importance 3 ({hi}) should beat importance 1 ({lo})");
    }

    #[test]
    fn best_of_multiple_candidates_wins() {
        let store = CalendarStore::new();
        store.upsert(vec![
            earnings("far", "AAPL", t(9, 0), 3),
            earnings("near", "AAPL", t(14, 0), 3),
        ]);
        let m = store.matches("AAPL", t(14, 5), t(14, 30), &CalendarParams::default());
        assert!(m.matched);
        assert!(m.confidence > 0.9);
    }

    #[test]
    fn upsert_replaces_by_id() {
        let store = CalendarStore::new();
        store.upsert(vec![earnings("e1", "AAPL", t(14, 0), 1)]);
        store.upsert(vec![earnings("e1", "AAPL", t(15, 0), 3)]);
        let all = store.snapshot();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].importance, 3);
    }

    #[test]
    fn prune_drops_stale_events() {
        let store = CalendarStore::new();
        store.upsert(vec![
            earnings("old", "AAPL", t(14, 0) - Duration::days(10), 2),
            earnings("new", "AAPL", t(14, 0), 2),
        ]);
        let dropped = store.prune_older_than(t(14, 0), 7);
        assert_eq!(dropped, 1);
        assert_eq!(store.snapshot().len(), 1);
    }
}
