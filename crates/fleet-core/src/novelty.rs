//! Tracking of already-shown events for time-bounded "new" highlighting.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

use crate::models::{EventKey, FleetEvent};

/// Keys first observed by one ingestion, sharing a single expiry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NoveltyBatch {
    pub id: u64,
    pub keys: Vec<EventKey>,
    pub expires_at: DateTime<Utc>,
}

impl NoveltyBatch {
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

#[derive(Debug, Clone, Copy)]
struct Highlight {
    batch: u64,
    expires_at: DateTime<Utc>,
}

/// Seen/highlighted bookkeeping for the live event feed.
///
/// `seen` only grows until [`reset`](Self::reset). Expiry and release remove
/// keys from the highlighted subset only.
#[derive(Debug, Clone)]
pub struct EventNoveltyTracker {
    window: Duration,
    seen: HashSet<EventKey>,
    highlighted: HashMap<EventKey, Highlight>,
    seeded: bool,
    next_batch: u64,
}

impl EventNoveltyTracker {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            seen: HashSet::new(),
            highlighted: HashMap::new(),
            seeded: false,
            next_batch: 1,
        }
    }

    /// Record a batch of events and return the keys that are new.
    ///
    /// The first ingestion after construction or reset only seeds `seen`, so an
    /// initial load never floods the feed with highlights.
    pub fn ingest(&mut self, events: &[FleetEvent], now: DateTime<Utc>) -> NoveltyBatch {
        let id = self.next_batch;
        self.next_batch += 1;
        let expires_at = now + self.window;

        if !self.seeded {
            self.seen.extend(events.iter().map(EventKey::of));
            self.seeded = true;
            return NoveltyBatch { id, keys: Vec::new(), expires_at };
        }

        let mut keys = Vec::new();
        for event in events {
            let key = event.key();
            if self.seen.insert(key.clone()) {
                self.highlighted.insert(key.clone(), Highlight { batch: id, expires_at });
                keys.push(key);
            }
        }

        NoveltyBatch { id, keys, expires_at }
    }

    /// One-shot timer callback for a batch. Returns how many keys were un-highlighted.
    pub fn release(&mut self, batch_id: u64) -> usize {
        let before = self.highlighted.len();
        self.highlighted.retain(|_, highlight| highlight.batch != batch_id);
        before - self.highlighted.len()
    }

    /// Drop every highlight whose window has elapsed.
    pub fn expire(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.highlighted.len();
        self.highlighted.retain(|_, highlight| highlight.expires_at > now);
        before - self.highlighted.len()
    }

    pub fn is_highlighted(&self, key: &EventKey, now: DateTime<Utc>) -> bool {
        self.highlighted
            .get(key)
            .is_some_and(|highlight| highlight.expires_at > now)
    }

    /// Currently highlighted keys in timestamp order.
    pub fn highlighted(&self, now: DateTime<Utc>) -> Vec<EventKey> {
        let mut keys: Vec<EventKey> = self
            .highlighted
            .iter()
            .filter(|(_, highlight)| highlight.expires_at > now)
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort();
        keys
    }

    pub fn is_seen(&self, key: &EventKey) -> bool {
        self.seen.contains(key)
    }

    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }

    /// Forget everything; the next ingestion seeds silently again.
    pub fn reset(&mut self) {
        self.seen.clear();
        self.highlighted.clear();
        self.seeded = false;
    }
}

impl Default for EventNoveltyTracker {
    fn default() -> Self {
        Self::new(Duration::seconds(10))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EventKind, EventMeta};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn event(minute: i64, tail: &str, kind: EventKind) -> FleetEvent {
        FleetEvent {
            ts: now() - Duration::minutes(minute),
            kind,
            tail_number: tail.into(),
            icao24: String::new(),
            meta: EventMeta::default(),
        }
    }

    #[test]
    fn first_ingestion_seeds_without_highlighting() {
        let mut tracker = EventNoveltyTracker::default();
        let events = vec![
            event(1, "LV-A", EventKind::Takeoff),
            event(2, "LV-B", EventKind::Landing),
            event(3, "LV-C", EventKind::Appeared),
        ];

        let batch = tracker.ingest(&events, now());
        assert!(batch.is_empty());
        assert!(tracker.highlighted(now()).is_empty());
        assert_eq!(tracker.seen_count(), 3);
        assert!(events.iter().all(|e| tracker.is_seen(&e.key())));
    }

    #[test]
    fn new_event_highlighted_once_then_expires() {
        let mut tracker = EventNoveltyTracker::default();
        let old = event(5, "LV-A", EventKind::Takeoff);
        tracker.ingest(std::slice::from_ref(&old), now());

        let fresh = event(0, "LV-A", EventKind::Landing);
        let batch = tracker.ingest(&[fresh.clone(), old.clone()], now());
        assert_eq!(batch.keys, vec![fresh.key()]);
        assert_eq!(batch.expires_at, now() + Duration::seconds(10));
        assert!(tracker.is_highlighted(&fresh.key(), now()));
        assert!(!tracker.is_highlighted(&old.key(), now()));

        // Reappearing in the next snapshot does not re-flag it
        let again = tracker.ingest(&[fresh.clone(), old], now() + Duration::seconds(5));
        assert!(again.is_empty());
        assert_eq!(tracker.highlighted(now() + Duration::seconds(5)).len(), 1);

        // Window elapsed: no longer highlighted, still seen
        let later = now() + Duration::seconds(10);
        assert!(!tracker.is_highlighted(&fresh.key(), later));
        assert!(tracker.is_seen(&fresh.key()));
    }

    #[test]
    fn release_removes_only_that_batch() {
        let mut tracker = EventNoveltyTracker::default();
        tracker.ingest(&[], now());

        let first = tracker.ingest(&[event(0, "LV-A", EventKind::Takeoff)], now());
        let second = tracker.ingest(&[event(0, "LV-B", EventKind::Takeoff)], now());

        assert_eq!(tracker.release(first.id), 1);
        let remaining = tracker.highlighted(now());
        assert_eq!(remaining, second.keys);
        assert_eq!(tracker.seen_count(), 2);

        assert_eq!(tracker.release(first.id), 0);
    }

    #[test]
    fn expire_drops_elapsed_highlights() {
        let mut tracker = EventNoveltyTracker::new(Duration::seconds(10));
        tracker.ingest(&[], now());
        tracker.ingest(&[event(0, "LV-A", EventKind::Emergency)], now());
        tracker.ingest(&[event(0, "LV-B", EventKind::Emergency)], now() + Duration::seconds(6));

        assert_eq!(tracker.expire(now() + Duration::seconds(10)), 1);
        assert_eq!(tracker.highlighted(now() + Duration::seconds(10)).len(), 1);
        assert_eq!(tracker.seen_count(), 2);
    }

    #[test]
    fn reset_reseeds_silently() {
        let mut tracker = EventNoveltyTracker::default();
        tracker.ingest(&[], now());
        tracker.ingest(&[event(0, "LV-A", EventKind::Takeoff)], now());
        tracker.reset();

        let batch = tracker.ingest(&[event(0, "LV-B", EventKind::Takeoff)], now());
        assert!(batch.is_empty());
        assert_eq!(tracker.seen_count(), 1);
        assert!(tracker.highlighted(now()).is_empty());
    }
}
