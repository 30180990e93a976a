//! The operator's dashboard session.
//!
//! One `DashboardSession` owns everything the dashboard shows: the latest live
//! snapshot, the novelty tracker, the replay controller, the selected aircraft,
//! the error banner and the flight board. Loops and handlers mutate it only
//! through these methods.

use chrono::{DateTime, Utc};
use serde::Serialize;

use fleet_core::airports::nearest_airport;
use fleet_core::{
    build_trail, classify_fleet, correlate, Correlation, EngineRules, EventKey,
    EventNoveltyTracker, FleetEvent, FleetFilter, FleetKpis, FleetRow, FlightEntry,
    NoveltyBatch, Position, ReplayController, ReplayFailure, ReplayRequest, ReplayStatus,
    ReplayStep, ReplayTicket, ResolveOutcome, Snapshot, Trail,
};

/// Explicit panel state so the renderer never has to infer emptiness.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "data", rename_all = "snake_case")]
pub enum Panel<T> {
    Loading,
    NoData,
    Ready(T),
}

impl<T> Panel<T> {
    pub fn is_ready(&self) -> bool {
        matches!(self, Panel::Ready(_))
    }

    pub fn ready(self) -> Option<T> {
        match self {
            Panel::Ready(data) => Some(data),
            _ => None,
        }
    }
}

impl<T> Panel<Vec<T>> {
    /// `None` is still loading; an empty list is loaded but empty.
    pub fn from_items(items: Option<Vec<T>>) -> Self {
        match items {
            None => Panel::Loading,
            Some(items) if items.is_empty() => Panel::NoData,
            Some(items) => Panel::Ready(items),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayMode {
    Live,
    Replay,
}

/// Dismissible notice for a transient fetch failure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Banner {
    pub message: String,
    pub raised_at: DateTime<Utc>,
}

/// One live feed row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedItem {
    #[serde(flatten)]
    pub event: FleetEvent,
    pub key: EventKey,
    pub is_new: bool,
}

/// Everything the rendering layer needs for one frame.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub mode: DisplayMode,
    pub banner: Option<Banner>,
    /// Backend data age, ticking between polls
    pub data_age_seconds: Option<i64>,
    pub kpis: Panel<FleetKpis>,
    pub fleet: Panel<Vec<FleetRow>>,
    pub feed: Panel<Vec<FeedItem>>,
    pub flights: Panel<Vec<FlightEntry>>,
    pub board: Panel<Vec<FlightEntry>>,
    pub replay: ReplayStatus,
    pub selected: Option<String>,
    pub trail: Option<Trail>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FlightsView {
    /// Flights correlated from the events currently on display
    pub correlated: Panel<Vec<FlightEntry>>,
    /// Flight history as stored by the backend
    pub board: Panel<Vec<FlightEntry>>,
}

/// Data source for the current frame: the replay step on display, else the
/// live snapshot.
struct Frame<'a> {
    positions: &'a [Position],
    events: &'a [FleetEvent],
    kpis: FleetKpis,
    /// Reference time for classification
    now: DateTime<Utc>,
    step: Option<&'a ReplayStep>,
}

#[derive(Debug)]
pub struct DashboardSession {
    rules: EngineRules,
    snapshot: Option<Snapshot>,
    received_at: Option<DateTime<Utc>>,
    correlation: Correlation,
    novelty: EventNoveltyTracker,
    replay: ReplayController,
    selected: Option<String>,
    banner: Option<Banner>,
    board: Option<Vec<FlightEntry>>,
}

impl DashboardSession {
    pub fn new(rules: EngineRules) -> Self {
        Self {
            novelty: EventNoveltyTracker::new(rules.highlight_window()),
            rules,
            snapshot: None,
            received_at: None,
            correlation: Correlation::default(),
            replay: ReplayController::new(),
            selected: None,
            banner: None,
            board: None,
        }
    }

    pub fn rules(&self) -> &EngineRules {
        &self.rules
    }

    pub fn snapshot(&self) -> Option<&Snapshot> {
        self.snapshot.as_ref()
    }

    pub fn banner(&self) -> Option<&Banner> {
        self.banner.as_ref()
    }

    pub fn replay(&self) -> &ReplayController {
        &self.replay
    }

    pub fn replay_mut(&mut self) -> &mut ReplayController {
        &mut self.replay
    }

    pub fn mode(&self) -> DisplayMode {
        if self.replay.is_replaying() {
            DisplayMode::Replay
        } else {
            DisplayMode::Live
        }
    }

    /// Take in a fresh live snapshot. Novelty is computed before correlation so
    /// both see the same events. A successful cycle clears the banner.
    pub fn apply_snapshot(&mut self, snapshot: Snapshot, now: DateTime<Utc>) -> NoveltyBatch {
        self.novelty.expire(now);
        let batch = self.novelty.ingest(&snapshot.events, now);
        self.correlation = correlate(&snapshot.events, &self.rules);
        self.snapshot = Some(snapshot);
        self.received_at = Some(now);
        self.banner = None;
        batch
    }

    /// Highlight timer callback.
    pub fn release_highlights(&mut self, batch_id: u64) -> usize {
        self.novelty.release(batch_id)
    }

    pub fn record_fetch_failure(&mut self, message: impl Into<String>, now: DateTime<Utc>) {
        self.banner = Some(Banner {
            message: message.into(),
            raised_at: now,
        });
    }

    /// Dismiss the banner together with any replay error it describes.
    pub fn dismiss_banner(&mut self) {
        self.banner = None;
        self.replay.dismiss_error();
    }

    pub fn apply_board(&mut self, entries: Vec<FlightEntry>) {
        self.board = Some(entries);
    }

    pub fn begin_replay(&mut self, request: ReplayRequest) -> ReplayTicket {
        self.replay.request(request)
    }

    /// Hand a fetch result to the replay controller. A transport failure also
    /// raises the banner; an empty result only shows in the replay state.
    pub fn complete_replay(
        &mut self,
        ticket: ReplayTicket,
        result: Result<Vec<ReplayStep>, String>,
        now: DateTime<Utc>,
    ) -> ResolveOutcome {
        let outcome = self.replay.resolve(ticket, result);
        if let ResolveOutcome::Failed(ReplayFailure::Fetch(message)) = &outcome {
            self.record_fetch_failure(format!("Replay failed: {message}"), now);
        }
        outcome
    }

    pub fn exit_replay(&mut self) {
        self.replay.exit_to_live();
    }

    /// Select the aircraft whose trail is drawn. Blank clears the selection.
    pub fn select(&mut self, icao24: Option<String>) {
        self.selected = icao24
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty());
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Trail of the selected aircraft up to the current replay index.
    pub fn trail(&self) -> Option<Trail> {
        let icao24 = self.selected.as_deref()?;
        if !self.replay.is_replaying() {
            return None;
        }
        Some(build_trail(self.replay.steps(), icao24, self.replay.index()))
    }

    /// Displayed data age: the backend's freshness plus the time since arrival.
    pub fn data_age_seconds(&self, now: DateTime<Utc>) -> Option<i64> {
        let snapshot = self.snapshot.as_ref()?;
        let received_at = self.received_at?;
        let elapsed = (now - received_at).num_seconds().max(0);
        Some(snapshot.data_freshness_seconds + elapsed)
    }

    fn frame(&self, now: DateTime<Utc>) -> Option<Frame<'_>> {
        if let Some(step) = self.replay.current_step() {
            return Some(Frame {
                positions: &step.positions,
                events: &step.events,
                kpis: step.kpis,
                now: step.ts,
                step: Some(step),
            });
        }
        if self.replay.is_replaying() {
            return None;
        }
        self.snapshot.as_ref().map(|snapshot| Frame {
            positions: &snapshot.positions,
            events: &snapshot.events,
            kpis: snapshot.kpis,
            now,
            step: None,
        })
    }

    pub fn kpis(&self, now: DateTime<Utc>) -> Option<FleetKpis> {
        self.frame(now).map(|frame| frame.kpis)
    }

    /// Classified fleet rows. In replay, classification runs against the step
    /// timestamp instead of the wall clock.
    pub fn fleet_rows(&self, now: DateTime<Utc>, filter: &FleetFilter) -> Option<Vec<FleetRow>> {
        let frame = self.frame(now)?;
        let positions: Vec<Position> = frame
            .positions
            .iter()
            .filter(|position| filter.matches(position))
            .cloned()
            .collect();

        let mut rows = classify_fleet(&positions, frame.events, frame.now, &self.rules);
        for row in &mut rows {
            self.label_location(&mut row.position);
        }
        Some(rows)
    }

    fn label_location(&self, position: &mut Position) {
        if position.location.is_some() || !position.on_ground {
            return;
        }
        if let Some((lat, lon)) = position.fix() {
            position.location = nearest_airport(lat, lon, self.rules.airport_radius_km)
                .map(|airport| airport.name.to_string());
        }
    }

    /// Live feed with novelty flags. Replayed events are never new.
    pub fn feed(&self, now: DateTime<Utc>) -> Option<Vec<FeedItem>> {
        let frame = self.frame(now)?;
        let items = match frame.step {
            Some(step) => correlate(&step.events, &self.rules)
                .live_feed
                .into_iter()
                .map(|event| FeedItem {
                    key: event.key(),
                    event,
                    is_new: false,
                })
                .collect(),
            None => self
                .correlation
                .live_feed
                .iter()
                .map(|event| {
                    let key = event.key();
                    FeedItem {
                        is_new: self.novelty.is_highlighted(&key, now),
                        key,
                        event: event.clone(),
                    }
                })
                .collect(),
        };
        Some(items)
    }

    /// Flights correlated from the events currently on display.
    pub fn flights(&self, now: DateTime<Utc>) -> Option<Vec<FlightEntry>> {
        let frame = self.frame(now)?;
        Some(match frame.step {
            Some(step) => correlate(&step.events, &self.rules).flights,
            None => self.correlation.flights.clone(),
        })
    }

    pub fn highlighted(&self, now: DateTime<Utc>) -> Vec<EventKey> {
        self.novelty.highlighted(now)
    }

    pub fn flights_view(&self, now: DateTime<Utc>) -> FlightsView {
        FlightsView {
            correlated: Panel::from_items(self.flights(now)),
            board: Panel::from_items(self.board.clone()),
        }
    }

    pub fn view(&self, now: DateTime<Utc>, filter: &FleetFilter) -> DashboardView {
        DashboardView {
            mode: self.mode(),
            banner: self.banner.clone(),
            data_age_seconds: self.data_age_seconds(now),
            kpis: self.kpis(now).map_or(Panel::Loading, Panel::Ready),
            fleet: Panel::from_items(self.fleet_rows(now, filter)),
            feed: Panel::from_items(self.feed(now)),
            flights: Panel::from_items(self.flights(now)),
            board: Panel::from_items(self.board.clone()),
            replay: self.replay.status(),
            selected: self.selected.clone(),
            trail: self.trail(),
        }
    }
}

impl Default for DashboardSession {
    fn default() -> Self {
        Self::new(EngineRules::default())
    }
}
