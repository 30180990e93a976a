//! Live/replay mode switch and the playback clock state machine.
//!
//! ```text
//! Live ──request──▶ Loading ──steps──▶ Replaying{paused} ⇄ Replaying{playing}
//!   ▲                  │                    │
//!   │               empty/failure           │ exit
//!   │                  ▼                    │
//!   └──dismiss──── Error ◀──────────────────┘ (to Live)
//! ```
//!
//! Every request and every exit bumps a generation counter. A fetch result
//! carries the ticket it was started with and is discarded when the counter
//! has moved on, so a late response can never re-enter replay.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::FleetError;
use crate::models::{AircraftRef, FleetKpis, Position, ReplayStep, TrackPoint};

/// Longest range the backend will replay.
pub const MAX_RANGE_HOURS: i64 = 24;
/// Range replayed when the operator does not pick one.
pub const DEFAULT_WINDOW_HOURS: i64 = 2;
pub const DEFAULT_STEP_SECONDS: u32 = 60;
pub const MIN_STEP_SECONDS: u32 = 30;
pub const MAX_STEP_SECONDS: u32 = 3600;

/// Playback speed multiplier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u32", try_from = "u32")]
pub enum PlaybackSpeed {
    #[default]
    X1,
    X2,
    X4,
}

impl PlaybackSpeed {
    /// Wall-clock period between two replay steps.
    pub fn tick_interval(self) -> std::time::Duration {
        match self {
            PlaybackSpeed::X1 => std::time::Duration::from_millis(1000),
            PlaybackSpeed::X2 => std::time::Duration::from_millis(500),
            PlaybackSpeed::X4 => std::time::Duration::from_millis(250),
        }
    }

    pub fn multiplier(self) -> u32 {
        match self {
            PlaybackSpeed::X1 => 1,
            PlaybackSpeed::X2 => 2,
            PlaybackSpeed::X4 => 4,
        }
    }

    /// Next speed in the 1x -> 2x -> 4x -> 1x cycle.
    pub fn next(self) -> Self {
        match self {
            PlaybackSpeed::X1 => PlaybackSpeed::X2,
            PlaybackSpeed::X2 => PlaybackSpeed::X4,
            PlaybackSpeed::X4 => PlaybackSpeed::X1,
        }
    }
}

impl From<PlaybackSpeed> for u32 {
    fn from(speed: PlaybackSpeed) -> Self {
        speed.multiplier()
    }
}

impl TryFrom<u32> for PlaybackSpeed {
    type Error = FleetError;

    fn try_from(multiplier: u32) -> Result<Self, Self::Error> {
        match multiplier {
            1 => Ok(PlaybackSpeed::X1),
            2 => Ok(PlaybackSpeed::X2),
            4 => Ok(PlaybackSpeed::X4),
            other => Err(FleetError::UnsupportedSpeed(other)),
        }
    }
}

/// Validated time-range replay request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayRangeRequest {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub step_seconds: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aircraft_icao24: Option<String>,
}

impl ReplayRangeRequest {
    /// Validate a range: `start < end`, at most 24 hours, step clamped to 30..=3600s.
    pub fn new(
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        step_seconds: Option<u32>,
        aircraft_icao24: Option<String>,
    ) -> Result<Self, FleetError> {
        if end <= start {
            return Err(FleetError::InvalidRange);
        }
        if end - start > Duration::hours(MAX_RANGE_HOURS) {
            return Err(FleetError::RangeTooLong {
                hours: (end - start).num_hours(),
                max_hours: MAX_RANGE_HOURS,
            });
        }
        let step_seconds = step_seconds
            .unwrap_or(DEFAULT_STEP_SECONDS)
            .clamp(MIN_STEP_SECONDS, MAX_STEP_SECONDS);
        let aircraft_icao24 = aircraft_icao24.filter(|id| !id.trim().is_empty());
        Ok(Self { start, end, step_seconds, aircraft_icao24 })
    }

    /// The default operator window: the last two hours at one-minute steps.
    pub fn recent(now: DateTime<Utc>) -> Self {
        Self {
            start: now - Duration::hours(DEFAULT_WINDOW_HOURS),
            end: now,
            step_seconds: DEFAULT_STEP_SECONDS,
            aircraft_icao24: None,
        }
    }
}

/// Replay of one aircraft's recorded track for a single flight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackRequest {
    pub aircraft: AircraftRef,
    pub takeoff_ts: DateTime<Utc>,
    #[serde(default)]
    pub landing_ts: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReplayRequest {
    Range(ReplayRangeRequest),
    Track(TrackRequest),
}

/// Why a replay request did not produce steps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "message", rename_all = "snake_case")]
pub enum ReplayFailure {
    /// The range or track held zero steps
    NoData,
    /// Network or HTTP failure
    Fetch(String),
}

/// Replay controller state.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ReplayState {
    #[default]
    Live,
    Loading { generation: u64, request: ReplayRequest },
    Replaying { playing: bool },
    /// Last request failed; the display mode is still live
    Error { failure: ReplayFailure },
}

/// Handle given to a fetch so its result can be matched to the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplayTicket {
    generation: u64,
}

impl ReplayTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveOutcome {
    /// The ticket was superseded by a newer request or an exit
    Discarded,
    Loaded { steps: usize },
    Failed(ReplayFailure),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Not playing
    Idle,
    Advanced { index: usize },
    /// Reached the final step; playback paused
    Finished { index: usize },
}

/// Read-only summary for the rendering layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplayStatus {
    #[serde(flatten)]
    pub state: ReplayState,
    pub index: usize,
    pub step_count: usize,
    pub speed: PlaybackSpeed,
    pub step_ts: Option<DateTime<Utc>>,
    pub first_ts: Option<DateTime<Utc>>,
    pub last_ts: Option<DateTime<Utc>>,
}

/// Owner of the replay step sequence and the scrub position.
#[derive(Debug, Clone, Default)]
pub struct ReplayController {
    state: ReplayState,
    steps: Vec<ReplayStep>,
    index: usize,
    speed: PlaybackSpeed,
    generation: u64,
}

impl ReplayController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ReplayState {
        &self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_replaying(&self) -> bool {
        matches!(self.state, ReplayState::Replaying { .. })
    }

    pub fn is_playing(&self) -> bool {
        matches!(self.state, ReplayState::Replaying { playing: true })
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, ReplayState::Loading { .. })
    }

    /// The live polling loop must not run while replay owns the display.
    pub fn suspends_live_polling(&self) -> bool {
        self.is_replaying()
    }

    pub fn speed(&self) -> PlaybackSpeed {
        self.speed
    }

    pub fn set_speed(&mut self, speed: PlaybackSpeed) {
        self.speed = speed;
    }

    pub fn steps(&self) -> &[ReplayStep] {
        &self.steps
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Inclusive scrub bounds `(0, last)` while steps are loaded.
    pub fn bounds(&self) -> Option<(usize, usize)> {
        self.steps.len().checked_sub(1).map(|last| (0, last))
    }

    /// Exactly `steps[index]` while replaying.
    pub fn current_step(&self) -> Option<&ReplayStep> {
        if self.is_replaying() {
            self.steps.get(self.index)
        } else {
            None
        }
    }

    /// Start a new request, superseding anything in flight or on display.
    pub fn request(&mut self, request: ReplayRequest) -> ReplayTicket {
        self.generation += 1;
        self.steps.clear();
        self.index = 0;
        self.state = ReplayState::Loading {
            generation: self.generation,
            request,
        };
        ReplayTicket {
            generation: self.generation,
        }
    }

    /// Apply a fetch result.
    pub fn resolve(
        &mut self,
        ticket: ReplayTicket,
        result: Result<Vec<ReplayStep>, String>,
    ) -> ResolveOutcome {
        let current = matches!(
            self.state,
            ReplayState::Loading { generation, .. } if generation == ticket.generation
        );
        if !current || ticket.generation != self.generation {
            return ResolveOutcome::Discarded;
        }

        let failure = match result {
            Ok(steps) if !steps.is_empty() => {
                let mut steps = steps;
                steps.sort_by_key(|step| step.ts);
                let count = steps.len();
                self.steps = steps;
                self.index = 0;
                self.state = ReplayState::Replaying { playing: false };
                return ResolveOutcome::Loaded { steps: count };
            }
            Ok(_) => ReplayFailure::NoData,
            Err(message) => ReplayFailure::Fetch(message),
        };

        self.state = ReplayState::Error {
            failure: failure.clone(),
        };
        ResolveOutcome::Failed(failure)
    }

    /// Flip play/pause. Returns whether playback is now running.
    pub fn toggle_play(&mut self) -> Result<bool, FleetError> {
        if self.is_playing() {
            self.pause()?;
            Ok(false)
        } else {
            self.play()
        }
    }

    /// Start playback. At the final step there is nothing left to play, so the
    /// controller stays paused.
    pub fn play(&mut self) -> Result<bool, FleetError> {
        if !self.is_replaying() {
            return Err(FleetError::NotReplaying);
        }
        let at_end = self.index + 1 >= self.steps.len();
        self.state = ReplayState::Replaying { playing: !at_end };
        Ok(!at_end)
    }

    pub fn pause(&mut self) -> Result<(), FleetError> {
        if !self.is_replaying() {
            return Err(FleetError::NotReplaying);
        }
        self.state = ReplayState::Replaying { playing: false };
        Ok(())
    }

    /// One clock tick: advance exactly one step while playing.
    pub fn tick(&mut self) -> TickOutcome {
        if !self.is_playing() {
            return TickOutcome::Idle;
        }
        let last = self.steps.len().saturating_sub(1);
        if self.index < last {
            self.index += 1;
        }
        if self.index >= last {
            self.state = ReplayState::Replaying { playing: false };
            TickOutcome::Finished { index: self.index }
        } else {
            TickOutcome::Advanced { index: self.index }
        }
    }

    /// Jump to an index. Pauses first so the clock cannot race the jump;
    /// out-of-range indices are clamped. Returns the effective index.
    pub fn scrub(&mut self, index: usize) -> Result<usize, FleetError> {
        self.pause()?;
        let (_, last) = self.bounds().ok_or(FleetError::NotReplaying)?;
        self.index = index.min(last);
        Ok(self.index)
    }

    pub fn step_forward(&mut self) -> Result<usize, FleetError> {
        self.scrub(self.index.saturating_add(1))
    }

    pub fn step_back(&mut self) -> Result<usize, FleetError> {
        self.scrub(self.index.saturating_sub(1))
    }

    /// Return to live. Cancels any in-flight request.
    pub fn exit_to_live(&mut self) {
        self.generation += 1;
        self.steps.clear();
        self.index = 0;
        self.state = ReplayState::Live;
    }

    /// Acknowledge a failed request.
    pub fn dismiss_error(&mut self) {
        if matches!(self.state, ReplayState::Error { .. }) {
            self.state = ReplayState::Live;
        }
    }

    pub fn status(&self) -> ReplayStatus {
        ReplayStatus {
            state: self.state.clone(),
            index: self.index,
            step_count: self.steps.len(),
            speed: self.speed,
            step_ts: self.current_step().map(|step| step.ts),
            first_ts: self.steps.first().map(|step| step.ts),
            last_ts: self.steps.last().map(|step| step.ts),
        }
    }
}

/// Wrap raw track points into single-aircraft replay steps.
pub fn steps_from_track(aircraft: &AircraftRef, points: &[TrackPoint]) -> Vec<ReplayStep> {
    let mut steps: Vec<ReplayStep> = points
        .iter()
        .map(|point| {
            let airborne = u32::from(!point.on_ground);
            ReplayStep {
                ts: point.ts,
                kpis: FleetKpis {
                    in_air: airborne,
                    on_ground: 1 - airborne,
                    seen_last_15m: 1,
                    events_last_hour: 0,
                },
                positions: vec![Position {
                    tail_number: aircraft.tail_number.clone(),
                    icao24: aircraft.icao24.clone(),
                    ts: Some(point.ts),
                    lat: point.lat,
                    lon: point.lon,
                    altitude: point.altitude,
                    velocity: point.velocity,
                    heading: point.heading,
                    on_ground: point.on_ground,
                    source: "track".to_string(),
                    location: None,
                }],
                events: Vec::new(),
            }
        })
        .collect();
    steps.sort_by_key(|step| step.ts);
    steps
}
