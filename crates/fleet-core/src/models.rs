//! Core data models for the fleet dashboard engine.
//!
//! Field names follow the wire format of the telemetry backend so that
//! snapshots, replay steps and flight board entries deserialize directly.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Marker used when airport metadata is missing.
pub const UNKNOWN_AIRPORT: &str = "UNKNOWN";

/// Identity of one tracked aircraft.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AircraftRef {
    pub tail_number: String,
    /// 24-bit transponder address; unique per aircraft.
    pub icao24: String,
}

impl AircraftRef {
    pub fn new(tail_number: impl Into<String>, icao24: impl Into<String>) -> Self {
        Self {
            tail_number: tail_number.into(),
            icao24: icao24.into(),
        }
    }
}

/// Latest known position of an aircraft, as delivered by the telemetry feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub tail_number: String,
    pub icao24: String,
    /// Absent when the feed has never timestamped this aircraft
    #[serde(default)]
    pub ts: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub lat: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub lon: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub altitude: Option<f64>,
    /// Ground speed
    #[serde(default, deserialize_with = "lenient_f64")]
    pub velocity: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub heading: Option<f64>,
    #[serde(default)]
    pub on_ground: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub source: String,
    /// Resolved location label (nearest airport), if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl Position {
    pub fn aircraft(&self) -> AircraftRef {
        AircraftRef::new(self.tail_number.clone(), self.icao24.clone())
    }

    /// Coordinates as `(lat, lon)` when the position has a fix.
    pub fn fix(&self) -> Option<(f64, f64)> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => None,
        }
    }

    /// Age of the position relative to `now`.
    pub fn age(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.ts.map(|ts| now - ts)
    }
}

/// Kind of a discrete fleet event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    #[serde(alias = "takeoff")]
    Takeoff,
    #[serde(alias = "landing")]
    Landing,
    /// Aircraft seen again after a long gap without signal
    #[serde(alias = "appeared")]
    Appeared,
    /// Emergency squawk observed
    #[serde(alias = "emergency")]
    Emergency,
    /// Flight already airborne when monitoring started
    #[serde(alias = "in_progress")]
    InProgress,
    /// Any kind this engine does not interpret
    #[serde(other)]
    Other,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Takeoff => "TAKEOFF",
            EventKind::Landing => "LANDING",
            EventKind::Appeared => "APPEARED",
            EventKind::Emergency => "EMERGENCY",
            EventKind::InProgress => "IN_PROGRESS",
            EventKind::Other => "OTHER",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event metadata.
///
/// The key set is closed: each kind reads only its own keys and every key
/// defaults to absent. Unknown keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventMeta {
    // TAKEOFF / IN_PROGRESS
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_string")]
    pub origin_airport: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_string")]
    pub origin_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_f64")]
    pub altitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_f64")]
    pub velocity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_f64")]
    pub lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_f64")]
    pub lon: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_string")]
    pub source: Option<String>,

    // LANDING
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_string")]
    pub destination_airport: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_string")]
    pub destination_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_f64")]
    pub cruise_altitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_u32")]
    pub track_points: Option<u32>,

    // APPEARED
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_f64")]
    pub gap_seconds: Option<f64>,

    // EMERGENCY
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_string")]
    pub squawk: Option<String>,
}

impl EventMeta {
    /// Coordinates recorded with the event, if both are present.
    pub fn fix(&self) -> Option<(f64, f64)> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => None,
        }
    }
}

/// A discrete lifecycle event. Immutable once emitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FleetEvent {
    pub ts: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub tail_number: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub icao24: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub meta: EventMeta,
}

impl FleetEvent {
    pub fn key(&self) -> EventKey {
        EventKey::of(self)
    }

    pub fn aircraft(&self) -> AircraftRef {
        AircraftRef::new(self.tail_number.clone(), self.icao24.clone())
    }

    /// Identity used to group events per aircraft; falls back to the tail
    /// number when the transponder code is missing.
    pub fn aircraft_key(&self) -> &str {
        if self.icao24.is_empty() {
            &self.tail_number
        } else {
            &self.icao24
        }
    }
}

/// Deduplication identity of an event: `(timestamp, tail number, kind)`.
///
/// Rendered as `"{ts}|{tail}|{KIND}"` for the rendering layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventKey {
    pub ts: DateTime<Utc>,
    pub tail_number: String,
    pub kind: EventKind,
}

impl EventKey {
    pub fn of(event: &FleetEvent) -> Self {
        Self {
            ts: event.ts,
            tail_number: event.tail_number.clone(),
            kind: event.kind,
        }
    }
}

impl fmt::Display for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}|{}", self.ts.to_rfc3339(), self.tail_number, self.kind)
    }
}

impl Serialize for EventKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Fleet-wide counters delivered with every snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FleetKpis {
    #[serde(default)]
    pub in_air: u32,
    #[serde(default)]
    pub on_ground: u32,
    #[serde(default)]
    pub seen_last_15m: u32,
    #[serde(default)]
    pub events_last_hour: u32,
}

/// Periodic live snapshot from the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default, rename = "fleet_kpis")]
    pub kpis: FleetKpis,
    #[serde(default, rename = "latest_positions")]
    pub positions: Vec<Position>,
    /// Recent events, newest first
    #[serde(default, rename = "last_50_events")]
    pub events: Vec<FleetEvent>,
    #[serde(default)]
    pub data_freshness_seconds: i64,
}

/// One immutable, timestamped state in a replay sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayStep {
    pub ts: DateTime<Utc>,
    #[serde(default, rename = "fleet_kpis")]
    pub kpis: FleetKpis,
    #[serde(default, rename = "latest_positions")]
    pub positions: Vec<Position>,
    #[serde(default, rename = "last_50_events")]
    pub events: Vec<FleetEvent>,
}

impl ReplayStep {
    /// Position of the given aircraft in this step, if present.
    pub fn position_of(&self, icao24: &str) -> Option<&Position> {
        self.positions.iter().find(|p| p.icao24 == icao24)
    }
}

/// Raw recorded track point of a single aircraft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackPoint {
    pub ts: DateTime<Utc>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub lat: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub lon: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub altitude: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub velocity: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub heading: Option<f64>,
    #[serde(default)]
    pub on_ground: bool,
}

/// A flight reconstructed from one TAKEOFF and at most one later LANDING.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightEntry {
    pub tail_number: String,
    pub icao24: String,
    pub origin_code: String,
    pub origin_name: String,
    /// Absent while the flight is in progress
    #[serde(default)]
    pub destination_code: Option<String>,
    #[serde(default)]
    pub destination_name: Option<String>,
    /// Absent for a landing with no matching takeoff
    #[serde(default)]
    pub takeoff_ts: Option<DateTime<Utc>>,
    #[serde(default)]
    pub landing_ts: Option<DateTime<Utc>>,
    #[serde(default)]
    pub duration_seconds: Option<i64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub cruise_altitude: Option<f64>,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub track_points: Option<u32>,
}

/// Lifecycle phase of a [`FlightEntry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlightPhase {
    /// Takeoff seen, no landing yet
    InProgress,
    /// Takeoff and landing matched
    Completed,
    /// Landing seen without a preceding takeoff
    OrphanLanding,
}

impl FlightEntry {
    pub fn phase(&self) -> FlightPhase {
        match (self.takeoff_ts, self.landing_ts) {
            (Some(_), Some(_)) => FlightPhase::Completed,
            (None, _) => FlightPhase::OrphanLanding,
            (Some(_), None) => FlightPhase::InProgress,
        }
    }

    /// Replay needs recorded track points and a known takeoff time.
    pub fn replay_available(&self) -> bool {
        self.takeoff_ts.is_some() && self.track_points.unwrap_or(0) > 0
    }

    /// Timestamp used to order the flight board (newest first).
    pub fn sort_ts(&self) -> Option<DateTime<Utc>> {
        self.takeoff_ts.or(self.landing_ts)
    }
}

// ========== LENIENT DESERIALIZERS ==========
// The backend occasionally stores "N/A" or numeric strings in optional fields.

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|value| match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }))
}

fn lenient_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_f64(deserializer)?
        .filter(|n| n.is_finite() && *n >= 0.0)
        .map(|n| n.min(u32::MAX as f64) as u32))
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|value| match value {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }))
}
