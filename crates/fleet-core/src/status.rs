//! Availability classification for individual aircraft.
//!
//! The feed's `on_ground` flag can lag reality (telemetry often drops during
//! roll-out), so a confirmed LANDING newer than the last position overrides an
//! airborne report. An airborne aircraft that stops reporting is presumed out
//! of contact and reported as `stale`, never as an error.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::models::{EventKind, FleetEvent, Position};
use crate::rules::EngineRules;

/// Operational availability of an aircraft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AvailabilityStatus {
    /// On the ground and past its turnaround
    Available,
    /// Airborne with fresh data
    InFlight,
    /// Landed less than one turnaround ago
    Turning,
    /// Airborne but silent for longer than the staleness threshold
    Stale,
    /// No position or no timestamp
    Unknown,
}

/// Result of classifying one aircraft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReport {
    pub status: AvailabilityStatus,
    /// Set only while turning
    pub ready_at: Option<DateTime<Utc>>,
}

impl StatusReport {
    fn plain(status: AvailabilityStatus) -> Self {
        Self { status, ready_at: None }
    }
}

/// Classify a single aircraft from its latest position and last landing.
pub fn classify(
    position: Option<&Position>,
    last_landing: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    rules: &EngineRules,
) -> StatusReport {
    let Some(position) = position else {
        return StatusReport::plain(AvailabilityStatus::Unknown);
    };
    let Some(position_ts) = position.ts else {
        return StatusReport::plain(AvailabilityStatus::Unknown);
    };

    if !position.on_ground {
        if let Some(landing) = last_landing.filter(|landing| *landing > position_ts) {
            return after_landing(landing, now, rules);
        }
        if now - position_ts > rules.staleness() {
            return StatusReport::plain(AvailabilityStatus::Stale);
        }
        return StatusReport::plain(AvailabilityStatus::InFlight);
    }

    match last_landing {
        Some(landing) => after_landing(landing, now, rules),
        None => StatusReport::plain(AvailabilityStatus::Available),
    }
}

fn after_landing(landing: DateTime<Utc>, now: DateTime<Utc>, rules: &EngineRules) -> StatusReport {
    let turnaround = rules.turnaround();
    if now - landing < turnaround {
        StatusReport {
            status: AvailabilityStatus::Turning,
            ready_at: Some(landing + turnaround),
        }
    } else {
        StatusReport::plain(AvailabilityStatus::Available)
    }
}

/// Most recent LANDING timestamp per aircraft key (ICAO24, or tail number
/// when the transponder code is missing).
pub fn last_landings(events: &[FleetEvent]) -> HashMap<String, DateTime<Utc>> {
    let mut landings: HashMap<String, DateTime<Utc>> = HashMap::new();
    for event in events.iter().filter(|e| e.kind == EventKind::Landing) {
        landings
            .entry(event.aircraft_key().to_string())
            .and_modify(|ts| {
                if event.ts > *ts {
                    *ts = event.ts;
                }
            })
            .or_insert(event.ts);
    }
    landings
}

/// One classified fleet row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FleetRow {
    #[serde(flatten)]
    pub position: Position,
    pub status: AvailabilityStatus,
    pub ready_at: Option<DateTime<Utc>>,
}

/// Classify every position against the landings found in `events`.
pub fn classify_fleet(
    positions: &[Position],
    events: &[FleetEvent],
    now: DateTime<Utc>,
    rules: &EngineRules,
) -> Vec<FleetRow> {
    let landings = last_landings(events);
    positions
        .iter()
        .map(|position| {
            let key = if position.icao24.is_empty() {
                &position.tail_number
            } else {
                &position.icao24
            };
            let report = classify(Some(position), landings.get(key).copied(), now, rules);
            FleetRow {
                position: position.clone(),
                status: report.status,
                ready_at: report.ready_at,
            }
        })
        .collect()
}
