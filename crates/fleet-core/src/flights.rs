//! Correlation of raw TAKEOFF/LANDING events into flight records.
//!
//! A LANDING closes the nearest preceding TAKEOFF of the same aircraft with a
//! strictly earlier timestamp. Older TAKEOFFs still pending for that aircraft
//! are left unmatched: they stay in the live feed and in history as
//! in-progress flights.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::airports::{by_code, nearest_airport};
use crate::models::{EventKind, FleetEvent, FlightEntry, UNKNOWN_AIRPORT};
use crate::rules::EngineRules;

/// Output of [`correlate`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Correlation {
    /// Events still representing in-progress activity, in input order
    pub live_feed: Vec<FleetEvent>,
    /// Flight records, newest first
    pub flights: Vec<FlightEntry>,
}

/// Correlate an observation window of events.
///
/// The input may be in any order (snapshots deliver newest first); matching
/// walks the events oldest first, keeping input order for equal timestamps.
pub fn correlate(events: &[FleetEvent], rules: &EngineRules) -> Correlation {
    let mut order: Vec<usize> = (0..events.len()).collect();
    order.sort_by_key(|&idx| events[idx].ts);

    let mut pending: HashMap<&str, Vec<usize>> = HashMap::new();
    let mut matched_takeoffs: HashSet<usize> = HashSet::new();
    let mut flights = Vec::new();

    for idx in order {
        let event = &events[idx];
        match event.kind {
            EventKind::Takeoff => {
                pending.entry(event.aircraft_key()).or_default().push(idx);
            }
            EventKind::Landing => {
                let takeoff = pending
                    .get_mut(event.aircraft_key())
                    .and_then(|stack| take_nearest_takeoff(stack, events, event));
                match takeoff {
                    Some(takeoff_idx) => {
                        matched_takeoffs.insert(takeoff_idx);
                        flights.push(completed_flight(&events[takeoff_idx], event, rules));
                    }
                    None => flights.push(orphan_landing(event)),
                }
            }
            _ => {}
        }
    }

    for (idx, event) in events.iter().enumerate() {
        if event.kind == EventKind::Takeoff && !matched_takeoffs.contains(&idx) {
            flights.push(in_progress_flight(event, rules));
        }
    }
    flights.sort_by(|a, b| b.sort_ts().cmp(&a.sort_ts()));

    let live_feed = events
        .iter()
        .enumerate()
        .filter(|(idx, event)| match event.kind {
            EventKind::Landing => false,
            EventKind::Takeoff => !matched_takeoffs.contains(idx),
            _ => true,
        })
        .map(|(_, event)| event.clone())
        .collect();

    Correlation { live_feed, flights }
}

/// Pop the nearest TAKEOFF strictly before `landing`.
///
/// Pending takeoffs older than the match are dropped from the stack so a later
/// landing cannot close a flight that spans this one. Takeoffs at or after the
/// landing timestamp stay pending.
fn take_nearest_takeoff(stack: &mut Vec<usize>, events: &[FleetEvent], landing: &FleetEvent) -> Option<usize> {
    let position = stack.iter().rposition(|&idx| events[idx].ts < landing.ts)?;
    let later = stack.split_off(position + 1);
    let matched = stack.pop();
    *stack = later;
    matched
}

fn origin(takeoff: &FleetEvent, rules: &EngineRules) -> (String, String) {
    let meta = &takeoff.meta;
    let resolved = match meta.origin_airport.as_deref() {
        Some(code) => by_code(code),
        None => meta
            .fix()
            .and_then(|(lat, lon)| nearest_airport(lat, lon, rules.airport_radius_km)),
    };
    let code = meta
        .origin_airport
        .clone()
        .or_else(|| resolved.map(|a| a.code.to_string()))
        .unwrap_or_else(|| UNKNOWN_AIRPORT.to_string());
    let name = meta
        .origin_name
        .clone()
        .or_else(|| resolved.map(|a| a.name.to_string()))
        .unwrap_or_else(|| UNKNOWN_AIRPORT.to_string());
    (code, name)
}

fn destination(landing: &FleetEvent) -> (String, String) {
    let meta = &landing.meta;
    let resolved = meta.destination_airport.as_deref().and_then(by_code);
    let code = meta
        .destination_airport
        .clone()
        .unwrap_or_else(|| UNKNOWN_AIRPORT.to_string());
    let name = meta
        .destination_name
        .clone()
        .or_else(|| resolved.map(|a| a.name.to_string()))
        .unwrap_or_else(|| UNKNOWN_AIRPORT.to_string());
    (code, name)
}

fn completed_flight(takeoff: &FleetEvent, landing: &FleetEvent, rules: &EngineRules) -> FlightEntry {
    let (origin_code, origin_name) = origin(takeoff, rules);
    let (destination_code, destination_name) = destination(landing);
    FlightEntry {
        tail_number: takeoff.tail_number.clone(),
        icao24: takeoff.icao24.clone(),
        origin_code,
        origin_name,
        destination_code: Some(destination_code),
        destination_name: Some(destination_name),
        takeoff_ts: Some(takeoff.ts),
        landing_ts: Some(landing.ts),
        duration_seconds: Some((landing.ts - takeoff.ts).num_seconds()),
        cruise_altitude: landing.meta.cruise_altitude,
        track_points: landing.meta.track_points,
    }
}

fn in_progress_flight(takeoff: &FleetEvent, rules: &EngineRules) -> FlightEntry {
    let (origin_code, origin_name) = origin(takeoff, rules);
    FlightEntry {
        tail_number: takeoff.tail_number.clone(),
        icao24: takeoff.icao24.clone(),
        origin_code,
        origin_name,
        destination_code: None,
        destination_name: None,
        takeoff_ts: Some(takeoff.ts),
        landing_ts: None,
        duration_seconds: None,
        cruise_altitude: None,
        track_points: None,
    }
}

fn orphan_landing(landing: &FleetEvent) -> FlightEntry {
    let (destination_code, destination_name) = destination(landing);
    FlightEntry {
        tail_number: landing.tail_number.clone(),
        icao24: landing.icao24.clone(),
        origin_code: UNKNOWN_AIRPORT.to_string(),
        origin_name: UNKNOWN_AIRPORT.to_string(),
        destination_code: Some(destination_code),
        destination_name: Some(destination_name),
        takeoff_ts: None,
        landing_ts: Some(landing.ts),
        duration_seconds: None,
        cruise_altitude: landing.meta.cruise_altitude,
        track_points: landing.meta.track_points,
    }
}
