//! Plain-text rows for the terminal.

use chrono::{DateTime, Utc};

use fleet_core::{AvailabilityStatus, FleetRow, FlightEntry, FlightPhase, ReplayStep};

pub fn status_label(status: AvailabilityStatus) -> &'static str {
    match status {
        AvailabilityStatus::Available => "AVAILABLE",
        AvailabilityStatus::InFlight => "IN FLIGHT",
        AvailabilityStatus::Turning => "TURNING",
        AvailabilityStatus::Stale => "STALE",
        AvailabilityStatus::Unknown => "UNKNOWN",
    }
}

/// `1h 05m`, `12m`, or `-` when unknown.
pub fn format_duration(seconds: Option<i64>) -> String {
    match seconds {
        None => "-".to_string(),
        Some(s) if s < 3600 => format!("{}m", s.max(0) / 60),
        Some(s) => format!("{}h {:02}m", s / 3600, (s % 3600) / 60),
    }
}

fn format_ts(ts: Option<DateTime<Utc>>) -> String {
    ts.map(|ts| ts.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

pub fn status_header() -> String {
    format!(
        "{:<10} {:<8} {:<10} {:>8} {:>6}  {}",
        "TAIL", "ICAO24", "STATUS", "ALT", "AGE", "NOTE"
    )
}

pub fn status_line(row: &FleetRow, now: DateTime<Utc>) -> String {
    let position = &row.position;
    let altitude = position
        .altitude
        .map(|alt| format!("{alt:.0}"))
        .unwrap_or_else(|| "-".to_string());
    let age = position
        .age(now)
        .map(|age| format_duration(Some(age.num_seconds())))
        .unwrap_or_else(|| "-".to_string());
    let note = match (row.ready_at, position.location.as_deref()) {
        (Some(ready_at), _) => format!("ready {}", ready_at.format("%H:%M")),
        (None, Some(location)) => location.to_string(),
        (None, None) => String::new(),
    };
    format!(
        "{:<10} {:<8} {:<10} {:>8} {:>6}  {}",
        position.tail_number,
        position.icao24,
        status_label(row.status),
        altitude,
        age,
        note
    )
    .trim_end()
    .to_string()
}

pub fn flight_header() -> String {
    format!(
        "{:<10} {:<12} {:<16} {:<16} {:>8}  {}",
        "TAIL", "ROUTE", "TAKEOFF", "LANDING", "TIME", "REPLAY"
    )
}

pub fn flight_line(entry: &FlightEntry) -> String {
    let destination = match entry.phase() {
        FlightPhase::InProgress => "...",
        _ => entry.destination_code.as_deref().unwrap_or("?"),
    };
    let route = format!("{} > {}", entry.origin_code, destination);
    let replay = if entry.replay_available() { "yes" } else { "no" };
    format!(
        "{:<10} {:<12} {:<16} {:<16} {:>8}  {}",
        entry.tail_number,
        route,
        format_ts(entry.takeoff_ts),
        format_ts(entry.landing_ts),
        format_duration(entry.duration_seconds),
        replay
    )
}

/// One replay frame: progress, step time and fleet counters.
pub fn step_line(step: &ReplayStep, index: usize, total: usize) -> String {
    format!(
        "[{:>4}/{:<4}] {}  in air {:>3}  on ground {:>3}  events {:>3}",
        index + 1,
        total,
        step.ts.format("%Y-%m-%d %H:%M:%S"),
        step.kpis.in_air,
        step.kpis.on_ground,
        step.events.len()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use fleet_core::{FleetKpis, Position};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn durations() {
        assert_eq!(format_duration(None), "-");
        assert_eq!(format_duration(Some(754)), "12m");
        assert_eq!(format_duration(Some(3900)), "1h 05m");
    }

    #[test]
    fn status_line_shows_ready_time_while_turning() {
        let row = FleetRow {
            position: Position {
                tail_number: "LV-ABC".into(),
                icao24: "e0659a".into(),
                ts: Some(now() - Duration::minutes(2)),
                lat: None,
                lon: None,
                altitude: Some(0.0),
                velocity: None,
                heading: None,
                on_ground: true,
                source: "adsb".into(),
                location: Some("Aeroparque Jorge Newbery".into()),
            },
            status: AvailabilityStatus::Turning,
            ready_at: Some(now() + Duration::minutes(45)),
        };
        let line = status_line(&row, now());
        assert!(line.starts_with("LV-ABC"));
        assert!(line.contains("TURNING"));
        assert!(line.contains("2m"));
        assert!(line.ends_with("ready 12:45"));
    }

    #[test]
    fn in_progress_flight_has_open_destination() {
        let entry = FlightEntry {
            tail_number: "LV-ABC".into(),
            icao24: "e0659a".into(),
            origin_code: "AEP".into(),
            origin_name: "Aeroparque Jorge Newbery".into(),
            destination_code: None,
            destination_name: None,
            takeoff_ts: Some(now()),
            landing_ts: None,
            duration_seconds: None,
            cruise_altitude: None,
            track_points: None,
        };
        let line = flight_line(&entry);
        assert!(line.contains("AEP > ..."));
        assert!(line.ends_with("no"));
    }

    #[test]
    fn step_line_is_one_based() {
        let step = ReplayStep {
            ts: now(),
            kpis: FleetKpis { in_air: 3, on_ground: 2, seen_last_15m: 5, events_last_hour: 1 },
            positions: Vec::new(),
            events: Vec::new(),
        };
        let line = step_line(&step, 0, 10);
        assert!(line.starts_with("[   1/10  ]"));
        assert!(line.contains("in air   3"));
    }
}
