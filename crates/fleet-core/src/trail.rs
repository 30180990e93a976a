//! Path flown by a selected aircraft up to the current replay index.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::ReplayStep;

/// One trail vertex.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrailPoint {
    pub step: usize,
    pub ts: DateTime<Utc>,
    pub lat: f64,
    pub lon: f64,
}

/// Owned trail, rebuilt whenever the index, selection or steps change.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Trail {
    pub icao24: String,
    pub points: Vec<TrailPoint>,
}

impl Trail {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// `[lat, lon]` pairs in step order.
    pub fn coordinates(&self) -> impl Iterator<Item = [f64; 2]> + '_ {
        self.points.iter().map(|p| [p.lat, p.lon])
    }
}

/// Positions of `icao24` in steps `0..=index`, skipping steps without a fix.
pub fn build_trail(steps: &[ReplayStep], icao24: &str, index: usize) -> Trail {
    let points = steps
        .iter()
        .enumerate()
        .take(index.saturating_add(1))
        .filter_map(|(step, replay_step)| {
            let position = replay_step.position_of(icao24)?;
            let (lat, lon) = position.fix()?;
            Some(TrailPoint {
                step,
                ts: replay_step.ts,
                lat,
                lon,
            })
        })
        .collect();

    Trail {
        icao24: icao24.to_string(),
        points,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FleetKpis, Position};
    use chrono::{Duration, TimeZone};

    fn position(icao24: &str, fix: Option<(f64, f64)>) -> Position {
        Position {
            tail_number: format!("LV-{icao24}"),
            icao24: icao24.into(),
            ts: None,
            lat: fix.map(|f| f.0),
            lon: fix.map(|f| f.1),
            altitude: None,
            velocity: None,
            heading: None,
            on_ground: false,
            source: String::new(),
            location: None,
        }
    }

    fn steps() -> Vec<ReplayStep> {
        let base = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        let fixes = [
            Some((-34.50, -58.40)),
            None,
            Some((-34.60, -58.30)),
            Some((-34.70, -58.20)),
        ];
        fixes
            .iter()
            .enumerate()
            .map(|(i, fix)| ReplayStep {
                ts: base + Duration::minutes(i as i64),
                kpis: FleetKpis::default(),
                positions: vec![position("aaa", *fix), position("bbb", Some((1.0, 1.0)))],
                events: Vec::new(),
            })
            .collect()
    }

    #[test]
    fn trail_includes_steps_up_to_index_with_a_fix() {
        let steps = steps();
        let trail = build_trail(&steps, "aaa", 2);

        assert_eq!(trail.len(), 2);
        assert!(trail.len() <= 3);
        let order: Vec<usize> = trail.points.iter().map(|p| p.step).collect();
        assert_eq!(order, vec![0, 2]);
        assert_eq!(trail.coordinates().collect::<Vec<_>>(), vec![[-34.50, -58.40], [-34.60, -58.30]]);
        // Restartable
        assert_eq!(trail.coordinates().count(), 2);
    }

    #[test]
    fn index_zero_and_past_end() {
        let steps = steps();
        assert_eq!(build_trail(&steps, "aaa", 0).len(), 1);
        assert_eq!(build_trail(&steps, "aaa", usize::MAX).len(), 3);
    }

    #[test]
    fn unknown_aircraft_or_no_steps_yield_empty_trail() {
        assert!(build_trail(&steps(), "zzz", 3).is_empty());
        assert!(build_trail(&[], "aaa", 3).is_empty());
    }
}
