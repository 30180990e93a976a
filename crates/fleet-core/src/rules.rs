//! Time thresholds that drive classification and highlighting.

use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Configuration for the fleet engine rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineRules {
    /// Minimum time after landing before an aircraft is presumed ready again
    pub turnaround_minutes: i64,
    /// Maximum data age before an airborne aircraft is presumed out of contact
    pub stale_after_minutes: i64,
    /// How long a newly observed event stays highlighted
    pub highlight_seconds: i64,
    /// Search radius when resolving coordinates to an airport
    pub airport_radius_km: f64,
}

impl Default for EngineRules {
    fn default() -> Self {
        Self {
            turnaround_minutes: 90,
            stale_after_minutes: 20,
            highlight_seconds: 10,
            airport_radius_km: 50.0,
        }
    }
}

impl EngineRules {
    pub fn turnaround(&self) -> Duration {
        Duration::minutes(self.turnaround_minutes)
    }

    pub fn staleness(&self) -> Duration {
        Duration::minutes(self.stale_after_minutes)
    }

    pub fn highlight_window(&self) -> Duration {
        Duration::seconds(self.highlight_seconds)
    }
}
