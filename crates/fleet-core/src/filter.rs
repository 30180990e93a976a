//! Search and ground/air filtering for the fleet table.

use serde::{Deserialize, Serialize};

use crate::models::Position;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroundFilter {
    #[default]
    All,
    InAir,
    OnGround,
}

/// Fleet table filter: free-text search plus an air/ground selector.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FleetFilter {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub status: GroundFilter,
}

impl FleetFilter {
    /// Case-insensitive match on tail number or ICAO24, plus the air/ground selector.
    pub fn matches(&self, position: &Position) -> bool {
        let matches_search = match self.search.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(query) => {
                let query = query.to_lowercase();
                position.tail_number.to_lowercase().contains(&query)
                    || position.icao24.to_lowercase().contains(&query)
            }
        };
        let matches_status = match self.status {
            GroundFilter::All => true,
            GroundFilter::InAir => !position.on_ground,
            GroundFilter::OnGround => position.on_ground,
        };
        matches_search && matches_status
    }

    pub fn is_active(&self) -> bool {
        self.status != GroundFilter::All
            || self.search.as_deref().is_some_and(|q| !q.trim().is_empty())
    }
}
