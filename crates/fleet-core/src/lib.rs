pub mod airports;
pub mod error;
pub mod filter;
pub mod flights;
pub mod models;
pub mod novelty;
pub mod replay;
pub mod rules;
pub mod spatial;
pub mod status;
pub mod trail;

pub use error::FleetError;
pub use filter::{FleetFilter, GroundFilter};
pub use flights::{correlate, Correlation};
pub use models::{
    AircraftRef, EventKey, EventKind, EventMeta, FleetEvent, FleetKpis, FlightEntry, FlightPhase,
    Position, ReplayStep, Snapshot, TrackPoint, UNKNOWN_AIRPORT,
};
pub use novelty::{EventNoveltyTracker, NoveltyBatch};
pub use replay::{
    steps_from_track, PlaybackSpeed, ReplayController, ReplayFailure, ReplayRangeRequest,
    ReplayRequest, ReplayState, ReplayStatus, ReplayTicket, ResolveOutcome, TickOutcome,
    TrackRequest,
};
pub use rules::EngineRules;
pub use spatial::haversine_distance;
pub use status::{classify, classify_fleet, last_landings, AvailabilityStatus, FleetRow, StatusReport};
pub use trail::{build_trail, Trail, TrailPoint};
