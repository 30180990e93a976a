//! Error types for engine inputs that can be rejected.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FleetError {
    #[error("replay range end must be after start")]
    InvalidRange,
    #[error("replay range of {hours}h exceeds the {max_hours}h limit")]
    RangeTooLong { hours: i64, max_hours: i64 },
    #[error("unsupported playback speed {0}x (expected 1, 2 or 4)")]
    UnsupportedSpeed(u32),
    #[error("no replay is loaded")]
    NotReplaying,
}
