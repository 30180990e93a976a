//! Fleet SDK - backend integration library
//!
//! Fetches live snapshots, replay ranges, single-aircraft tracks and the
//! flight board from the telemetry backend.

pub mod client;
pub mod error;

pub use client::FleetClient;
pub use error::FetchError;
pub use fleet_core::models::{FlightEntry, ReplayStep, Snapshot, TrackPoint};
