//! Fleet CLI - operator tools for the fleet dashboard engine.
//!
//! The `fleetctl` binary prints the fleet status table, the correlated flight
//! list and a terminal replay. Line formatting lives here so it can be tested.

pub mod table;
