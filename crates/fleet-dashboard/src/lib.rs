//! Fleet dashboard session service: the live/replay engine behind a REST API.

pub mod api;
pub mod config;
pub mod loops;
pub mod state;
