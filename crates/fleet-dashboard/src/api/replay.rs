//! Replay endpoints: start, play/pause, speed, scrub and exit.

use axum::{extract::State, http::StatusCode, response::Response, Json};
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use std::sync::Arc;

use fleet_core::replay::DEFAULT_WINDOW_HOURS;
use fleet_core::{
    AircraftRef, FleetError, PlaybackSpeed, ReplayRangeRequest, ReplayRequest, ReplayStatus,
    TrackRequest,
};

use crate::api::routes::{error_response, fleet_error};
use crate::loops::replay_fetch::spawn_replay_fetch;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct RangeBody {
    /// Defaults to two hours before `end`
    pub start: Option<DateTime<Utc>>,
    /// Defaults to now
    pub end: Option<DateTime<Utc>>,
    pub step_seconds: Option<u32>,
    pub aircraft_icao24: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TrackBody {
    pub icao24: String,
    #[serde(default)]
    pub tail_number: Option<String>,
    pub takeoff_ts: DateTime<Utc>,
    #[serde(default)]
    pub landing_ts: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct SpeedBody {
    pub speed: u32,
}

#[derive(Debug, Deserialize)]
pub struct ScrubBody {
    pub index: usize,
}

pub async fn get_replay(State(state): State<Arc<AppState>>) -> Json<ReplayStatus> {
    Json(state.with_session(|session| session.replay().status()))
}

pub async fn start_range(
    State(state): State<Arc<AppState>>,
    body: Option<Json<RangeBody>>,
) -> Result<(StatusCode, Json<ReplayStatus>), Response> {
    let body = body.map(|Json(body)| body).unwrap_or_default();
    let end = body.end.unwrap_or_else(Utc::now);
    let start = body
        .start
        .unwrap_or(end - Duration::hours(DEFAULT_WINDOW_HOURS));

    let request = ReplayRangeRequest::new(start, end, body.step_seconds, body.aircraft_icao24)
        .map_err(fleet_error)?;
    tracing::info!(
        "Replay range {} .. {} every {}s",
        request.start,
        request.end,
        request.step_seconds
    );

    let status = spawn_replay_fetch(state, ReplayRequest::Range(request));
    Ok((StatusCode::ACCEPTED, Json(status)))
}

pub async fn start_track(
    State(state): State<Arc<AppState>>,
    Json(body): Json<TrackBody>,
) -> Result<(StatusCode, Json<ReplayStatus>), Response> {
    let icao24 = body.icao24.trim();
    if icao24.is_empty() {
        return Err(error_response(StatusCode::BAD_REQUEST, "icao24 is required"));
    }
    if body.landing_ts.is_some_and(|landing| landing <= body.takeoff_ts) {
        return Err(fleet_error(FleetError::InvalidRange));
    }

    let request = TrackRequest {
        aircraft: AircraftRef::new(body.tail_number.unwrap_or_default(), icao24),
        takeoff_ts: body.takeoff_ts,
        landing_ts: body.landing_ts,
    };
    tracing::info!("Replay track for {} from {}", icao24, request.takeoff_ts);

    let status = spawn_replay_fetch(state, ReplayRequest::Track(request));
    Ok((StatusCode::ACCEPTED, Json(status)))
}

pub async fn toggle_play(State(state): State<Arc<AppState>>) -> Result<Json<ReplayStatus>, Response> {
    let status = state
        .with_session(|session| {
            session.replay_mut().toggle_play()?;
            Ok::<_, FleetError>(session.replay().status())
        })
        .map_err(fleet_error)?;
    state.notify_replay_clock();
    Ok(Json(status))
}

pub async fn set_speed(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SpeedBody>,
) -> Result<Json<ReplayStatus>, Response> {
    let speed = PlaybackSpeed::try_from(body.speed).map_err(fleet_error)?;
    let status = state.with_session(|session| {
        session.replay_mut().set_speed(speed);
        session.replay().status()
    });
    state.notify_replay_clock();
    Ok(Json(status))
}

pub async fn scrub(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ScrubBody>,
) -> Result<Json<ReplayStatus>, Response> {
    let status = state
        .with_session(|session| {
            session.replay_mut().scrub(body.index)?;
            Ok::<_, FleetError>(session.replay().status())
        })
        .map_err(fleet_error)?;
    state.notify_replay_clock();
    Ok(Json(status))
}

pub async fn exit_replay(State(state): State<Arc<AppState>>) -> Json<ReplayStatus> {
    let status = state.with_session(|session| {
        session.exit_replay();
        session.replay().status()
    });
    state.notify_replay_clock();
    tracing::info!("Back to live");
    Json(status)
}
