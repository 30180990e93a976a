//! REST API routes.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

use fleet_core::{FleetError, FleetFilter, FleetRow, Trail};

use crate::api::replay;
use crate::state::{AppState, DashboardView, FlightsView, Panel};

/// Create the API router.
pub fn create_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/v1/view", get(get_view))
        .route("/v1/fleet", get(list_fleet))
        .route("/v1/flights", get(list_flights))
        .route("/v1/select", post(select_aircraft))
        .route("/v1/trail", get(get_trail))
        .route("/v1/banner", delete(dismiss_banner))
        .route("/v1/replay", get(replay::get_replay))
        .route("/v1/replay/range", post(replay::start_range))
        .route("/v1/replay/track", post(replay::start_track))
        .route("/v1/replay/toggle", post(replay::toggle_play))
        .route("/v1/replay/speed", post(replay::set_speed))
        .route("/v1/replay/scrub", post(replay::scrub))
        .route("/v1/replay/exit", post(replay::exit_replay))
}

pub(crate) fn error_response(status: StatusCode, message: impl ToString) -> Response {
    (status, Json(json!({ "error": message.to_string() }))).into_response()
}

/// Replay actions without a loaded replay conflict with the current mode;
/// everything else is a bad request.
pub(crate) fn fleet_error(err: FleetError) -> Response {
    let status = match err {
        FleetError::NotReplaying => StatusCode::CONFLICT,
        _ => StatusCode::BAD_REQUEST,
    };
    error_response(status, err)
}

// === Request/Response types ===

#[derive(Debug, Deserialize)]
pub struct SelectRequest {
    /// Aircraft to follow; null or blank clears the selection
    pub icao24: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TrailResponse {
    pub selected: Option<String>,
    pub trail: Option<Trail>,
}

// === Handlers ===

async fn get_view(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<FleetFilter>,
) -> Json<DashboardView> {
    let now = Utc::now();
    Json(state.with_session(|session| session.view(now, &filter)))
}

async fn list_fleet(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<FleetFilter>,
) -> Json<Panel<Vec<FleetRow>>> {
    let now = Utc::now();
    let rows = state.with_session(|session| session.fleet_rows(now, &filter));
    Json(Panel::from_items(rows))
}

async fn list_flights(State(state): State<Arc<AppState>>) -> Json<FlightsView> {
    let now = Utc::now();
    Json(state.with_session(|session| session.flights_view(now)))
}

async fn select_aircraft(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SelectRequest>,
) -> Json<TrailResponse> {
    let response = state.with_session(|session| {
        session.select(req.icao24);
        TrailResponse {
            selected: session.selected().map(str::to_string),
            trail: session.trail(),
        }
    });
    tracing::debug!("Selected aircraft {:?}", response.selected);
    Json(response)
}

async fn get_trail(State(state): State<Arc<AppState>>) -> Json<TrailResponse> {
    Json(state.with_session(|session| TrailResponse {
        selected: session.selected().map(str::to_string),
        trail: session.trail(),
    }))
}

async fn dismiss_banner(State(state): State<Arc<AppState>>) -> StatusCode {
    state.with_session(|session| session.dismiss_banner());
    StatusCode::NO_CONTENT
}
