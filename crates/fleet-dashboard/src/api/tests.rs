use axum::{
    body::Body,
    http::{Request, StatusCode},
    middleware,
};
use chrono::{Duration, TimeZone, Utc};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use fleet_core::{ReplayRangeRequest, ReplayRequest, ReplayStep, Snapshot};

use crate::{api, config::Config, state::AppState};

fn setup_app() -> (axum::Router, Arc<AppState>) {
    let config = Config {
        backend_url: "http://127.0.0.1:9".to_string(),
        request_timeout_secs: 1,
        ..Config::default()
    };
    let state = Arc::new(AppState::new(config).expect("state"));
    let app = api::routes().with_state(state.clone());
    (app, state)
}

async fn read_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("parse json")
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn snapshot_fixture() -> Snapshot {
    let now = Utc::now();
    serde_json::from_value(json!({
        "fleet_kpis": {"in_air": 1, "on_ground": 1, "seen_last_15m": 2, "events_last_hour": 2},
        "latest_positions": [
            {
                "tail_number": "LV-FLY", "icao24": "e0aa01", "ts": (now - Duration::minutes(1)).to_rfc3339(),
                "lat": -34.9, "lon": -58.0, "altitude": 3200.0, "velocity": 210.0, "heading": 90.0,
                "on_ground": false, "source": "adsb"
            },
            {
                "tail_number": "LV-PRK", "icao24": "e0bb02", "ts": (now - Duration::minutes(3)).to_rfc3339(),
                "lat": -34.56, "lon": -58.42, "altitude": 0.0, "velocity": 0.0, "heading": null,
                "on_ground": true, "source": "adsb"
            }
        ],
        "last_50_events": [
            {
                "ts": (now - Duration::minutes(5)).to_rfc3339(), "type": "LANDING",
                "tail_number": "LV-PRK", "icao24": "e0bb02",
                "meta": {"destination_airport": "AEP", "track_points": 120}
            },
            {
                "ts": (now - Duration::minutes(65)).to_rfc3339(), "type": "TAKEOFF",
                "tail_number": "LV-PRK", "icao24": "e0bb02",
                "meta": {"origin_airport": "MDQ"}
            },
            {
                "ts": (now - Duration::minutes(20)).to_rfc3339(), "type": "TAKEOFF",
                "tail_number": "LV-FLY", "icao24": "e0aa01",
                "meta": {"origin_airport": null, "lat": -34.82, "lon": -58.53}
            }
        ],
        "data_freshness_seconds": 3
    }))
    .expect("snapshot fixture")
}

fn seed_replay(state: &AppState, count: i64) {
    let base = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
    let steps: Vec<ReplayStep> = (0..count)
        .map(|i| {
            serde_json::from_value(json!({
                "ts": (base + Duration::minutes(i)).to_rfc3339(),
                "fleet_kpis": {"in_air": 1, "on_ground": 0, "seen_last_15m": 1, "events_last_hour": 0},
                "latest_positions": [{
                    "tail_number": "LV-FLY", "icao24": "e0aa01",
                    "ts": (base + Duration::minutes(i)).to_rfc3339(),
                    "lat": -34.9 + i as f64 * 0.01, "lon": -58.0,
                    "on_ground": false, "source": "adsb"
                }],
                "last_50_events": []
            }))
            .expect("step fixture")
        })
        .collect();
    state.with_session(|s| {
        let ticket = s.begin_replay(ReplayRequest::Range(ReplayRangeRequest::recent(base)));
        s.complete_replay(ticket, Ok(steps), base);
    });
}

#[tokio::test]
async fn view_is_loading_before_first_snapshot() {
    let (app, _state) = setup_app();

    let res = app.oneshot(get("/v1/view")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = read_json(res).await;
    assert_eq!(body["mode"], "live");
    assert_eq!(body["kpis"]["state"], "loading");
    assert_eq!(body["fleet"]["state"], "loading");
    assert_eq!(body["feed"]["state"], "loading");
    assert_eq!(body["replay"]["state"], "live");
    assert!(body["banner"].is_null());
}

#[tokio::test]
async fn view_classifies_fleet_and_correlates_feed() {
    let (app, state) = setup_app();
    state.with_session(|s| s.apply_snapshot(snapshot_fixture(), Utc::now()));

    let body = read_json(app.oneshot(get("/v1/view")).await.unwrap()).await;
    assert_eq!(body["kpis"]["data"]["in_air"], 1);
    assert!(body["data_age_seconds"].as_i64().unwrap() >= 3);

    let fleet = body["fleet"]["data"].as_array().unwrap();
    let status_of = |icao: &str| {
        fleet
            .iter()
            .find(|row| row["icao24"] == icao)
            .map(|row| row["status"].clone())
            .unwrap()
    };
    assert_eq!(status_of("e0aa01"), "in_flight");
    assert_eq!(status_of("e0bb02"), "turning");

    // Matched pair leaves the feed; the open takeoff stays with its key
    let feed = body["feed"]["data"].as_array().unwrap();
    assert_eq!(feed.len(), 1);
    assert_eq!(feed[0]["type"], "TAKEOFF");
    assert_eq!(feed[0]["tail_number"], "LV-FLY");
    assert!(feed[0]["key"].as_str().unwrap().ends_with("|LV-FLY|TAKEOFF"));
    assert_eq!(feed[0]["is_new"], false);

    let flights = body["flights"]["data"].as_array().unwrap();
    assert_eq!(flights.len(), 2);
    let completed = flights.iter().find(|f| f["tail_number"] == "LV-PRK").unwrap();
    assert_eq!(completed["origin_code"], "MDQ");
    assert_eq!(completed["destination_code"], "AEP");
    let open = flights.iter().find(|f| f["tail_number"] == "LV-FLY").unwrap();
    assert_eq!(open["origin_code"], "EZE");
    assert!(open["landing_ts"].is_null());
}

#[tokio::test]
async fn fleet_filter_by_search_and_status() {
    let (app, state) = setup_app();
    state.with_session(|s| s.apply_snapshot(snapshot_fixture(), Utc::now()));

    let body = read_json(app.clone().oneshot(get("/v1/fleet?search=lv-f")).await.unwrap()).await;
    let rows = body["data"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["tail_number"], "LV-FLY");

    let body = read_json(app.clone().oneshot(get("/v1/fleet?status=on_ground")).await.unwrap()).await;
    let rows = body["data"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["location"], "Aeroparque Jorge Newbery");

    let body = read_json(app.oneshot(get("/v1/fleet?search=zzz")).await.unwrap()).await;
    assert_eq!(body["state"], "no_data");
}

#[tokio::test]
async fn replay_actions_outside_replay_conflict() {
    let (app, _state) = setup_app();

    let res = app.clone().oneshot(post_json("/v1/replay/toggle", json!({}))).await.unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let body = read_json(res).await;
    assert!(body["error"].as_str().is_some());

    let res = app.oneshot(post_json("/v1/replay/scrub", json!({"index": 2}))).await.unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn replay_range_validation() {
    let (app, _state) = setup_app();
    let now = Utc::now();

    let res = app
        .clone()
        .oneshot(post_json(
            "/v1/replay/range",
            json!({"start": now.to_rfc3339(), "end": (now - Duration::hours(1)).to_rfc3339()}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = app
        .clone()
        .oneshot(post_json(
            "/v1/replay/range",
            json!({"start": (now - Duration::hours(30)).to_rfc3339(), "end": now.to_rfc3339()}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = app
        .oneshot(post_json("/v1/replay/range", json!({"step_seconds": 5})))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::ACCEPTED);
    let body = read_json(res).await;
    assert_eq!(body["state"], "loading");
    assert_eq!(body["request"]["kind"], "range");
    assert_eq!(body["request"]["step_seconds"], 30);
}

#[tokio::test]
async fn replay_track_requires_aircraft_and_order() {
    let (app, _state) = setup_app();
    let now = Utc::now();

    let res = app
        .clone()
        .oneshot(post_json(
            "/v1/replay/track",
            json!({"icao24": " ", "takeoff_ts": now.to_rfc3339()}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = app
        .clone()
        .oneshot(post_json(
            "/v1/replay/track",
            json!({
                "icao24": "e0aa01",
                "takeoff_ts": now.to_rfc3339(),
                "landing_ts": (now - Duration::minutes(5)).to_rfc3339()
            }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = app
        .oneshot(post_json(
            "/v1/replay/track",
            json!({"icao24": "e0aa01", "tail_number": "LV-FLY", "takeoff_ts": now.to_rfc3339()}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::ACCEPTED);
    let body = read_json(res).await;
    assert_eq!(body["request"]["kind"], "track");
    assert_eq!(body["request"]["aircraft"]["icao24"], "e0aa01");
}

#[tokio::test]
async fn scrub_pauses_and_clamps() {
    let (app, state) = setup_app();
    seed_replay(&state, 5);

    let res = app.clone().oneshot(post_json("/v1/replay/toggle", json!({}))).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(read_json(res).await["playing"], true);

    let res = app
        .clone()
        .oneshot(post_json("/v1/replay/scrub", json!({"index": 99})))
        .await
        .unwrap();
    let body = read_json(res).await;
    assert_eq!(body["state"], "replaying");
    assert_eq!(body["playing"], false);
    assert_eq!(body["index"], 4);
    assert_eq!(body["step_count"], 5);

    let body = read_json(app.oneshot(get("/v1/view")).await.unwrap()).await;
    assert_eq!(body["mode"], "replay");
    assert_eq!(body["fleet"]["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn speed_accepts_only_known_multipliers() {
    let (app, _state) = setup_app();

    let res = app
        .clone()
        .oneshot(post_json("/v1/replay/speed", json!({"speed": 3})))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = app
        .oneshot(post_json("/v1/replay/speed", json!({"speed": 4})))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(read_json(res).await["speed"], 4);
}

#[tokio::test]
async fn selection_builds_trail_and_exit_returns_live() {
    let (app, state) = setup_app();
    seed_replay(&state, 4);
    state.with_session(|s| s.replay_mut().scrub(2).unwrap());

    let res = app
        .clone()
        .oneshot(post_json("/v1/select", json!({"icao24": "e0aa01"})))
        .await
        .unwrap();
    let body = read_json(res).await;
    assert_eq!(body["selected"], "e0aa01");
    assert_eq!(body["trail"]["points"].as_array().unwrap().len(), 3);

    let res = app.clone().oneshot(post_json("/v1/replay/exit", json!({}))).await.unwrap();
    assert_eq!(read_json(res).await["state"], "live");

    let body = read_json(app.oneshot(get("/v1/trail")).await.unwrap()).await;
    assert_eq!(body["selected"], "e0aa01");
    assert!(body["trail"].is_null());
}

#[tokio::test]
async fn banner_dismissal() {
    let (app, state) = setup_app();
    state.with_session(|s| s.record_fetch_failure("Live data unavailable", Utc::now()));

    let body = read_json(app.clone().oneshot(get("/v1/view")).await.unwrap()).await;
    assert_eq!(body["banner"]["message"], "Live data unavailable");

    let res = app
        .clone()
        .oneshot(Request::builder().method("DELETE").uri("/v1/banner").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let body = read_json(app.oneshot(get("/v1/view")).await.unwrap()).await;
    assert!(body["banner"].is_null());
}

#[tokio::test]
async fn flights_endpoint_reports_board_panel() {
    let (app, state) = setup_app();
    state.with_session(|s| {
        s.apply_snapshot(snapshot_fixture(), Utc::now());
        s.apply_board(Vec::new());
    });

    let body = read_json(app.oneshot(get("/v1/flights")).await.unwrap()).await;
    assert_eq!(body["correlated"]["state"], "ready");
    assert_eq!(body["board"]["state"], "no_data");
}

#[tokio::test]
async fn request_id_is_generated_or_echoed() {
    let (app, _state) = setup_app();
    let app = app.layer(middleware::from_fn(api::request_id::ensure_request_id));

    let res = app.clone().oneshot(get("/v1/replay")).await.unwrap();
    let generated = res.headers().get("x-request-id").unwrap().to_str().unwrap();
    assert_eq!(generated.len(), 36);

    let req = Request::builder()
        .uri("/v1/replay")
        .header("x-request-id", "ops-123")
        .body(Body::empty())
        .unwrap();
    let res = app.oneshot(req).await.unwrap();
    assert_eq!(res.headers().get("x-request-id").unwrap(), "ops-123");
}
