//! Fleet SDK client for the telemetry backend.

use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Url;
use serde::de::DeserializeOwned;

use fleet_core::models::{FlightEntry, ReplayStep, Snapshot, TrackPoint};
use fleet_core::replay::{steps_from_track, ReplayRangeRequest, ReplayRequest, TrackRequest};

use crate::error::FetchError;

/// Client for the fleet telemetry backend.
#[derive(Debug, Clone)]
pub struct FleetClient {
    pub(crate) base_url: String,
    pub(crate) client: reqwest::Client,
}

impl FleetClient {
    /// Create a new client with reqwest defaults.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Create a client whose requests give up after `timeout`.
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(FetchError::Transport)?;
        Ok(Self {
            base_url: base_url.into(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch the current live snapshot.
    pub async fn fetch_snapshot(&self) -> Result<Snapshot, FetchError> {
        let url = self.endpoint("/dashboard/snapshot", &[])?;
        self.get_json(url).await
    }

    /// Fetch replay steps for a time range.
    pub async fn fetch_replay_range(
        &self,
        request: &ReplayRangeRequest,
    ) -> Result<Vec<ReplayStep>, FetchError> {
        let mut params = vec![
            ("start", format_ts(request.start)),
            ("end", format_ts(request.end)),
            ("step_seconds", request.step_seconds.to_string()),
        ];
        if let Some(icao24) = request.aircraft_icao24.as_deref() {
            params.push(("aircraft_icao24", icao24.to_string()));
        }
        let url = self.endpoint("/replay/range", &params)?;
        self.get_json(url).await
    }

    /// Fetch the raw track points recorded for one flight.
    pub async fn fetch_track(&self, request: &TrackRequest) -> Result<Vec<TrackPoint>, FetchError> {
        let mut params = vec![
            ("icao24", request.aircraft.icao24.clone()),
            ("start", format_ts(request.takeoff_ts)),
        ];
        if let Some(landing_ts) = request.landing_ts {
            params.push(("end", format_ts(landing_ts)));
        }
        let url = self.endpoint("/replay/track", &params)?;
        self.get_json(url).await
    }

    /// Fetch whatever steps a replay request needs. Track requests are wrapped
    /// into single-aircraft steps.
    pub async fn fetch_replay(&self, request: &ReplayRequest) -> Result<Vec<ReplayStep>, FetchError> {
        match request {
            ReplayRequest::Range(range) => self.fetch_replay_range(range).await,
            ReplayRequest::Track(track) => {
                let points = self.fetch_track(track).await?;
                Ok(steps_from_track(&track.aircraft, &points))
            }
        }
    }

    /// Fetch the most recent flight board entries.
    pub async fn fetch_flight_board(&self, limit: usize) -> Result<Vec<FlightEntry>, FetchError> {
        let url = self.endpoint("/flights/board", &[("limit", limit.to_string())])?;
        self.get_json(url).await
    }

    fn endpoint(&self, path: &str, params: &[(&str, String)]) -> Result<Url, FetchError> {
        let base = self.base_url.trim_end_matches('/');
        let mut url = Url::parse(&format!("{base}{path}")).map_err(|e| FetchError::Url(e.to_string()))?;
        if !params.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in params {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, FetchError> {
        tracing::debug!(%url, "backend fetch");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(FetchError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }

        response.json().await.map_err(FetchError::Decode)
    }
}

fn format_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}
