//! Dashboard configuration from environment.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use fleet_core::EngineRules;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    pub backend_url: String,
    pub poll_interval_secs: u64,
    pub board_interval_secs: u64,
    pub board_limit: usize,
    pub request_timeout_secs: u64,
    pub turnaround_minutes: i64,
    pub stale_after_minutes: i64,
    pub highlight_seconds: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            backend_url: "http://localhost:5000".to_string(),
            poll_interval_secs: 5,
            board_interval_secs: 60,
            board_limit: 50,
            request_timeout_secs: 10,
            turnaround_minutes: 90,
            stale_after_minutes: 20,
            highlight_seconds: 10,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: parsed("FLEET_PORT").unwrap_or(defaults.server_port),
            backend_url: env::var("FLEET_BACKEND_URL").unwrap_or(defaults.backend_url),
            poll_interval_secs: parsed("FLEET_POLL_INTERVAL_SECS")
                .filter(|secs| *secs > 0)
                .unwrap_or(defaults.poll_interval_secs),
            board_interval_secs: parsed("FLEET_BOARD_INTERVAL_SECS")
                .filter(|secs| *secs > 0)
                .unwrap_or(defaults.board_interval_secs),
            board_limit: parsed("FLEET_BOARD_LIMIT").unwrap_or(defaults.board_limit),
            request_timeout_secs: parsed("FLEET_REQUEST_TIMEOUT_SECS")
                .unwrap_or(defaults.request_timeout_secs),
            turnaround_minutes: parsed("FLEET_TURNAROUND_MINUTES")
                .unwrap_or(defaults.turnaround_minutes),
            stale_after_minutes: parsed("FLEET_STALE_MINUTES")
                .unwrap_or(defaults.stale_after_minutes),
            highlight_seconds: parsed("FLEET_HIGHLIGHT_SECS").unwrap_or(defaults.highlight_seconds),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn board_interval(&self) -> Duration {
        Duration::from_secs(self.board_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn rules(&self) -> EngineRules {
        EngineRules {
            turnaround_minutes: self.turnaround_minutes,
            stale_after_minutes: self.stale_after_minutes,
            highlight_seconds: self.highlight_seconds,
            ..EngineRules::default()
        }
    }
}

fn parsed<T: FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_engine_rules() {
        let config = Config::default();
        assert_eq!(config.rules(), EngineRules::default());
        assert_eq!(config.poll_interval(), Duration::from_secs(5));
        assert_eq!(config.board_limit, 50);
    }
}
