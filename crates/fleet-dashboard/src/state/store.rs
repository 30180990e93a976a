//! Shared application state: the session behind one mutex plus the backend client.

use std::sync::{Mutex, MutexGuard};

use tokio::sync::futures::Notified;
use tokio::sync::Notify;

use fleet_sdk::{FetchError, FleetClient};

use crate::config::Config;
use crate::state::DashboardSession;

/// Application state shared between handlers and loops.
///
/// The session mutex is a std mutex and is never held across an await.
pub struct AppState {
    session: Mutex<DashboardSession>,
    client: FleetClient,
    config: Config,
    replay_clock: Notify,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, FetchError> {
        let client = FleetClient::with_timeout(config.backend_url.clone(), config.request_timeout())?;
        Ok(Self {
            session: Mutex::new(DashboardSession::new(config.rules())),
            client,
            config,
            replay_clock: Notify::new(),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn client(&self) -> &FleetClient {
        &self.client
    }

    /// Run `f` with exclusive access to the session.
    pub fn with_session<R>(&self, f: impl FnOnce(&mut DashboardSession) -> R) -> R {
        let mut session = self.lock_session();
        f(&mut session)
    }

    fn lock_session(&self) -> MutexGuard<'_, DashboardSession> {
        self.session.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Wake the replay clock after play/pause, speed or mode changes.
    pub fn notify_replay_clock(&self) {
        self.replay_clock.notify_one();
    }

    pub fn replay_clock_changed(&self) -> Notified<'_> {
        self.replay_clock.notified()
    }
}
