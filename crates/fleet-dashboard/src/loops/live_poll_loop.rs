//! Live snapshot polling.
//!
//! Polls the backend on a fixed interval and feeds each snapshot into the
//! session. Skipped entirely while replay owns the display.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::broadcast;
use tokio::time::{interval, sleep, MissedTickBehavior};

use fleet_core::NoveltyBatch;

use crate::state::AppState;

/// Start the live polling loop.
pub async fn run_live_poll_loop(state: Arc<AppState>, mut shutdown: broadcast::Receiver<()>) {
    let mut ticker = interval(state.config().poll_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = shutdown.recv() => {
                tracing::info!("Live poll loop shutting down");
                break;
            }
            _ = ticker.tick() => {
                poll_once(&state).await;
            }
        }
    }
}

/// One polling cycle.
pub async fn poll_once(state: &Arc<AppState>) {
    if state.with_session(|session| session.replay().suspends_live_polling()) {
        tracing::trace!("Replay active, live poll skipped");
        return;
    }

    match state.client().fetch_snapshot().await {
        Ok(snapshot) => {
            let positions = snapshot.positions.len();
            let batch = state.with_session(|session| {
                // Replay may have started while the fetch was in flight
                if session.replay().suspends_live_polling() {
                    return None;
                }
                Some(session.apply_snapshot(snapshot, Utc::now()))
            });

            match batch {
                Some(batch) if !batch.is_empty() => {
                    tracing::debug!(
                        "Snapshot with {} positions, {} new event(s)",
                        positions,
                        batch.keys.len()
                    );
                    schedule_release(state.clone(), batch);
                }
                Some(_) => tracing::debug!("Snapshot with {} positions", positions),
                None => tracing::debug!("Snapshot dropped, replay started during fetch"),
            }
        }
        Err(e) => {
            tracing::warn!("Live snapshot fetch failed: {}", e);
            state.with_session(|session| {
                session.record_fetch_failure(format!("Live data unavailable: {e}"), Utc::now())
            });
        }
    }
}

/// One-shot timer that un-highlights a novelty batch once its window elapses.
fn schedule_release(state: Arc<AppState>, batch: NoveltyBatch) {
    let delay = (batch.expires_at - Utc::now()).to_std().unwrap_or_default();
    tokio::spawn(async move {
        sleep(delay).await;
        let released = state.with_session(|session| session.release_highlights(batch.id));
        tracing::trace!("Released {} highlight(s) from batch {}", released, batch.id);
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use fleet_core::{ReplayRangeRequest, ReplayRequest};

    fn unreachable_state() -> Arc<AppState> {
        let config = Config {
            backend_url: "http://127.0.0.1:9".to_string(),
            request_timeout_secs: 1,
            ..Config::default()
        };
        Arc::new(AppState::new(config).unwrap())
    }

    #[tokio::test]
    async fn failed_poll_raises_banner() {
        let state = unreachable_state();
        poll_once(&state).await;

        let banner = state.with_session(|s| s.banner().cloned()).unwrap();
        assert!(banner.message.starts_with("Live data unavailable"));
        assert!(state.with_session(|s| s.snapshot().is_none()));
    }

    #[tokio::test]
    async fn poll_skipped_while_replaying() {
        let state = unreachable_state();
        state.with_session(|s| {
            let ticket = s.begin_replay(ReplayRequest::Range(ReplayRangeRequest::recent(Utc::now())));
            s.complete_replay(ticket, Ok(vec![fleet_core::ReplayStep {
                ts: Utc::now(),
                kpis: Default::default(),
                positions: Vec::new(),
                events: Vec::new(),
            }]), Utc::now());
        });

        poll_once(&state).await;
        // No fetch was attempted, so no failure banner either
        assert!(state.with_session(|s| s.banner().is_none()));
    }
}
