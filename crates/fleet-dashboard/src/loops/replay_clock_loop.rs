//! Replay playback clock.
//!
//! Ticks at the selected speed's period and advances the replay controller by
//! one step per tick. Late ticks are skipped rather than bursted, so a slow
//! cycle never jumps more than one step. The ticker is rebuilt whenever the
//! session signals a play/pause, speed or mode change.

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

use fleet_core::{PlaybackSpeed, TickOutcome};

use crate::state::AppState;

/// Start the replay clock loop.
pub async fn run_replay_clock_loop(state: Arc<AppState>, mut shutdown: broadcast::Receiver<()>) {
    let mut speed = state.with_session(|session| session.replay().speed());
    let mut ticker = replay_ticker(speed);

    loop {
        tokio::select! {
            _ = shutdown.recv() => {
                tracing::info!("Replay clock loop shutting down");
                break;
            }
            _ = state.replay_clock_changed() => {
                let current = state.with_session(|session| session.replay().speed());
                if current != speed {
                    tracing::debug!("Replay speed {}x", current.multiplier());
                    speed = current;
                }
                ticker = replay_ticker(speed);
            }
            _ = ticker.tick() => {
                match state.with_session(|session| session.replay_mut().tick()) {
                    TickOutcome::Finished { index } => {
                        tracing::info!("Replay reached final step {}", index);
                    }
                    TickOutcome::Advanced { index } => {
                        tracing::trace!("Replay step {}", index);
                    }
                    TickOutcome::Idle => {}
                }
            }
        }
    }
}

/// First tick one full period from now so a fresh play never skips a step.
fn replay_ticker(speed: PlaybackSpeed) -> Interval {
    let period = speed.tick_interval();
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use chrono::{Duration, TimeZone, Utc};
    use fleet_core::{FleetKpis, ReplayRangeRequest, ReplayRequest, ReplayStep};

    fn steps(count: i64) -> Vec<ReplayStep> {
        let base = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        (0..count)
            .map(|i| ReplayStep {
                ts: base + Duration::minutes(i),
                kpis: FleetKpis::default(),
                positions: Vec::new(),
                events: Vec::new(),
            })
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn plays_to_the_end_at_four_x_and_pauses() {
        let state = Arc::new(AppState::new(Config::default()).unwrap());
        state.with_session(|s| {
            let ticket = s.begin_replay(ReplayRequest::Range(ReplayRangeRequest::recent(Utc::now())));
            s.complete_replay(ticket, Ok(steps(5)), Utc::now());
            s.replay_mut().set_speed(PlaybackSpeed::X4);
            s.replay_mut().toggle_play().unwrap();
        });

        let (tx, rx) = broadcast::channel(1);
        let handle = tokio::spawn(run_replay_clock_loop(state.clone(), rx));

        // 4 ticks of 250ms reach the last step
        tokio::time::sleep(std::time::Duration::from_millis(1100)).await;
        let (index, playing) = state.with_session(|s| (s.replay().index(), s.replay().is_playing()));
        assert_eq!(index, 4);
        assert!(!playing);

        tx.send(()).unwrap();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn paused_replay_does_not_advance() {
        let state = Arc::new(AppState::new(Config::default()).unwrap());
        state.with_session(|s| {
            let ticket = s.begin_replay(ReplayRequest::Range(ReplayRangeRequest::recent(Utc::now())));
            s.complete_replay(ticket, Ok(steps(5)), Utc::now());
        });

        let (tx, rx) = broadcast::channel(1);
        let handle = tokio::spawn(run_replay_clock_loop(state.clone(), rx));

        tokio::time::sleep(std::time::Duration::from_secs(3)).await;
        assert_eq!(state.with_session(|s| s.replay().index()), 0);

        tx.send(()).unwrap();
        handle.await.unwrap();
    }
}
