//! Flight board refresh loop.

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::time::{interval, MissedTickBehavior};

use crate::state::AppState;

/// Start the flight board refresh loop.
pub async fn run_flight_board_loop(state: Arc<AppState>, mut shutdown: broadcast::Receiver<()>) {
    let mut ticker = interval(state.config().board_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let limit = state.config().board_limit;

    loop {
        tokio::select! {
            _ = shutdown.recv() => {
                tracing::info!("Flight board loop shutting down");
                break;
            }
            _ = ticker.tick() => {
                match state.client().fetch_flight_board(limit).await {
                    Ok(entries) => {
                        tracing::debug!("Flight board refreshed with {} entries", entries.len());
                        state.with_session(|session| session.apply_board(entries));
                    }
                    Err(e) => {
                        // The board keeps its previous contents
                        tracing::warn!("Flight board fetch failed: {}", e);
                    }
                }
            }
        }
    }
}
