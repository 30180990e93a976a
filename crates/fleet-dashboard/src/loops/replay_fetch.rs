//! Replay fetch tasks.
//!
//! Each request gets its own task carrying the ticket it was started with.
//! The controller discards the result if the ticket has been superseded.

use std::sync::Arc;

use chrono::Utc;

use fleet_core::{ReplayRequest, ReplayStatus, ResolveOutcome};

use crate::state::AppState;

/// Enter loading for `request` and fetch its steps in the background.
/// Returns the replay status right after the request was registered.
pub fn spawn_replay_fetch(state: Arc<AppState>, request: ReplayRequest) -> ReplayStatus {
    let (ticket, status) = state.with_session(|session| {
        let ticket = session.begin_replay(request.clone());
        (ticket, session.replay().status())
    });
    state.notify_replay_clock();

    tokio::spawn(async move {
        let result = state
            .client()
            .fetch_replay(&request)
            .await
            .map_err(|e| e.to_string());

        let outcome = state.with_session(|session| session.complete_replay(ticket, result, Utc::now()));
        match outcome {
            ResolveOutcome::Loaded { steps } => {
                tracing::info!("Replay loaded with {} steps (generation {})", steps, ticket.generation());
            }
            ResolveOutcome::Failed(failure) => {
                tracing::warn!("Replay request failed: {:?}", failure);
            }
            ResolveOutcome::Discarded => {
                tracing::debug!("Stale replay result discarded (generation {})", ticket.generation());
            }
        }
        state.notify_replay_clock();
    });

    status
}
