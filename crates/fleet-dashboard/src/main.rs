//! Fleet Dashboard - always-on session service for the operator dashboard

use anyhow::Result;
use axum::{middleware, routing::get};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::broadcast;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fleet_dashboard::api::{self, request_id};
use fleet_dashboard::config::Config;
use fleet_dashboard::loops;
use fleet_dashboard::state::AppState;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("fleet_dashboard=debug".parse()?))
        .init();

    tracing::info!("Starting Fleet Dashboard...");

    let config = Config::from_env();
    let port = config.server_port;
    tracing::info!("Backend at {}", config.backend_url);
    let state = Arc::new(AppState::new(config)?);

    let (shutdown_tx, _) = broadcast::channel::<()>(1);

    // Start background loops
    tokio::spawn(loops::live_poll_loop::run_live_poll_loop(state.clone(), shutdown_tx.subscribe()));
    tokio::spawn(loops::replay_clock_loop::run_replay_clock_loop(state.clone(), shutdown_tx.subscribe()));
    tokio::spawn(loops::flight_board_loop::run_flight_board_loop(state.clone(), shutdown_tx.subscribe()));

    // Build the app
    let app = api::routes()
        .route("/health", get(|| async { "OK" }))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(request_id::ensure_request_id))
        .layer(CorsLayer::permissive());

    // Run server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown_tx))
        .await?;

    Ok(())
}

/// Resolve on Ctrl-C and tell every loop to stop.
async fn shutdown_signal(shutdown_tx: broadcast::Sender<()>) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutdown requested");
    let _ = shutdown_tx.send(());
}
