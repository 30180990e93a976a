//! REST API for the rendering layer.

pub mod replay;
pub mod request_id;
mod routes;

use axum::Router;
use std::sync::Arc;

use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    routes::create_router()
}

#[cfg(test)]
mod tests;
