//! Route handlers for the dashboard API.

pub mod agents;
pub mod health;
pub mod messages;
pub mod stats;
pub mod threads;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

/// Build the router with all routes.
pub fn router() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(health::health))
        // Threads
        .route("/threads", get(threads::list))
        .route("/threads/:id", get(threads::detail).patch(threads::update))
        // Messages
        .route("/send", post(messages::send))
        // Dashboard data
        .route("/stats", get(stats::stats))
        .route("/agents", get(agents::agents))
}
