//! Route definitions

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::handlers::{calendar_events, free_busy, health, root, webhook};
use crate::middleware::auth::auth_middleware;
use crate::server::AppState;

/// Create the router; `/api/*` sits behind the API key check
pub fn routes(state: AppState) -> Router<AppState> {
    let api = Router::new()
        .route("/api/calendar/events", post(calendar_events))
        .route("/api/calendar/free-busy", post(free_busy))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/api/health", get(health))
        // Messenger bot entry point
        .route("/webhook", post(webhook))
        .merge(api)
}
