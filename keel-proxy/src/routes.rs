//! Proxy route configuration.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers;
use crate::state::AppState;

/// Creates the router: control endpoints under `/__keel`, everything else proxied.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check
        .route("/__keel/health", get(handlers::health_check))

        // Client messages
        .route("/__keel/message", post(handlers::post_message))

        // Storage
        .route("/__keel/caches", get(handlers::list_caches))

        .fallback(handlers::proxy)
        .with_state(state)
}
