use super::handlers;
use super::state::AppState;
use axum::{routing::get, Router};
use std::path::Path;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
///
/// `relay_path` is upgraded to the relay socket; every path without a route
/// is served from `site_root`.
pub fn create_router(state: AppState, relay_path: &str, site_root: impl AsRef<Path>) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Relay socket
        .route(relay_path, get(handlers::relay_socket))
        .route("/api/relay/status", get(handlers::relay_status))
        // Marketing site pages
        .fallback_service(ServeDir::new(site_root.as_ref()))
        .layer(CorsLayer::permissive())
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
