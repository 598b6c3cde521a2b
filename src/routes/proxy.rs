use crate::{AppState, handlers};
use axum::{Router, routing::any};

/// Proxy Router Module
///
/// Paths the console's page renderer rewrites to the API host. Admin-only
/// enforcement already happened in the gate; the API applies its own checks
/// on top.
pub fn proxy_routes() -> Router<AppState> {
    Router::new()
        // ANY /api/*
        .route("/api", any(handlers::proxy_to_api))
        .route("/api/{*rest}", any(handlers::proxy_to_api))
        // ANY /outputs/*
        // Generated job artifacts. Public: asset trees bypass authentication.
        .route("/outputs", any(handlers::proxy_to_api))
        .route("/outputs/{*rest}", any(handlers::proxy_to_api))
}
