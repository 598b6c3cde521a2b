use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Public Router Module
///
/// Endpoints the gate bypasses entirely. `/login`, `/register` and the asset
/// trees are public too, but they are rendered upstream and reach it through
/// the fallback.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /healthz
        // Liveness probe. Listed in the gate's bypass set, so no token is read.
        .route("/healthz", get(handlers::health))
}
