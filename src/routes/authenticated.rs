use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Authenticated Router Module
///
/// Endpoints served by the gate that rely on the `Session` extension the gate
/// attaches after verifying the `token` cookie.
pub fn authenticated_routes() -> Router<AppState> {
    Router::new()
        // GET /session
        // Display projection of the verified claims, wrapped as {"ok": true, "user": ...}.
        .route("/session", get(handlers::get_session))
        // GET|POST /logout
        // Clears the session cookie and redirects to /login.
        .route("/logout", get(handlers::logout).post(handlers::logout))
        // GET /not-admin?next=...
        // Target of the forbidden redirect for admin-only areas.
        .route("/not-admin", get(handlers::not_admin))
}
