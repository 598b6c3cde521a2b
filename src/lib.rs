use std::sync::Arc;

use axum::{Router, extract::FromRef, http::HeaderName, middleware};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

pub mod auth;
pub mod config;
pub mod gate;
pub mod handlers;
pub mod models;
pub mod paths;
pub mod upstream;

// Routing segregation (served locally vs relayed upstream).
pub mod routes;
use routes::{authenticated, proxy, public};

// --- Public Re-exports ---

pub use auth::{AuthError, Session, TokenVerifier};
pub use config::AppConfig;
pub use gate::{AccessDecision, AdminGateMode, Gate};
pub use paths::RouteRules;
pub use upstream::{HttpUpstream, MockUpstream, UpstreamState};

/// ApiDoc
///
/// OpenAPI document for the endpoints the gate serves itself, published at
/// `/gate/openapi.json` with a Swagger UI at `/gate/docs`.
#[derive(OpenApi)]
#[openapi(
    paths(handlers::health, handlers::get_session, handlers::logout, handlers::not_admin),
    components(schemas(models::SessionBody, models::SessionView)),
    tags((name = "console-gate", description = "Session and role gate for the admin console"))
)]
struct ApiDoc;

/// AppState
///
/// Everything a request may need, built once at startup and cloned cheaply
/// into each handler.
#[derive(Clone)]
pub struct AppState {
    /// Route rules and token verifier.
    pub gate: Arc<Gate>,
    /// Forwarder to the API and UI hosts.
    pub upstream: UpstreamState,
    pub config: AppConfig,
}

impl AppState {
    /// Builds the gate from the configured secret, admin prefixes and mode.
    pub fn new(config: AppConfig, upstream: UpstreamState) -> Self {
        let rules = RouteRules::default().with_admin_prefixes(config.admin_prefixes.clone());
        let verifier = TokenVerifier::new(&config.jwt_secret);
        let gate = Arc::new(Gate::new(rules, verifier, config.admin_gate_mode));

        Self {
            gate,
            upstream,
            config,
        }
    }
}

// --- Axum FromRef Extractor Implementations ---

// Handlers pull only the pieces they need out of the shared state.

impl FromRef<AppState> for UpstreamState {
    fn from_ref(app_state: &AppState) -> UpstreamState {
        app_state.upstream.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// create_router
///
/// Assembles the routes, the upstream fallback and the access gate, then wraps
/// everything in the request-id and tracing layers.
pub fn create_router(state: AppState) -> Router {
    let x_request_id = HeaderName::from_static("x-request-id");
    let gate_state = state.gate.clone();

    let base_router = Router::new()
        .merge(SwaggerUi::new("/gate/docs").url("/gate/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(authenticated::authenticated_routes())
        .merge(proxy::proxy_routes())
        // Pages (including /login and /register) are rendered upstream.
        .fallback(handlers::proxy_to_ui)
        .with_state(state);

    base_router
        // The gate wraps the router, fallback included, so no path escapes it.
        .layer(middleware::from_fn_with_state(gate_state, gate::access_gate))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
}

/// Span per request carrying method, uri and the `x-request-id`, so every log
/// line of one request (gate decision included) can be correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
