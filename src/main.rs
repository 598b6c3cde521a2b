use console_gate::{
    AppState,
    config::{AppConfig, Env},
    create_router,
    upstream::{HttpUpstream, UpstreamState},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Loads configuration, sets up logging, builds the upstream client and gate,
/// and serves the router.
#[tokio::main]
async fn main() {
    // 1. Configuration (fail closed: no signing secret, no service)
    dotenv::dotenv().ok();
    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("FATAL: {e}");
            std::process::exit(1);
        }
    };

    // 2. Logging filter: RUST_LOG wins, otherwise debug for the gate itself.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "console_gate=debug,tower_http=info".into());

    // 3. Pretty logs locally, JSON in production.
    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Gate starting in {:?} mode", config.env);
    tracing::info!(
        api_host = %config.api_host,
        ui_host = %config.ui_host,
        admin_prefixes = ?config.admin_prefixes,
        admin_gate_mode = ?config.admin_gate_mode,
        "upstreams configured"
    );

    // 4. Upstream client
    let upstream = HttpUpstream::new(&config.api_host, &config.ui_host)
        .expect("FATAL: Failed to build the upstream HTTP client.");
    let upstream = Arc::new(upstream) as UpstreamState;

    // 5. State and router
    let bind_addr = config.bind_addr;
    let app = create_router(AppState::new(config, upstream));

    let listener = TcpListener::bind(bind_addr)
        .await
        .expect("FATAL: Failed to bind the listen address. Check BIND_ADDR.");

    tracing::info!("Listening on {}", bind_addr);

    axum::serve(listener, app)
        .await
        .expect("FATAL: HTTP server terminated unexpectedly.");
}
