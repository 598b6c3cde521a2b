use std::{env, net::SocketAddr};

use crate::{gate::AdminGateMode, paths::DEFAULT_ADMIN_PREFIXES};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3001";
const LOCAL_API_HOST: &str = "http://127.0.0.1:3000";
const LOCAL_UI_HOST: &str = "http://127.0.0.1:3002";
const DEFAULT_MAX_BODY_BYTES: usize = 64 * 1024 * 1024;

/// AppConfig
///
/// Immutable configuration loaded once at startup and shared with handlers and
/// the gate through `AppState` / `FromRef`.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Runtime environment marker. Selects log format and which vars are mandatory.
    pub env: Env,
    // HMAC key shared with the API backend that issues session tokens.
    pub jwt_secret: String,
    pub bind_addr: SocketAddr,
    // Origin serving /api and /outputs.
    pub api_host: String,
    // Origin rendering the console pages.
    pub ui_host: String,
    pub admin_prefixes: Vec<String>,
    pub admin_gate_mode: AdminGateMode,
    // Upper bound on request bodies buffered for proxying.
    pub max_body_bytes: usize,
}

/// Env
///
/// Defines the runtime context: pretty logs and local upstream defaults, or JSON
/// logs with every upstream spelled out.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

/// ConfigError
///
/// Reasons the service refuses to start.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{var} is invalid: {reason}")]
    Invalid { var: &'static str, reason: String },
}

impl Default for AppConfig {
    /// Safe values for test scaffolding. Never used by `load`.
    fn default() -> Self {
        Self {
            env: Env::Local,
            jwt_secret: "console-gate-test-secret".to_string(),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3001)),
            api_host: LOCAL_API_HOST.to_string(),
            ui_host: LOCAL_UI_HOST.to_string(),
            admin_prefixes: DEFAULT_ADMIN_PREFIXES.iter().map(|p| p.to_string()).collect(),
            admin_gate_mode: AdminGateMode::Enforce,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from the environment. The signing secret has no
    /// fallback in any environment: without `JWT_SECRET` the gate could not
    /// verify a single token, so startup fails instead.
    pub fn load() -> Result<Self, ConfigError> {
        let env = match env::var("APP_ENV").as_deref() {
            Ok("production") => Env::Production,
            _ => Env::Local,
        };

        let jwt_secret = non_empty("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let (api_host, ui_host) = match env {
            Env::Local => (
                non_empty("API_HOST").unwrap_or_else(|| LOCAL_API_HOST.to_string()),
                non_empty("UI_HOST").unwrap_or_else(|| LOCAL_UI_HOST.to_string()),
            ),
            Env::Production => (
                non_empty("API_HOST").ok_or(ConfigError::Missing("API_HOST"))?,
                non_empty("UI_HOST").ok_or(ConfigError::Missing("UI_HOST"))?,
            ),
        };

        let bind_addr = non_empty("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::Invalid {
                var: "BIND_ADDR",
                reason: e.to_string(),
            })?;

        let admin_prefixes = match non_empty("ADMIN_ONLY_PREFIXES") {
            Some(raw) => parse_prefixes(&raw)?,
            None => DEFAULT_ADMIN_PREFIXES.iter().map(|p| p.to_string()).collect(),
        };

        let admin_gate_mode = match non_empty("ADMIN_GATE_MODE") {
            Some(raw) => AdminGateMode::parse(&raw).ok_or_else(|| ConfigError::Invalid {
                var: "ADMIN_GATE_MODE",
                reason: format!("expected `enforce` or `log-only`, got `{raw}`"),
            })?,
            None => AdminGateMode::Enforce,
        };

        let max_body_bytes = match non_empty("MAX_BODY_BYTES") {
            Some(raw) => raw.parse::<usize>().map_err(|e| ConfigError::Invalid {
                var: "MAX_BODY_BYTES",
                reason: e.to_string(),
            })?,
            None => DEFAULT_MAX_BODY_BYTES,
        };

        Ok(Self {
            env,
            jwt_secret,
            bind_addr,
            api_host: trim_origin(api_host),
            ui_host: trim_origin(ui_host),
            admin_prefixes,
            admin_gate_mode,
            max_body_bytes,
        })
    }
}

fn non_empty(var: &str) -> Option<String> {
    env::var(var).ok().filter(|value| !value.trim().is_empty())
}

/// Comma-separated list of absolute path prefixes, e.g. `/jobs,/prompts`.
fn parse_prefixes(raw: &str) -> Result<Vec<String>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| {
            if p.starts_with('/') {
                Ok(p.trim_end_matches('/').to_string())
            } else {
                Err(ConfigError::Invalid {
                    var: "ADMIN_ONLY_PREFIXES",
                    reason: format!("`{p}` does not start with `/`"),
                })
            }
        })
        .collect()
}

fn trim_origin(origin: String) -> String {
    origin.trim_end_matches('/').to_string()
}
