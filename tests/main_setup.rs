use console_gate::{
    AdminGateMode, AppConfig,
    config::{ConfigError, Env},
};
use serial_test::serial;
use std::env;

// --- Setup/Teardown Utilities ---

const CONFIG_VARS: &[&str] = &[
    "APP_ENV",
    "JWT_SECRET",
    "BIND_ADDR",
    "API_HOST",
    "UI_HOST",
    "ADMIN_ONLY_PREFIXES",
    "ADMIN_GATE_MODE",
    "MAX_BODY_BYTES",
];

/// Loads the config with exactly `vars` set (every other config var cleared),
/// then restores the process environment.
fn load_with(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
    let originals: Vec<(&str, Option<String>)> = CONFIG_VARS
        .iter()
        .map(|&var| (var, env::var(var).ok()))
        .collect();

    unsafe {
        for var in CONFIG_VARS {
            env::remove_var(var);
        }
        for (key, value) in vars {
            env::set_var(key, value);
        }
    }

    let result = AppConfig::load();

    unsafe {
        for (key, original) in originals {
            match original {
                Some(value) => env::set_var(key, value),
                None => env::remove_var(key),
            }
        }
    }

    result
}

// --- Tests ---

#[test]
#[serial]
fn test_missing_secret_fails_closed_locally() {
    let result = load_with(&[("APP_ENV", "local")]);

    assert_eq!(result.unwrap_err(), ConfigError::Missing("JWT_SECRET"));
}

#[test]
#[serial]
fn test_blank_secret_fails_closed() {
    let result = load_with(&[("JWT_SECRET", "   ")]);

    assert_eq!(result.unwrap_err(), ConfigError::Missing("JWT_SECRET"));
}

#[test]
#[serial]
fn test_production_requires_upstreams() {
    let result = load_with(&[("APP_ENV", "production"), ("JWT_SECRET", "s3cret")]);

    assert_eq!(result.unwrap_err(), ConfigError::Missing("API_HOST"));

    let result = load_with(&[
        ("APP_ENV", "production"),
        ("JWT_SECRET", "s3cret"),
        ("API_HOST", "https://api.internal"),
    ]);

    assert_eq!(result.unwrap_err(), ConfigError::Missing("UI_HOST"));
}

#[test]
#[serial]
fn test_local_defaults() {
    let config = load_with(&[("JWT_SECRET", "s3cret")]).unwrap();

    assert_eq!(config.env, Env::Local);
    assert_eq!(config.jwt_secret, "s3cret");
    assert_eq!(config.bind_addr.to_string(), "0.0.0.0:3001");
    assert_eq!(config.api_host, "http://127.0.0.1:3000");
    assert_eq!(config.ui_host, "http://127.0.0.1:3002");
    assert_eq!(config.admin_prefixes, vec!["/jobs", "/prompts"]);
    assert_eq!(config.admin_gate_mode, AdminGateMode::Enforce);
    assert_eq!(config.max_body_bytes, 64 * 1024 * 1024);
}

#[test]
#[serial]
fn test_production_overrides() {
    let config = load_with(&[
        ("APP_ENV", "production"),
        ("JWT_SECRET", "s3cret"),
        ("API_HOST", "https://api.internal/"),
        ("UI_HOST", "http://ui.internal:3000"),
        ("BIND_ADDR", "127.0.0.1:9000"),
        ("ADMIN_ONLY_PREFIXES", " /jobs , /users/ ,"),
        ("ADMIN_GATE_MODE", "log-only"),
        ("MAX_BODY_BYTES", "1024"),
    ])
    .unwrap();

    assert_eq!(config.env, Env::Production);
    assert_eq!(config.api_host, "https://api.internal");
    assert_eq!(config.ui_host, "http://ui.internal:3000");
    assert_eq!(config.bind_addr.port(), 9000);
    assert_eq!(config.admin_prefixes, vec!["/jobs", "/users"]);
    assert_eq!(config.admin_gate_mode, AdminGateMode::LogOnly);
    assert_eq!(config.max_body_bytes, 1024);
}

#[test]
#[serial]
fn test_invalid_values_are_reported() {
    let bad_prefix = load_with(&[("JWT_SECRET", "s"), ("ADMIN_ONLY_PREFIXES", "jobs")]);
    assert!(matches!(
        bad_prefix,
        Err(ConfigError::Invalid {
            var: "ADMIN_ONLY_PREFIXES",
            ..
        })
    ));

    let bad_mode = load_with(&[("JWT_SECRET", "s"), ("ADMIN_GATE_MODE", "sometimes")]);
    assert!(matches!(
        bad_mode,
        Err(ConfigError::Invalid {
            var: "ADMIN_GATE_MODE",
            ..
        })
    ));

    let bad_addr = load_with(&[("JWT_SECRET", "s"), ("BIND_ADDR", "nowhere")]);
    assert!(matches!(
        bad_addr,
        Err(ConfigError::Invalid {
            var: "BIND_ADDR",
            ..
        })
    ));
}
