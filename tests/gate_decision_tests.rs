use console_gate::{
    auth::{AuthError, TokenVerifier},
    gate::{AccessDecision, AdminGateMode, Gate, redirect_location},
    paths::RouteRules,
};
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::json;
use std::time::SystemTime;

const TEST_JWT_SECRET: &str = "decision-test-secret";

fn token(roles: serde_json::Value, exp_offset: i64) -> String {
    let now = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64;
    let key = EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes());
    encode(
        &Header::default(),
        &json!({ "sub": "u-1", "roles": roles, "exp": now + exp_offset }),
        &key,
    )
    .unwrap()
}

fn gate(mode: AdminGateMode) -> Gate {
    Gate::new(
        RouteRules::default(),
        TokenVerifier::new(TEST_JWT_SECRET),
        mode,
    )
}

#[test]
fn test_public_paths_ignore_token_state() {
    let gate = gate(AdminGateMode::Enforce);
    let expired = token(json!(["user"]), -60);

    for path in ["/login", "/register", "/outputs/job1/report.md", "/uploads/x.png"] {
        for presented in [None, Some("garbage"), Some(expired.as_str())] {
            assert_eq!(
                gate.decide(path, presented),
                AccessDecision::Allow { session: None },
                "{path} with {presented:?}"
            );
        }
    }
}

#[test]
fn test_bypassed_paths_skip_the_gate() {
    let gate = gate(AdminGateMode::Enforce);

    assert!(gate.decide("/_next/static/app.js", None).is_allowed());
    assert!(gate.decide("/favicon.ico", Some("garbage")).is_allowed());
    assert!(gate.decide("/healthz", None).is_allowed());
}

#[test]
fn test_missing_token_redirects_without_clearing() {
    let gate = gate(AdminGateMode::Enforce);
    let decision = gate.decide("/users", None);

    assert_eq!(
        decision,
        AccessDecision::RedirectToLogin {
            next: "/users".to_string(),
            reason: AuthError::MissingToken,
        }
    );
    assert!(!decision.clears_cookie());
}

#[test]
fn test_invalid_and_expired_tokens_clear_cookie() {
    let gate = gate(AdminGateMode::Enforce);
    let expired = token(json!(["admin"]), -60);

    let invalid = gate.decide("/", Some("garbage"));
    assert_eq!(invalid.reason(), Some(AuthError::InvalidToken));
    assert!(invalid.clears_cookie());

    let expired = gate.decide("/", Some(&expired));
    assert_eq!(expired.reason(), Some(AuthError::ExpiredToken));
    assert!(expired.clears_cookie());
}

#[test]
fn test_non_privileged_user_is_forbidden_on_admin_paths() {
    let gate = gate(AdminGateMode::Enforce);

    for roles in [json!(["user"]), json!([]), json!(null)] {
        let decision = gate.decide("/jobs/42", Some(&token(roles, 3600)));
        assert_eq!(
            decision,
            AccessDecision::RedirectToForbidden {
                next: "/jobs/42".to_string()
            }
        );
        assert_eq!(decision.reason(), Some(AuthError::InsufficientPrivilege));
        assert!(!decision.clears_cookie());
    }
}

#[test]
fn test_privileged_roles_reach_admin_paths() {
    let gate = gate(AdminGateMode::Enforce);

    for role in ["admin", "super"] {
        let decision = gate.decide("/prompts", Some(&token(json!([role]), 3600)));
        match decision {
            AccessDecision::Allow { session: Some(session) } => {
                assert_eq!(session.roles().to_vec(), vec![role.to_string()]);
            }
            other => panic!("expected allow with session, got {other:?}"),
        }
    }
}

#[test]
fn test_non_admin_paths_allow_any_valid_session() {
    let gate = gate(AdminGateMode::Enforce);
    let decision = gate.decide("/user/settings", Some(&token(json!([]), 3600)));

    assert!(matches!(decision, AccessDecision::Allow { session: Some(_) }));
}

#[test]
fn test_log_only_mode_allows_but_still_verifies() {
    let gate = gate(AdminGateMode::LogOnly);

    let user = gate.decide("/jobs", Some(&token(json!(["user"]), 3600)));
    assert!(matches!(user, AccessDecision::Allow { session: Some(_) }));

    // Authentication is unaffected by the admin mode.
    assert_eq!(
        gate.decide("/jobs", None).reason(),
        Some(AuthError::MissingToken)
    );
}

#[test]
fn test_redirect_location_encodes_next() {
    assert_eq!(redirect_location("/login", "/jobs/42"), "/login?next=%2Fjobs%2F42");
    assert_eq!(
        redirect_location("/not-admin", "/prompts"),
        "/not-admin?next=%2Fprompts"
    );
}

#[test]
fn test_admin_gate_mode_parsing() {
    assert_eq!(AdminGateMode::parse("enforce"), Some(AdminGateMode::Enforce));
    assert_eq!(AdminGateMode::parse("LOG-ONLY"), Some(AdminGateMode::LogOnly));
    assert_eq!(AdminGateMode::parse("off"), None);
}
