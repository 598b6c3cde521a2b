use console_gate::paths::{RouteClass, RouteRules};

#[test]
fn test_exact_public_pages() {
    let rules = RouteRules::default();

    assert!(rules.is_public_path("/login"));
    assert!(rules.is_public_path("/register"));
    // Exact match only, no trailing-slash or sub-path leniency.
    assert!(!rules.is_public_path("/login/"));
    assert!(!rules.is_public_path("/login/reset"));
    assert!(!rules.is_public_path("/LOGIN"));
}

#[test]
fn test_asset_prefixes_are_public() {
    let rules = RouteRules::default();

    assert!(rules.is_public_path("/outputs"));
    assert!(rules.is_public_path("/outputs/job1/report.md"));
    assert!(rules.is_public_path("/uploads/abc.png"));
    // Plain string prefix, as the console matches it.
    assert!(rules.is_public_path("/outputsX"));
    assert!(!rules.is_public_path("/output"));
    assert!(!rules.is_public_path("/"));
}

#[test]
fn test_admin_only_prefixes() {
    let rules = RouteRules::default();

    assert!(rules.is_admin_only_path("/jobs"));
    assert!(rules.is_admin_only_path("/jobs/42"));
    assert!(rules.is_admin_only_path("/jobs/42/report"));
    assert!(rules.is_admin_only_path("/prompts"));
    assert!(rules.is_admin_only_path("/prompts/new"));

    // A shared leading string is not a sub-path.
    assert!(!rules.is_admin_only_path("/jobsx"));
    assert!(!rules.is_admin_only_path("/prompts-archive"));
    assert!(!rules.is_admin_only_path("/users"));
    assert!(!rules.is_admin_only_path("/"));
}

#[test]
fn test_public_and_admin_are_independent() {
    let rules = RouteRules::default().with_admin_prefixes(["/outputs/private"]);

    assert_eq!(
        rules.classify("/outputs/private/x"),
        RouteClass {
            public: true,
            admin_only: true
        }
    );
    assert_eq!(
        rules.classify("/settings"),
        RouteClass {
            public: false,
            admin_only: false
        }
    );
}

#[test]
fn test_classification_is_stable() {
    let rules = RouteRules::default();
    for path in ["/jobs/7", "/login", "/outputs/a", "/", "/users/1"] {
        assert_eq!(rules.classify(path), rules.classify(path));
    }
}

#[test]
fn test_bypass_list() {
    let rules = RouteRules::default();

    assert!(rules.is_bypassed("/_next/static/chunk.js"));
    assert!(rules.is_bypassed("/assets/logo.svg"));
    assert!(rules.is_bypassed("/favicon.ico"));
    assert!(rules.is_bypassed("/healthz"));
    assert!(!rules.is_bypassed("/favicon.ico.bak"));
    assert!(!rules.is_bypassed("/jobs"));
}

#[test]
fn test_admin_prefix_override() {
    let rules = RouteRules::default().with_admin_prefixes(vec!["/users".to_string()]);

    assert!(rules.is_admin_only_path("/users/9"));
    assert!(!rules.is_admin_only_path("/jobs"));
}
