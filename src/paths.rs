/// RouteRules
///
/// The static path lists the access gate classifies against. They are fixed at
/// startup (the admin list can be overridden through `AppConfig`) and never
/// mutated while requests are being served.
///
/// Matching is done on the raw request path. No trailing-slash, case or `..`
/// normalization happens here; the router hands over the path as received.
#[derive(Debug, Clone)]
pub struct RouteRules {
    /// Pages reachable without a session (exact match).
    pub public_paths: Vec<String>,
    /// Asset-serving trees reachable without a session (plain prefix match).
    pub public_prefixes: Vec<String>,
    /// Areas that need a privileged role (exact match or proper sub-path).
    pub admin_prefixes: Vec<String>,
    /// Framework internals excluded from the gate entirely (exact match).
    pub bypass_paths: Vec<String>,
    /// Framework internals excluded from the gate entirely (plain prefix match).
    pub bypass_prefixes: Vec<String>,
}

/// Default admin-only areas of the console.
pub const DEFAULT_ADMIN_PREFIXES: &[&str] = &["/jobs", "/prompts"];

impl Default for RouteRules {
    fn default() -> Self {
        Self {
            public_paths: strings(&["/login", "/register"]),
            public_prefixes: strings(&["/outputs", "/uploads"]),
            admin_prefixes: strings(DEFAULT_ADMIN_PREFIXES),
            bypass_paths: strings(&["/favicon.ico", "/healthz"]),
            bypass_prefixes: strings(&["/_next", "/assets"]),
        }
    }
}

/// RouteClass
///
/// Result of classifying one path. The two flags are computed independently:
/// a path can be both public and admin-only (e.g. an admin prefix configured
/// under `/outputs`), in which case public wins in the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteClass {
    pub public: bool,
    pub admin_only: bool,
}

impl RouteRules {
    /// Replaces the admin-only prefix list.
    pub fn with_admin_prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.admin_prefixes = prefixes.into_iter().map(Into::into).collect();
        self
    }

    /// True for build assets, the favicon and the liveness probe. These are
    /// passed through before any classification or token lookup.
    pub fn is_bypassed(&self, path: &str) -> bool {
        self.bypass_paths.iter().any(|p| p == path)
            || self.bypass_prefixes.iter().any(|p| path.starts_with(p.as_str()))
    }

    /// True if the path is exempt from authentication.
    pub fn is_public_path(&self, path: &str) -> bool {
        self.public_paths.iter().any(|p| p == path)
            || self.public_prefixes.iter().any(|p| path.starts_with(p.as_str()))
    }

    /// True if the path is an admin-only prefix or lies underneath one.
    pub fn is_admin_only_path(&self, path: &str) -> bool {
        self.admin_prefixes.iter().any(|prefix| {
            path == prefix
                || path
                    .strip_prefix(prefix.as_str())
                    .is_some_and(|rest| rest.starts_with('/'))
        })
    }

    pub fn classify(&self, path: &str) -> RouteClass {
        RouteClass {
            public: self.is_public_path(path),
            admin_only: self.is_admin_only_path(path),
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
