//! The access gate: decides, once per request, whether the request may reach
//! the rest of the router, and turns a denial into the matching redirect.
//!
//! Session state lives entirely in the signed `token` cookie. Nothing here is
//! mutated after startup, so the gate is shared behind an `Arc` without locks.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{HeaderValue, header},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use crate::{
    auth::{AuthError, CLEARED_SESSION_COOKIE, Session, TokenVerifier, session_token},
    paths::RouteRules,
};

/// Where unauthenticated users are sent.
pub const LOGIN_PATH: &str = "/login";
/// Where authenticated users without a privileged role are sent.
pub const NOT_ADMIN_PATH: &str = "/not-admin";

/// AdminGateMode
///
/// Whether a non-privileged session hitting an admin-only path is actually
/// redirected, or only logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AdminGateMode {
    #[default]
    Enforce,
    LogOnly,
}

impl AdminGateMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "enforce" => Some(AdminGateMode::Enforce),
            "log-only" | "log_only" | "logonly" => Some(AdminGateMode::LogOnly),
            _ => None,
        }
    }
}

/// AccessDecision
///
/// Outcome of evaluating one request. `next` is the original request path,
/// carried so the user can be sent back after logging in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    /// Pass through. `session` is set when a token was verified on the way.
    Allow { session: Option<Session> },
    RedirectToLogin { next: String, reason: AuthError },
    RedirectToForbidden { next: String },
}

impl AccessDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, AccessDecision::Allow { .. })
    }

    pub fn reason(&self) -> Option<AuthError> {
        match self {
            AccessDecision::Allow { .. } => None,
            AccessDecision::RedirectToLogin { reason, .. } => Some(*reason),
            AccessDecision::RedirectToForbidden { .. } => Some(AuthError::InsufficientPrivilege),
        }
    }

    /// True when the response must also drop the presented cookie.
    pub fn clears_cookie(&self) -> bool {
        match self {
            AccessDecision::RedirectToLogin { reason, .. } => reason.invalidates_cookie(),
            _ => false,
        }
    }

    /// into_outcome
    ///
    /// Applies the decision. `Ok` carries the session to hand to the next
    /// handler; `Err` is the finished redirect response (307, `Location` with
    /// the url-encoded `next`, plus the cookie clear when required).
    pub fn into_outcome(self) -> Result<Option<Session>, Response> {
        let clears_cookie = self.clears_cookie();
        let location = match self {
            AccessDecision::Allow { session } => return Ok(session),
            AccessDecision::RedirectToLogin { next, .. } => redirect_location(LOGIN_PATH, &next),
            AccessDecision::RedirectToForbidden { next } => redirect_location(NOT_ADMIN_PATH, &next),
        };

        let mut response = Redirect::temporary(&location).into_response();
        if clears_cookie {
            response.headers_mut().append(
                header::SET_COOKIE,
                HeaderValue::from_static(CLEARED_SESSION_COOKIE),
            );
        }
        Err(response)
    }
}

/// Builds `<target>?next=<encoded path>`.
pub fn redirect_location(target: &str, next: &str) -> String {
    format!("{target}?next={}", urlencoding::encode(next))
}

/// Gate
///
/// Route rules plus token verifier, combined into the per-request decision.
pub struct Gate {
    rules: RouteRules,
    verifier: TokenVerifier,
    admin_mode: AdminGateMode,
}

impl Gate {
    pub fn new(rules: RouteRules, verifier: TokenVerifier, admin_mode: AdminGateMode) -> Self {
        Self {
            rules,
            verifier,
            admin_mode,
        }
    }

    pub fn rules(&self) -> &RouteRules {
        &self.rules
    }

    /// decide
    ///
    /// Order matters: bypassed and public paths are let through before the
    /// token is even looked at, so asset trees stay reachable without a
    /// session even when they sit under an admin prefix.
    pub fn decide(&self, path: &str, token: Option<&str>) -> AccessDecision {
        if self.rules.is_bypassed(path) {
            tracing::trace!(path, "bypassed path");
            return AccessDecision::Allow { session: None };
        }

        if self.rules.is_public_path(path) {
            tracing::debug!(path, "public path, token not inspected");
            return AccessDecision::Allow { session: None };
        }

        let Some(token) = token else {
            tracing::debug!(path, "no session token, redirecting to login");
            return AccessDecision::RedirectToLogin {
                next: path.to_string(),
                reason: AuthError::MissingToken,
            };
        };

        let session = match self.verifier.verify(token) {
            Ok(claims) => Session { claims },
            Err(reason) => {
                tracing::info!(path, %reason, "rejected session token, clearing cookie");
                return AccessDecision::RedirectToLogin {
                    next: path.to_string(),
                    reason,
                };
            }
        };

        if self.rules.is_admin_only_path(path) && !session.is_privileged() {
            match self.admin_mode {
                AdminGateMode::Enforce => {
                    tracing::warn!(
                        path,
                        roles = ?session.roles(),
                        "admin-only path without privileged role, redirecting"
                    );
                    return AccessDecision::RedirectToForbidden {
                        next: path.to_string(),
                    };
                }
                AdminGateMode::LogOnly => {
                    tracing::warn!(
                        path,
                        roles = ?session.roles(),
                        "admin-only path without privileged role, allowed (log-only mode)"
                    );
                }
            }
        }

        AccessDecision::Allow {
            session: Some(session),
        }
    }
}

/// access_gate
///
/// Middleware wrapping the whole router. Allowed requests continue unmodified
/// apart from the verified `Session` added to their extensions.
pub async fn access_gate(
    State(gate): State<Arc<Gate>>,
    mut request: Request,
    next: Next,
) -> Response {
    let decision = gate.decide(request.uri().path(), session_token(request.headers()));

    match decision.into_outcome() {
        Ok(session) => {
            if let Some(session) = session {
                request.extensions_mut().insert(session);
            }
            next.run(request).await
        }
        Err(redirect) => redirect,
    }
}
