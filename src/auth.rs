use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, StatusCode, header, request::Parts},
    response::{IntoResponse, Response},
};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, errors::ErrorKind};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::models::ApiResponse;

/// Name of the cookie carrying the signed session token.
pub const SESSION_COOKIE: &str = "token";

/// Roles that unlock the admin-only areas.
pub const PRIVILEGED_ROLES: &[&str] = &["admin", "super"];

/// AuthError
///
/// Every way a request can fail the access gate. Only `InsufficientPrivilege`
/// is ever distinguished for the user; the gate collapses the other three into
/// the same login redirect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("no session token presented")]
    MissingToken,
    #[error("session token failed verification")]
    InvalidToken,
    #[error("session token has expired")]
    ExpiredToken,
    #[error("admin access required")]
    InsufficientPrivilege,
}

impl AuthError {
    /// True when the presented cookie is dead and should be cleared.
    pub fn invalidates_cookie(self) -> bool {
        matches!(self, AuthError::InvalidToken | AuthError::ExpiredToken)
    }

    pub fn status(self) -> StatusCode {
        match self {
            AuthError::InsufficientPrivilege => StatusCode::FORBIDDEN,
            _ => StatusCode::UNAUTHORIZED,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        ApiResponse::<()>::error(self.status(), self.to_string()).into_response()
    }
}

/// SessionClaims
///
/// The claim set the gate reads out of a verified token. The issuer may put
/// more in there; unknown claims are ignored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionClaims {
    /// Expiration time (seconds since the epoch). Validated by the verifier.
    pub exp: u64,
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, rename = "firstName")]
    pub first_name: Option<String>,
    #[serde(default, rename = "lastName")]
    pub last_name: Option<String>,
    /// Role labels. Absent or malformed claims decode as no roles.
    #[serde(default, deserialize_with = "lenient_strings")]
    pub roles: Vec<String>,
    /// Fine-grained permissions, `*` meaning all of them.
    #[serde(default, deserialize_with = "lenient_strings")]
    pub perms: Vec<String>,
}

/// Accepts any JSON value and keeps only the string members of an array.
fn lenient_strings<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    })
}

/// TokenVerifier
///
/// Checks the HMAC signature and expiry of session tokens issued by the API
/// backend. Built once at startup from the shared secret and read-only after.
#[derive(Clone)]
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];
        validation.validate_exp = true;
        // A token is dead from its `exp` second on, not one second after.
        validation.reject_tokens_expiring_in_less_than = 1;
        validation.validate_nbf = true;
        validation.leeway = 0;
        // Audience is issuer-defined and not part of the gate's contract.
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// verify
    ///
    /// Returns the decoded claims, `ExpiredToken` for a well-signed token at or
    /// past its `exp`, and `InvalidToken` for every other failure (including a
    /// `nbf` still in the future).
    pub fn verify(&self, token: &str) -> Result<SessionClaims, AuthError> {
        match decode::<SessionClaims>(token, &self.key, &self.validation) {
            Ok(data) => Ok(data.claims),
            Err(e) => match e.kind() {
                ErrorKind::ExpiredSignature => Err(AuthError::ExpiredToken),
                _ => Err(AuthError::InvalidToken),
            },
        }
    }
}

/// Reads the session token from the request's `Cookie` headers. An empty
/// value is treated the same as no cookie.
pub fn session_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
}

/// `Set-Cookie` value that makes the browser drop its session token site-wide.
pub const CLEARED_SESSION_COOKIE: &str = "token=; Path=/; Max-Age=0";

pub fn is_privileged<S: AsRef<str>>(roles: &[S]) -> bool {
    roles
        .iter()
        .any(|role| PRIVILEGED_ROLES.contains(&role.as_ref()))
}

pub fn has_perm<S: AsRef<str>>(perms: &[S], perm: &str) -> bool {
    perms
        .iter()
        .any(|p| p.as_ref() == "*" || p.as_ref() == perm)
}

/// role_label
///
/// Short badge text for a role set: "Super" wins outright, otherwise the
/// capitalized roles joined by commas, or "User" when there are none.
pub fn role_label<S: AsRef<str>>(roles: &[S]) -> String {
    if roles.iter().any(|r| r.as_ref() == "super") {
        return "Super".to_string();
    }
    if roles.is_empty() {
        return "User".to_string();
    }
    roles
        .iter()
        .map(|r| capitalize(r.as_ref()))
        .collect::<Vec<_>>()
        .join(", ")
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Session
///
/// A verified identity. The access gate inserts it into the request
/// extensions after a successful verification; handlers pull it back out with
/// the extractor below.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub claims: SessionClaims,
}

impl Session {
    pub fn roles(&self) -> &[String] {
        &self.claims.roles
    }

    pub fn is_privileged(&self) -> bool {
        is_privileged(&self.claims.roles)
    }

    pub fn has_perm(&self, perm: &str) -> bool {
        has_perm(&self.claims.perms, perm)
    }
}

/// Rejects with 401 when the gate did not attach a session, which happens for
/// handlers mounted on public or bypassed paths.
impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or(AuthError::MissingToken)
    }
}
