use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use ts_rs::TS;
use utoipa::{IntoParams, ToSchema};

use crate::auth::{Session, is_privileged, role_label};

/// ApiResponse
///
/// The tagged result every JSON body emitted by the gate is wrapped in, the
/// same envelope the console's API uses for login:
///
/// - `Ok(body)` serializes as `{"ok": true, ...body}` with status 200.
/// - `Err { status, error }` serializes as `{"ok": false, "error": "..."}`
///   with the given status.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse<T> {
    Ok(T),
    Err { status: StatusCode, error: String },
}

impl<T> ApiResponse<T> {
    pub fn error(status: StatusCode, error: impl Into<String>) -> Self {
        ApiResponse::Err {
            status,
            error: error.into(),
        }
    }
}

#[derive(Serialize)]
struct OkEnvelope<'a, T> {
    ok: bool,
    #[serde(flatten)]
    body: &'a T,
}

#[derive(Serialize)]
struct ErrEnvelope<'a> {
    ok: bool,
    error: &'a str,
}

impl<T: Serialize> Serialize for ApiResponse<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ApiResponse::Ok(body) => OkEnvelope { ok: true, body }.serialize(serializer),
            ApiResponse::Err { error, .. } => ErrEnvelope {
                ok: false,
                error: error.as_str(),
            }
            .serialize(serializer),
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiResponse::Ok(_) => StatusCode::OK,
            ApiResponse::Err { status, .. } => *status,
        };
        (status, Json(self)).into_response()
    }
}

/// SessionView
///
/// Display-only projection of the verified session, served to the UI so it can
/// render names and role badges. Nothing in the gate reads it back; access
/// decisions are made from the cookie alone.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub user_id: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub roles: Vec<String>,
    pub perms: Vec<String>,
    pub is_privileged: bool,
    /// Badge text, e.g. "Super" or "Admin, Editor".
    pub role_label: String,
    #[ts(type = "string | null")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl From<&Session> for SessionView {
    fn from(session: &Session) -> Self {
        let claims = &session.claims;
        Self {
            user_id: claims.sub.clone(),
            email: claims.email.clone(),
            first_name: claims.first_name.clone(),
            last_name: claims.last_name.clone(),
            roles: claims.roles.clone(),
            perms: claims.perms.clone(),
            is_privileged: is_privileged(&claims.roles),
            role_label: role_label(&claims.roles),
            expires_at: i64::try_from(claims.exp)
                .ok()
                .and_then(|secs| DateTime::from_timestamp(secs, 0)),
        }
    }
}

/// Body of `GET /session`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq)]
#[ts(export)]
pub struct SessionBody {
    pub user: SessionView,
}

/// The `next` query parameter carried by the login and not-admin redirects.
#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct NextParam {
    /// Site-relative path the user was trying to reach.
    pub next: Option<String>,
}
