use crate::{
    AppConfig,
    auth::{CLEARED_SESSION_COOKIE, Session},
    gate::LOGIN_PATH,
    models::{ApiResponse, NextParam, SessionBody, SessionView},
    upstream::{ForwardRequest, Origin, UpstreamError, UpstreamState},
};
use axum::{
    extract::{Query, Request, State},
    http::{HeaderValue, StatusCode, header},
    response::{Html, IntoResponse, Redirect, Response},
};

// --- Local Endpoints ---

/// health
///
/// [Bypassed Route] Liveness probe for load balancers. Never touches the gate.
#[utoipa::path(
    get,
    path = "/healthz",
    responses((status = 200, description = "Gate is up", body = String))
)]
pub async fn health() -> &'static str {
    "ok"
}

/// get_session
///
/// [Authenticated Route] Returns the display projection of the verified
/// session. The UI may cache this for names and badges; it is never consulted
/// for access decisions.
#[utoipa::path(
    get,
    path = "/session",
    responses(
        (status = 200, description = "Current session", body = SessionBody),
        (status = 401, description = "No verified session")
    )
)]
pub async fn get_session(session: Session) -> ApiResponse<SessionBody> {
    ApiResponse::Ok(SessionBody {
        user: SessionView::from(&session),
    })
}

/// logout
///
/// [Authenticated Route] Drops the session cookie and sends the browser to the
/// login page.
#[utoipa::path(
    post,
    path = "/logout",
    responses((status = 303, description = "Cookie cleared, redirect to /login"))
)]
pub async fn logout() -> Response {
    let mut response = Redirect::to(LOGIN_PATH).into_response();
    response.headers_mut().append(
        header::SET_COOKIE,
        HeaderValue::from_static(CLEARED_SESSION_COOKIE),
    );
    response
}

/// not_admin
///
/// [Authenticated Route] Explains that the requested area needs an admin role
/// and links back to where the user came from (or `/`).
#[utoipa::path(
    get,
    path = "/not-admin",
    params(NextParam),
    responses((status = 200, description = "Admin access required page", body = String))
)]
pub async fn not_admin(Query(params): Query<NextParam>) -> Html<String> {
    let back = safe_next(params.next.as_deref());

    Html(format!(
        r#"<!doctype html>
<html lang="en">
<head><meta charset="utf-8"><title>Admin access required</title></head>
<body>
<div style="max-width: 520px; margin: 60px auto; padding: 24px">
<h1 style="font-size: 28px; font-weight: 800; margin-bottom: 8px">Admin access required</h1>
<p style="color: #666; margin-bottom: 18px">You need to be an admin to view this page.</p>
<a href="{href}" style="color: #2563eb; text-decoration: underline">Go back</a>
</div>
</body>
</html>
"#,
        href = escape_html(back)
    ))
}

/// Only site-relative destinations are linked back to; anything else
/// (absolute URLs, `//host`, `javascript:`) falls back to `/`.
pub fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') => {
            path
        }
        _ => "/",
    }
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

// --- Proxy Handlers ---

/// proxy_to_api
///
/// [Gated Route] Relays `/api/*` and `/outputs/*` to the API host, cookies
/// included so the backend sees the same httpOnly token.
pub async fn proxy_to_api(
    State(upstream): State<UpstreamState>,
    State(config): State<AppConfig>,
    request: Request,
) -> Response {
    forward(&upstream, config.max_body_bytes, Origin::Api, request).await
}

/// proxy_to_ui
///
/// [Gated Route] Fallback: every page the gate allowed is rendered upstream.
pub async fn proxy_to_ui(
    State(upstream): State<UpstreamState>,
    State(config): State<AppConfig>,
    request: Request,
) -> Response {
    forward(&upstream, config.max_body_bytes, Origin::Ui, request).await
}

async fn forward(
    upstream: &UpstreamState,
    limit: usize,
    origin: Origin,
    request: Request,
) -> Response {
    let (parts, body) = request.into_parts();

    let body = match axum::body::to_bytes(body, limit).await {
        Ok(body) => body,
        Err(_) => return upstream_failure(UpstreamError::BodyTooLarge { limit }),
    };

    let path_and_query = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| parts.uri.path().to_string());

    let forwarded = ForwardRequest {
        method: parts.method,
        path_and_query,
        headers: parts.headers,
        body,
    };

    match upstream.forward(origin, forwarded).await {
        Ok(response) => response.into_response(),
        Err(e) => upstream_failure(e),
    }
}

fn upstream_failure(error: UpstreamError) -> Response {
    tracing::error!(%error, "proxying failed");
    let status = error.status();
    let message = match status {
        StatusCode::BAD_GATEWAY => "upstream unavailable".to_string(),
        _ => error.to_string(),
    };
    ApiResponse::<()>::error(status, message).into_response()
}
