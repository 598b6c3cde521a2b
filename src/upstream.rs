use async_trait::async_trait;
use axum::{
    body::{Body, Bytes},
    http::{HeaderMap, HeaderName, Method, StatusCode, header},
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Origin
///
/// The two external hosts sitting behind the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// JSON API and generated outputs (`/api/*`, `/outputs/*`).
    Api,
    /// Page renderer (everything else).
    Ui,
}

/// A request as it will be replayed against an upstream origin.
#[derive(Debug, Clone)]
pub struct ForwardRequest {
    pub method: Method,
    /// Path plus query string, exactly as received.
    pub path_and_query: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// The upstream's answer, relayed to the browser as-is. The body streams
/// through without being buffered in the gate.
#[derive(Debug)]
pub struct ForwardResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Body,
}

impl IntoResponse for ForwardResponse {
    fn into_response(self) -> Response {
        (self.status, self.headers, self.body).into_response()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("upstream request failed: {0}")]
    Transport(String),
    #[error("request body exceeds {limit} bytes")]
    BodyTooLarge { limit: usize },
}

impl UpstreamError {
    pub fn status(&self) -> StatusCode {
        match self {
            UpstreamError::Transport(_) => StatusCode::BAD_GATEWAY,
            UpstreamError::BodyTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        }
    }
}

// 1. Upstream Contract
/// Upstream
///
/// Abstracts the hop to the external hosts so handlers can be exercised without
/// a network (see `MockUpstream`).
#[async_trait]
pub trait Upstream: Send + Sync {
    async fn forward(
        &self,
        origin: Origin,
        request: ForwardRequest,
    ) -> Result<ForwardResponse, UpstreamError>;
}

// 2. The Real Implementation
/// HttpUpstream
///
/// reqwest-backed forwarder. Redirects are never followed here: a 3xx from
/// the API (e.g. after login) has to reach the browser together with its
/// `Set-Cookie` headers.
#[derive(Clone)]
pub struct HttpUpstream {
    client: reqwest::Client,
    api_host: String,
    ui_host: String,
}

impl HttpUpstream {
    pub fn new(api_host: &str, ui_host: &str) -> Result<Self, UpstreamError> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| UpstreamError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            api_host: api_host.to_string(),
            ui_host: ui_host.to_string(),
        })
    }

    fn url_for(&self, origin: Origin, path_and_query: &str) -> String {
        let host = match origin {
            Origin::Api => &self.api_host,
            Origin::Ui => &self.ui_host,
        };
        format!("{host}{path_and_query}")
    }
}

#[async_trait]
impl Upstream for HttpUpstream {
    async fn forward(
        &self,
        origin: Origin,
        request: ForwardRequest,
    ) -> Result<ForwardResponse, UpstreamError> {
        let url = self.url_for(origin, &request.path_and_query);
        tracing::debug!(?origin, method = %request.method, %url, "forwarding");

        let response = self
            .client
            .request(request.method, &url)
            .headers(strip_hop_by_hop(request.headers))
            .body(request.body)
            .send()
            .await
            .map_err(|e| UpstreamError::Transport(e.to_string()))?;

        let status = response.status();
        let headers = strip_hop_by_hop(response.headers().clone());
        let body = Body::from_stream(response.bytes_stream());

        Ok(ForwardResponse {
            status,
            headers,
            body,
        })
    }
}

/// Headers that describe a single connection and must not be replayed across
/// the proxy hop. `host` and `content-length` are recomputed by the client.
const HOP_BY_HOP: &[HeaderName] = &[
    header::CONNECTION,
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
    header::HOST,
    header::CONTENT_LENGTH,
];

pub fn strip_hop_by_hop(mut headers: HeaderMap) -> HeaderMap {
    for name in HOP_BY_HOP {
        headers.remove(name);
    }
    headers.remove("keep-alive");
    headers
}

// 3. The Mock Implementation (For Tests)
/// MockUpstream
///
/// Records every forwarded request and answers with a canned response, or a
/// transport failure when built with `new_failing`.
#[derive(Clone, Default)]
pub struct MockUpstream {
    pub should_fail: bool,
    pub status: Option<StatusCode>,
    pub body: Bytes,
    seen: Arc<Mutex<Vec<(Origin, ForwardRequest)>>>,
}

impl MockUpstream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    pub fn with_response(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self {
            status: Some(status),
            body: body.into(),
            ..Self::default()
        }
    }

    /// Everything forwarded so far, oldest first.
    pub async fn seen(&self) -> Vec<(Origin, ForwardRequest)> {
        self.seen.lock().await.clone()
    }
}

#[async_trait]
impl Upstream for MockUpstream {
    async fn forward(
        &self,
        origin: Origin,
        request: ForwardRequest,
    ) -> Result<ForwardResponse, UpstreamError> {
        self.seen.lock().await.push((origin, request));

        if self.should_fail {
            return Err(UpstreamError::Transport(
                "Mock Upstream Error: Simulation requested".to_string(),
            ));
        }

        Ok(ForwardResponse {
            status: self.status.unwrap_or(StatusCode::OK),
            headers: HeaderMap::new(),
            body: Body::from(self.body.clone()),
        })
    }
}

/// UpstreamState
///
/// Shared handle to whichever forwarder the app was built with.
pub type UpstreamState = Arc<dyn Upstream>;
