//! Pass-through relay to the agent runtime.
//!
//! The upstream body is never buffered or inspected: [`ProxyResponse::body`]
//! is the live upstream byte stream.

use acgate_config::HttpConfig;
use acgate_types::{ByteStream, GateError, Result};
use bytes::Bytes;
use futures_util::TryStreamExt as _;
use http::{HeaderValue, StatusCode, header};

/// Outbound `Content-Type` when the caller sent none.
pub const DEFAULT_REQUEST_CONTENT_TYPE: &str = "application/json";
/// Relayed `Content-Type` when the runtime sent none.
pub const FALLBACK_RESPONSE_CONTENT_TYPE: &str = "application/octet-stream";
pub const EVENT_STREAM: &str = "text/event-stream";

/// One logical invocation to relay.
#[derive(Debug, Default)]
pub struct ProxyRequest {
    /// Opaque session id; an empty string means "no session header".
    pub session_id: String,
    /// Copied through byte for byte, including non-ASCII values.
    pub content_type: Option<HeaderValue>,
    /// Copied through unchanged and marked sensitive. Never logged.
    pub authorization: Option<HeaderValue>,
    pub body: Bytes,
}

/// Upstream response head plus its unread body.
pub struct ProxyResponse {
    pub status: StatusCode,
    pub status_text: String,
    pub content_type: String,
    pub body: ByteStream,
}

impl ProxyResponse {
    /// Whether the runtime is streaming Server-Sent Events.
    #[must_use]
    pub fn is_event_stream(&self) -> bool {
        self.content_type
            .split(';')
            .next()
            .is_some_and(|m| m.trim().eq_ignore_ascii_case(EVENT_STREAM))
    }
}

impl std::fmt::Debug for ProxyResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyResponse")
            .field("status", &self.status)
            .field("status_text", &self.status_text)
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}

/// Build the HTTP client used for runtime invocations.
///
/// There is no whole-request timeout: streams are unbounded. The read
/// timeout bounds the idle gap between chunks instead.
///
/// # Errors
///
/// Returns [`GateError::Config`] if the client cannot be constructed.
pub fn build_client(http: &HttpConfig) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder();
    if let Some(t) = http.connect_timeout() {
        builder = builder.connect_timeout(t);
    }
    if let Some(t) = http.read_timeout() {
        builder = builder.read_timeout(t);
    }
    builder
        .build()
        .map_err(|e| GateError::Config(format!("failed to build runtime http client: {e}")))
}

/// POST `request` to `target_url` and return the upstream response unread.
///
/// The session header is set only when `session_id` is non-empty. Upstream
/// statuses are not interpreted; a 4xx/5xx comes back as an ordinary
/// [`ProxyResponse`].
///
/// # Errors
///
/// - [`GateError::Validation`] if the session id is not a legal header value.
/// - [`GateError::Transport`] if the runtime cannot be reached.
pub async fn forward(
    http: &reqwest::Client,
    request: ProxyRequest,
    target_url: &str,
    session_header: &str,
) -> Result<ProxyResponse> {
    let content_type = request
        .content_type
        .filter(|ct| !ct.is_empty())
        .unwrap_or_else(|| HeaderValue::from_static(DEFAULT_REQUEST_CONTENT_TYPE));

    let mut builder = http
        .post(target_url)
        .header(header::CONTENT_TYPE, content_type);

    if !request.session_id.is_empty() {
        let value = HeaderValue::from_str(&request.session_id)
            .map_err(|_| GateError::Validation("invalid session id".into()))?;
        builder = builder.header(session_header, value);
    }

    if let Some(mut auth) = request.authorization {
        auth.set_sensitive(true);
        builder = builder.header(header::AUTHORIZATION, auth);
    }

    let body_len = request.body.len();
    let resp = builder.body(request.body).send().await?;

    let status = resp.status();
    let content_type = resp
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .unwrap_or(FALLBACK_RESPONSE_CONTENT_TYPE)
        .to_string();

    tracing::debug!(
        status = status.as_u16(),
        content_type = %content_type,
        session = %request.session_id,
        request_bytes = body_len,
        "runtime responded"
    );

    Ok(ProxyResponse {
        status,
        status_text: status.canonical_reason().unwrap_or_default().to_string(),
        content_type,
        body: Box::pin(resp.bytes_stream().map_err(GateError::from)),
    })
}
