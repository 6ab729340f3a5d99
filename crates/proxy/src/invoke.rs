//! `POST /api/invoke`: relay one invocation to the agent runtime.

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{HeaderMap, HeaderValue, header},
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::{
    AppState,
    error::ApiError,
    forward::{FALLBACK_RESPONSE_CONTENT_TYPE, ProxyRequest, ProxyResponse, forward},
};

/// Handles `POST /api/invoke`.
///
/// Status and body come from the runtime unchanged, including 4xx/5xx. Only
/// a failure to reach the runtime produces a gateway error (502).
pub async fn invoke(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let runtime = &state.config.runtime;
    let authorization = headers.get(header::AUTHORIZATION).cloned().map(|mut v| {
        v.set_sensitive(true);
        v
    });

    let request = ProxyRequest {
        session_id: headers
            .get(&runtime.session_header)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string(),
        content_type: headers.get(header::CONTENT_TYPE).cloned(),
        authorization,
        body,
    };
    let session = request.session_id.clone();

    let upstream = forward(&state.http, request, &runtime.url, &runtime.session_header).await?;
    tracing::info!(
        session = %session,
        status = upstream.status.as_u16(),
        streaming = upstream.is_event_stream(),
        "relaying runtime response"
    );
    Ok(relay(upstream))
}

/// Turn an upstream response into the outbound one without reading the body.
///
/// Dropping the returned response (e.g. on client disconnect) drops the
/// upstream stream and closes that connection.
pub fn relay(upstream: ProxyResponse) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(&upstream.content_type)
            .unwrap_or_else(|_| HeaderValue::from_static(FALLBACK_RESPONSE_CONTENT_TYPE)),
    );
    if upstream.is_event_stream() {
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        headers.insert("x-accel-buffering", HeaderValue::from_static("no"));
    }
    (upstream.status, headers, Body::from_stream(upstream.body)).into_response()
}
