//! API error type that maps [`GateError`] variants to HTTP responses.
//!
//! Every error body has the shape `{"error": "...", "detail"?: "..."}`.

use acgate_types::GateError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// Wrapper around [`GateError`] that implements [`IntoResponse`].
#[derive(Debug)]
pub struct ApiError(pub GateError);

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
}

impl ApiError {
    /// Returns `(status, error, detail)` for the wrapped error.
    fn classify(&self) -> (StatusCode, String, Option<String>) {
        match &self.0 {
            GateError::Config(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Server misconfigured".into(),
                Some(msg.clone()),
            ),
            GateError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone(), None),
            GateError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "Invalid username or password".into(),
                None,
            ),
            GateError::UnconfirmedAccount => {
                (StatusCode::FORBIDDEN, "User not confirmed".into(), None)
            }
            GateError::ChallengeRequired(name) => (
                StatusCode::UNAUTHORIZED,
                "Authentication failed".into(),
                Some(name.clone()),
            ),
            GateError::NoToken => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "No token in response".into(),
                None,
            ),
            GateError::AuthFailed(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Authentication failed".into(),
                Some(msg.clone()),
            ),
            GateError::ProviderRejected {
                status,
                error,
                description,
            } => (
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY),
                error.clone(),
                description.clone(),
            ),
            GateError::Transport(msg) => (
                StatusCode::BAD_GATEWAY,
                "Upstream unreachable".into(),
                Some(msg.clone()),
            ),
            GateError::Serialization(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal error".into(),
                Some(e.to_string()),
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, detail) = self.classify();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self.0, "request failed");
        }
        (status, Json(ErrorBody { error, detail })).into_response()
    }
}

impl From<GateError> for ApiError {
    fn from(e: GateError) -> Self {
        Self(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt as _;

    async fn extract_error_body(err: ApiError) -> (StatusCode, serde_json::Value) {
        let resp = err.into_response();
        let status = resp.status();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        (status, body)
    }

    #[tokio::test]
    async fn test_config_error() {
        let (status, body) =
            extract_error_body(ApiError(GateError::Config("missing identity.client_id".into())))
                .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Server misconfigured");
        assert_eq!(body["detail"], "missing identity.client_id");
    }

    #[tokio::test]
    async fn test_validation_error_has_no_detail() {
        let (status, body) =
            extract_error_body(ApiError(GateError::Validation("Invalid JSON body".into()))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid JSON body");
        assert!(body.get("detail").is_none());
    }

    #[tokio::test]
    async fn test_invalid_credentials() {
        let (status, body) = extract_error_body(ApiError(GateError::InvalidCredentials)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Invalid username or password");
    }

    #[tokio::test]
    async fn test_unconfirmed_account() {
        let (status, body) = extract_error_body(ApiError(GateError::UnconfirmedAccount)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "User not confirmed");
    }

    #[tokio::test]
    async fn test_challenge_required() {
        let (status, body) = extract_error_body(ApiError(GateError::ChallengeRequired(
            "NEW_PASSWORD_REQUIRED".into(),
        )))
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Authentication failed");
        assert_eq!(body["detail"], "NEW_PASSWORD_REQUIRED");
    }

    #[tokio::test]
    async fn test_auth_failed_keeps_message_as_detail() {
        let (status, body) =
            extract_error_body(ApiError(GateError::AuthFailed("Rate exceeded".into()))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Authentication failed");
        assert_eq!(body["detail"], "Rate exceeded");
    }

    #[tokio::test]
    async fn test_no_token_in_response() {
        let (status, body) = extract_error_body(ApiError(GateError::NoToken)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "No token in response");
        assert!(body.get("detail").is_none());
    }

    #[tokio::test]
    async fn test_provider_message_matching_no_token_text_stays_auth_failed() {
        let (status, body) =
            extract_error_body(ApiError(GateError::AuthFailed("No token in response".into())))
                .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Authentication failed");
        assert_eq!(body["detail"], "No token in response");
    }

    #[tokio::test]
    async fn test_provider_rejected_uses_provider_status() {
        let (status, body) = extract_error_body(ApiError(GateError::ProviderRejected {
            status: 400,
            error: "invalid_grant".into(),
            description: Some("Bad credentials".into()),
        }))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid_grant");
        assert_eq!(body["detail"], "Bad credentials");
    }

    #[tokio::test]
    async fn test_transport_error() {
        let (status, body) =
            extract_error_body(ApiError(GateError::Transport("connection refused".into()))).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"], "Upstream unreachable");
        assert_eq!(body["detail"], "connection refused");
    }
}
