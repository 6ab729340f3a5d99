//! `POST /api/auth/login`: username/password in, bearer token out.

use acgate_types::{Credentials, GateError, TokenResult};
use axum::{Json, body::Bytes, extract::State};
use secrecy::SecretString;
use serde::Deserialize;
use std::sync::Arc;

use crate::{AppState, error::ApiError};

#[derive(Deserialize)]
struct LoginBody {
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    password: Option<SecretString>,
}

/// Handles `POST /api/auth/login`.
///
/// Configuration is checked before the body is read, so a misconfigured
/// gateway answers 500 regardless of input. Transport failures reaching the
/// identity provider are reported as a generic authentication failure.
pub async fn login(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<TokenResult>, ApiError> {
    state.exchanger.identity().validate()?;

    let parsed: LoginBody = serde_json::from_slice(&body)
        .map_err(|_| GateError::Validation("Invalid JSON body".into()))?;
    let username = parsed.username.unwrap_or_default();
    let password = parsed
        .password
        .unwrap_or_else(|| SecretString::from(String::new()));
    let credentials = Credentials::new(&username, password)?;

    let token = state
        .exchanger
        .exchange(&credentials)
        .await
        .map_err(|e| match e {
            GateError::Transport(msg) => GateError::AuthFailed(msg),
            other => other,
        })?;
    Ok(Json(token))
}
