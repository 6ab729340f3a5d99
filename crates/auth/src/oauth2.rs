//! OAuth2 resource-owner password grant against `https://{domain}/oauth2/token`.

use acgate_config::{IdentityConfig, TokenField};
use acgate_types::{Credentials, GateError, Result, TokenResult};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use secrecy::{ExposeSecret as _, SecretString};
use serde_json::Value;

use crate::exchanger::select_token;

/// Build the `Authorization: Basic` value from `base64(client_id:client_secret)`.
#[must_use]
pub fn basic_auth_header(client_id: &str, client_secret: &SecretString) -> String {
    let raw = format!("{client_id}:{}", client_secret.expose_secret());
    format!("Basic {}", STANDARD.encode(raw))
}

/// Form parameters for the password grant.
#[must_use]
pub fn token_form_params(credentials: &Credentials) -> [(&'static str, &str); 3] {
    [
        ("grant_type", "password"),
        ("username", credentials.username()),
        ("password", credentials.password().expose_secret()),
    ]
}

/// Parse a token endpoint success body into a [`TokenResult`].
///
/// # Errors
///
/// Returns [`GateError::NoToken`] if neither `access_token` nor
/// `id_token` is present.
pub fn parse_token_response(json: &Value, field: TokenField) -> Result<TokenResult> {
    let get = |key: &str| json.get(key).and_then(Value::as_str).map(str::to_string);
    let token = select_token(field, get("access_token"), get("id_token"))
        .ok_or(GateError::NoToken)?;
    let expires_in = json.get("expires_in").and_then(Value::as_u64);
    Ok(TokenResult::bearer(token, expires_in))
}

/// Turn a non-success token endpoint response into
/// [`GateError::ProviderRejected`], keeping the provider's fields verbatim.
#[must_use]
pub fn parse_error_response(status: u16, body: &[u8]) -> GateError {
    let json: Value = serde_json::from_slice(body).unwrap_or(Value::Null);
    let error = json
        .get("error")
        .and_then(Value::as_str)
        .map_or_else(
            || {
                let text = String::from_utf8_lossy(body).trim().to_string();
                if text.is_empty() {
                    "unknown_error".to_string()
                } else {
                    text
                }
            },
            str::to_string,
        );
    let description = json
        .get("error_description")
        .and_then(Value::as_str)
        .map(str::to_string);
    GateError::ProviderRejected {
        status,
        error,
        description,
    }
}

/// Exchange credentials at the OAuth2 token endpoint.
///
/// # Errors
///
/// - [`GateError::Config`] if the client secret or domain is missing.
/// - [`GateError::ProviderRejected`] on any non-2xx response.
/// - [`GateError::Transport`] if the endpoint cannot be reached.
pub async fn password_grant(
    http: &reqwest::Client,
    credentials: &Credentials,
    identity: &IdentityConfig,
) -> Result<TokenResult> {
    let client_id = identity.client_id()?;
    let secret = identity.client_secret().ok_or_else(|| {
        GateError::Config("missing identity.client_secret (required by the oauth2 variant)".into())
    })?;
    let url = identity.oauth2_token_url()?;

    let resp = http
        .post(&url)
        .header(reqwest::header::AUTHORIZATION, basic_auth_header(client_id, secret))
        .header(reqwest::header::ACCEPT, "application/json")
        .form(&token_form_params(credentials))
        .send()
        .await?;

    let status = resp.status();
    let bytes = resp.bytes().await?;
    if !status.is_success() {
        let err = parse_error_response(status.as_u16(), &bytes);
        tracing::warn!(status = status.as_u16(), "token endpoint rejected password grant");
        return Err(err);
    }

    let json: Value = serde_json::from_slice(&bytes)?;
    parse_token_response(&json, identity.token_field)
}
