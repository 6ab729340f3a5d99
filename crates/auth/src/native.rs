//! Native password authentication via the identity provider's
//! `InitiateAuth` API.
//!
//! The call is a JSON document POSTed to the regional endpoint with an
//! `X-Amz-Target` header naming the operation. `USER_PASSWORD_AUTH` needs no
//! request signing; confidential clients add a `SECRET_HASH` parameter.

use acgate_config::{IdentityConfig, TokenField};
use acgate_types::{Credentials, GateError, Result, TokenResult};
use secrecy::{ExposeSecret as _, SecretString};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{exchanger::select_token, secret_hash::secret_hash};

/// Operation header value for `InitiateAuth`.
pub const TARGET: &str = "AWSCognitoIdentityProviderService.InitiateAuth";

/// Content type the provider's JSON protocol expects.
pub const CONTENT_TYPE: &str = "application/x-amz-json-1.1";

/// Password-based auth flow enabled on the app client.
pub const AUTH_FLOW: &str = "USER_PASSWORD_AUTH";

/// Header carrying the exception name on error responses.
const ERROR_TYPE_HEADER: &str = "x-amzn-errortype";

/// Build the `InitiateAuth` request body.
///
/// `SECRET_HASH` is included only when a client secret is configured.
#[must_use]
pub fn build_request(
    credentials: &Credentials,
    client_id: &str,
    client_secret: Option<&SecretString>,
) -> Value {
    let mut params = serde_json::Map::new();
    params.insert("USERNAME".into(), json!(credentials.username()));
    params.insert(
        "PASSWORD".into(),
        json!(credentials.password().expose_secret()),
    );
    if let Some(secret) = client_secret {
        params.insert(
            "SECRET_HASH".into(),
            json!(secret_hash(credentials.username(), client_id, secret)),
        );
    }
    json!({
        "AuthFlow": AUTH_FLOW,
        "ClientId": client_id,
        "AuthParameters": params,
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InitiateAuthResponse {
    authentication_result: Option<AuthenticationResult>,
    challenge_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AuthenticationResult {
    access_token: Option<String>,
    id_token: Option<String>,
    expires_in: Option<u64>,
}

/// Parse a successful `InitiateAuth` response into a [`TokenResult`].
///
/// # Errors
///
/// - [`GateError::ChallengeRequired`] if the provider answered with a
///   challenge instead of tokens.
/// - [`GateError::NoToken`] if the result carries no usable token.
/// - [`GateError::Serialization`] if the body has an unexpected shape.
pub fn parse_response(json: Value, field: TokenField) -> Result<TokenResult> {
    let resp: InitiateAuthResponse = serde_json::from_value(json)?;
    let Some(result) = resp.authentication_result else {
        return Err(GateError::ChallengeRequired(
            resp.challenge_name
                .unwrap_or_else(|| "No tokens returned".to_string()),
        ));
    };
    let token = select_token(field, result.access_token, result.id_token)
        .ok_or(GateError::NoToken)?;
    Ok(TokenResult::bearer(token, result.expires_in))
}

/// Strip the namespace prefix and URL suffix from a provider exception name.
///
/// `"com.amazonaws#NotAuthorizedException"` and
/// `"NotAuthorizedException:http://internal/"` both yield
/// `"NotAuthorizedException"`.
#[must_use]
pub fn exception_name(raw: &str) -> &str {
    let name = raw.rsplit('#').next().unwrap_or(raw);
    name.split(':').next().unwrap_or(name).trim()
}

/// Map a provider exception onto the gateway taxonomy.
///
/// Wrong password and unknown user collapse into one outcome.
#[must_use]
pub fn map_exception(name: &str, message: &str) -> GateError {
    let contains = |needle: &str| name.contains(needle) || message.contains(needle);
    if contains("NotAuthorized") || contains("UserNotFound") {
        GateError::InvalidCredentials
    } else if contains("UserNotConfirmed") {
        GateError::UnconfirmedAccount
    } else if !message.is_empty() {
        GateError::AuthFailed(message.to_string())
    } else if !name.is_empty() {
        GateError::AuthFailed(name.to_string())
    } else {
        GateError::AuthFailed("identity provider returned an error".into())
    }
}

/// Run `InitiateAuth` against the configured endpoint.
///
/// # Errors
///
/// Returns a [`GateError`] per [`map_exception`] / [`parse_response`], or
/// [`GateError::Transport`] if the provider cannot be reached.
pub async fn authenticate(
    http: &reqwest::Client,
    credentials: &Credentials,
    identity: &IdentityConfig,
) -> Result<TokenResult> {
    let client_id = identity.client_id()?;
    let body = build_request(credentials, client_id, identity.client_secret());
    let endpoint = identity.native_endpoint();

    let resp = http
        .post(&endpoint)
        .header(reqwest::header::CONTENT_TYPE, CONTENT_TYPE)
        .header("X-Amz-Target", TARGET)
        .json(&body)
        .send()
        .await?;

    let status = resp.status();
    let header_type = resp
        .headers()
        .get(ERROR_TYPE_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let bytes = resp.bytes().await?;

    if !status.is_success() {
        let json: Value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        let raw_name = json
            .get("__type")
            .and_then(Value::as_str)
            .or(header_type.as_deref())
            .unwrap_or("");
        let message = json
            .get("message")
            .or_else(|| json.get("Message"))
            .and_then(Value::as_str)
            .unwrap_or("");
        let name = exception_name(raw_name);
        tracing::warn!(
            status = status.as_u16(),
            exception = name,
            "identity provider rejected authentication"
        );
        return Err(map_exception(name, message));
    }

    let json: Value = serde_json::from_slice(&bytes)?;
    parse_response(json, identity.token_field)
}
