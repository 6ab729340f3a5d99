//! Strategy dispatch for credential exchange.

use acgate_config::{HttpConfig, IdentityConfig, IdentityVariant, TokenField};
use acgate_types::{Credentials, GateError, Result, TokenResult};

use crate::{native, oauth2};

/// Pick the preferred token, falling back to the other one.
pub(crate) fn select_token(
    field: TokenField,
    access: Option<String>,
    id: Option<String>,
) -> Option<String> {
    let non_empty = |t: Option<String>| t.filter(|s| !s.is_empty());
    match field {
        TokenField::Access => non_empty(access).or_else(|| non_empty(id)),
        TokenField::Id => non_empty(id).or_else(|| non_empty(access)),
    }
}

/// Build the HTTP client used for identity-provider calls.
///
/// Unlike the invocation client this one carries a whole-request timeout:
/// token responses are small and never streamed.
///
/// # Errors
///
/// Returns [`GateError::Config`] if the client cannot be constructed.
pub fn build_client(http: &HttpConfig) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder();
    if let Some(t) = http.connect_timeout() {
        builder = builder.connect_timeout(t);
    }
    if let Some(t) = http.auth_timeout() {
        builder = builder.timeout(t);
    }
    builder
        .build()
        .map_err(|e| GateError::Config(format!("failed to build identity http client: {e}")))
}

/// Exchange credentials for a bearer token using the configured strategy.
///
/// Configuration is validated before any network call.
///
/// # Errors
///
/// - [`GateError::Config`] if required identity settings are missing.
/// - [`GateError::InvalidCredentials`], [`GateError::UnconfirmedAccount`],
///   [`GateError::ChallengeRequired`] or [`GateError::AuthFailed`] from the
///   native strategy.
/// - [`GateError::ProviderRejected`] from the OAuth2 strategy.
/// - [`GateError::Transport`] if the provider cannot be reached.
pub async fn exchange(
    http: &reqwest::Client,
    credentials: &Credentials,
    identity: &IdentityConfig,
) -> Result<TokenResult> {
    identity.validate()?;
    let result = match identity.variant {
        IdentityVariant::Native => native::authenticate(http, credentials, identity).await,
        IdentityVariant::Oauth2 => oauth2::password_grant(http, credentials, identity).await,
    };
    match &result {
        Ok(token) => tracing::info!(
            variant = ?identity.variant,
            expires_in = token.expires_in,
            "credential exchange succeeded"
        ),
        Err(e) => tracing::info!(variant = ?identity.variant, error = %e, "credential exchange failed"),
    }
    result
}

/// Credential exchanger bound to one identity configuration.
///
/// Holds only read-only configuration and a connection pool, so one
/// instance can serve any number of concurrent exchanges.
#[derive(Clone)]
pub struct Exchanger {
    http: reqwest::Client,
    identity: IdentityConfig,
}

impl Exchanger {
    /// Creates an exchanger around an existing HTTP client.
    #[must_use]
    pub fn new(identity: IdentityConfig, http: reqwest::Client) -> Self {
        Self { http, identity }
    }

    /// Creates an exchanger with a client built from `http` timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::Config`] if the HTTP client cannot be built.
    pub fn from_config(identity: IdentityConfig, http: &HttpConfig) -> Result<Self> {
        Ok(Self::new(identity, build_client(http)?))
    }

    /// The identity settings this exchanger uses.
    #[must_use]
    pub fn identity(&self) -> &IdentityConfig {
        &self.identity
    }

    /// See [`exchange`].
    ///
    /// # Errors
    ///
    /// Same as [`exchange`].
    pub async fn exchange(&self, credentials: &Credentials) -> Result<TokenResult> {
        exchange(&self.http, credentials, &self.identity).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stub;
    use axum::{Json, Router, routing::post};
    use secrecy::SecretString;
    use serde_json::json;

    fn creds() -> Credentials {
        Credentials::new("alice", SecretString::from("pw".to_string())).unwrap()
    }

    #[test]
    fn test_select_token_preference_and_fallback() {
        let a = || Some("a".to_string());
        let i = || Some("i".to_string());
        assert_eq!(select_token(TokenField::Access, a(), i()).as_deref(), Some("a"));
        assert_eq!(select_token(TokenField::Id, a(), i()).as_deref(), Some("i"));
        assert_eq!(select_token(TokenField::Access, None, i()).as_deref(), Some("i"));
        assert_eq!(select_token(TokenField::Id, a(), None).as_deref(), Some("a"));
        assert_eq!(
            select_token(TokenField::Access, Some(String::new()), i()).as_deref(),
            Some("i")
        );
        assert!(select_token(TokenField::Access, None, None).is_none());
    }

    #[test]
    fn test_build_client_with_defaults() {
        assert!(build_client(&HttpConfig::default()).is_ok());
    }

    #[tokio::test]
    async fn test_missing_client_id_fails_before_network() {
        // Port 9 (discard) is never served in tests; a network attempt would
        // surface as a transport error instead.
        let identity = IdentityConfig {
            endpoint: Some("http://127.0.0.1:9/".into()),
            ..IdentityConfig::default()
        };
        let err = exchange(&reqwest::Client::new(), &creds(), &identity)
            .await
            .unwrap_err();
        assert!(matches!(err, GateError::Config(_)));
    }

    #[tokio::test]
    async fn test_oauth2_missing_domain_is_config_error() {
        let identity = IdentityConfig {
            variant: IdentityVariant::Oauth2,
            client_id: Some("abc".into()),
            client_secret: Some(SecretString::from("s".to_string())),
            ..IdentityConfig::default()
        };
        let err = exchange(&reqwest::Client::new(), &creds(), &identity)
            .await
            .unwrap_err();
        assert!(matches!(err, GateError::Config(msg) if msg.contains("domain")));
    }

    #[tokio::test]
    async fn test_unreachable_provider_is_transport_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let identity = IdentityConfig {
            client_id: Some("abc".into()),
            endpoint: Some(format!("http://{addr}/")),
            ..IdentityConfig::default()
        };
        let err = exchange(&reqwest::Client::new(), &creds(), &identity)
            .await
            .unwrap_err();
        assert!(matches!(err, GateError::Transport(_)));
    }

    #[tokio::test]
    async fn test_exchanger_dispatches_by_variant() {
        let router = Router::new()
            .route(
                "/",
                post(|| async { Json(json!({"AuthenticationResult": {"AccessToken": "native"}})) }),
            )
            .route(
                "/oauth2/token",
                post(|| async { Json(json!({"access_token": "oauth2", "expires_in": 60})) }),
            );
        let url = stub::spawn(router).await;
        let http = reqwest::Client::new();

        let native = Exchanger::new(
            IdentityConfig {
                client_id: Some("abc".into()),
                endpoint: Some(format!("{url}/")),
                ..IdentityConfig::default()
            },
            http.clone(),
        );
        assert_eq!(native.exchange(&creds()).await.unwrap().access_token, "native");

        let oauth = Exchanger::new(
            IdentityConfig {
                variant: IdentityVariant::Oauth2,
                client_id: Some("abc".into()),
                client_secret: Some(SecretString::from("s".to_string())),
                domain: Some(url.clone()),
                ..IdentityConfig::default()
            },
            http,
        );
        let tok = oauth.exchange(&creds()).await.unwrap();
        assert_eq!(tok.access_token, "oauth2");
        assert_eq!(tok.token_type, "Bearer");
    }
}
