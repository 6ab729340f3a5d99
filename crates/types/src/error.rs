//! Unified error type for the acgate workspace.

use thiserror::Error;

/// Enumerates every failure the credential exchanger and invocation proxy
/// can report.
///
/// Upstream HTTP statuses returned by the agent runtime are *not* errors:
/// the proxy relays them verbatim. Only connection-level failures surface
/// here as [`GateError::Transport`].
#[derive(Debug, Error)]
pub enum GateError {
    /// A required setting is missing or inconsistent. Raised before any
    /// network call is attempted.
    #[error("configuration error: {0}")]
    Config(String),

    /// The caller supplied malformed or incomplete input.
    #[error("validation error: {0}")]
    Validation(String),

    /// The identity provider rejected the username/password pair.
    ///
    /// Wrong passwords and unknown users both map here so callers cannot
    /// probe for account existence.
    #[error("invalid username or password")]
    InvalidCredentials,

    /// The account exists but has not been confirmed.
    #[error("user not confirmed")]
    UnconfirmedAccount,

    /// The provider answered with an authentication challenge instead of
    /// tokens (e.g. `NEW_PASSWORD_REQUIRED`).
    #[error("authentication challenge required: {0}")]
    ChallengeRequired(String),

    /// The provider reported success but the result carried no usable token.
    #[error("no token in response")]
    NoToken,

    /// Any other provider-side authentication failure. The message is kept
    /// for diagnostics only.
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// The OAuth2 token endpoint returned a non-success status; fields are
    /// the provider's own `error` / `error_description`.
    #[error("identity provider rejected request: status={status}, error={error}")]
    ProviderRejected {
        status: u16,
        error: String,
        description: Option<String>,
    },

    /// The upstream could not be reached or the connection broke.
    #[error("transport error: {0}")]
    Transport(String),

    /// JSON serialization or deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[cfg(feature = "reqwest")]
impl From<reqwest::Error> for GateError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport(e.to_string())
    }
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, GateError>;
