//! Bearer token handed back to the caller after a successful exchange.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Default lifetime reported when the provider omits `expires_in`.
pub const DEFAULT_EXPIRES_IN: u64 = 3600;

/// Result of a credential exchange. The broker keeps no copy.
///
/// Serializes to the login response body:
/// `{ "access_token", "expires_in", "token_type": "Bearer" }`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResult {
    pub access_token: String,
    pub expires_in: u64,
    pub token_type: String,
}

impl TokenResult {
    /// Create a `Bearer` token result.
    pub fn bearer(access_token: impl Into<String>, expires_in: Option<u64>) -> Self {
        Self {
            access_token: access_token.into(),
            expires_in: expires_in.unwrap_or(DEFAULT_EXPIRES_IN),
            token_type: "Bearer".to_string(),
        }
    }

    /// Value for an `Authorization` header.
    #[must_use]
    pub fn authorization_header(&self) -> String {
        format!("Bearer {}", self.access_token)
    }
}

// Tokens must never reach logs.
impl fmt::Debug for TokenResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenResult")
            .field("access_token", &"[REDACTED]")
            .field("expires_in", &self.expires_in)
            .field("token_type", &self.token_type)
            .finish()
    }
}
