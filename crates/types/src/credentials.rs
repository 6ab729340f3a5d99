//! Username/password pair submitted for a single exchange.

use secrecy::{ExposeSecret as _, SecretString};

use crate::{GateError, Result};

/// Transient credentials. Never persisted; the password is only exposed
/// when the outbound provider request is built.
#[derive(Debug, Clone)]
pub struct Credentials {
    username: String,
    password: SecretString,
}

impl Credentials {
    /// Validate and build credentials.
    ///
    /// The username is whitespace-trimmed; the password is taken verbatim.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::Validation`] if either value is empty after
    /// trimming the username.
    pub fn new(username: &str, password: SecretString) -> Result<Self> {
        let username = username.trim();
        if username.is_empty() || password.expose_secret().is_empty() {
            return Err(GateError::Validation(
                "username and password are required".into(),
            ));
        }
        Ok(Self {
            username: username.to_string(),
            password,
        })
    }

    /// The trimmed username.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// The password, still wrapped.
    #[must_use]
    pub fn password(&self) -> &SecretString {
        &self.password
    }
}
