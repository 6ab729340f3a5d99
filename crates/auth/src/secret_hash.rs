//! Keyed hash required by the identity provider for confidential clients.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret as _, SecretString};
use sha2::Sha256;

/// Compute `base64(HMAC-SHA256(client_secret, username + client_id))`.
#[must_use]
pub fn secret_hash(username: &str, client_id: &str, client_secret: &SecretString) -> String {
    let mut mac = <Hmac<Sha256>>::new_from_slice(client_secret.expose_secret().as_bytes())
        .expect("HMAC can take key of any size");
    mac.update(username.as_bytes());
    mac.update(client_id.as_bytes());
    STANDARD.encode(mac.finalize().into_bytes())
}
