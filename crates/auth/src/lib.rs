//! Credential exchange: username/password in, short-lived bearer token out.
//!
//! Two interchangeable upstream strategies share one contract:
//! - [`native`]: the identity provider's `InitiateAuth` API with
//!   `USER_PASSWORD_AUTH`, optionally signed with a [`secret_hash`].
//! - [`oauth2`]: an OAuth2 token endpoint accepting `grant_type=password`.
//!
//! The strategy is picked by [`acgate_config::IdentityVariant`]; the
//! [`Exchanger`] dispatches. Nothing here retries: a rejected password is
//! reported once, immediately.

pub mod exchanger;
pub mod native;
pub mod oauth2;
pub mod secret_hash;

pub use exchanger::{Exchanger, build_client, exchange};

#[cfg(test)]
mod stub;
