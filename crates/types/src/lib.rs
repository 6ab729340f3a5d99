//! Core types shared by every acgate crate.
//!
//! Defines the error taxonomy, the credential and token shapes exchanged with
//! the identity provider, the byte-stream alias used for relayed bodies, and
//! a few protocol constants.

pub mod credentials;
pub mod error;
pub mod session;
pub mod token;

pub use credentials::Credentials;
pub use error::{GateError, Result};
pub use session::{SESSION_HEADER, new_session_id};
pub use token::TokenResult;

use bytes::Bytes;
use futures_core::Stream;
use std::pin::Pin;

/// A pinned, sendable stream of body chunks read from an upstream response.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;
