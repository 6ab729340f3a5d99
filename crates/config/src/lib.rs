//! Configuration loading for the acgate gateway.
//!
//! Uses figment to layer built-in defaults, an optional YAML file, and the
//! process environment. The result is read once at startup and shared
//! read-only afterwards.

pub mod schema;

pub use schema::{
    Config, HttpConfig, IdentityConfig, IdentityVariant, LogConfig, LogFormat, RuntimeConfig,
    TokenField,
};
