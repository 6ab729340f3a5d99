//! HTTP gateway layer: axum router, route handlers, and error mapping.
//!
//! Exposes `POST /api/auth/login` (credential exchange) and
//! `POST /api/invoke` (pass-through relay to the agent runtime).

mod error;
pub mod forward;
mod invoke;
mod login;
#[cfg(test)]
mod stub;

pub use error::ApiError;
pub use forward::{ProxyRequest, ProxyResponse, forward};
pub use invoke::relay;

use acgate_auth::Exchanger;
use acgate_config::Config;
use acgate_types::Result;
use axum::{Router, extract::DefaultBodyLimit, routing::post};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Shared application state passed to all route handlers.
pub struct AppState {
    /// Server configuration, read-only after start.
    pub config: Arc<Config>,
    /// Credential exchanger for the configured identity provider.
    pub exchanger: Exchanger,
    /// HTTP client for runtime invocations.
    pub http: reqwest::Client,
}

impl AppState {
    /// Creates a new shared application state wrapped in an `Arc`.
    ///
    /// # Errors
    ///
    /// Returns [`acgate_types::GateError::Config`] if an HTTP client cannot
    /// be built from the `http` section.
    pub fn new(config: Arc<Config>) -> Result<Arc<Self>> {
        let exchanger = Exchanger::from_config(config.identity.clone(), &config.http)?;
        let http = forward::build_client(&config.http)?;
        Ok(Arc::new(Self {
            config,
            exchanger,
            http,
        }))
    }
}

/// Build the full axum router.
///
/// Routes:
/// - POST /api/auth/login
/// - POST /api/invoke (no request body size limit)
pub fn make_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/auth/login", post(login::login))
        .route(
            "/api/invoke",
            post(invoke::invoke).layer(DefaultBodyLimit::disable()),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
