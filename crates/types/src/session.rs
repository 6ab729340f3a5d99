//! Session-continuity identifiers.

/// Header the agent runtime uses to associate requests with one conversation.
pub const SESSION_HEADER: &str = "X-Amzn-Bedrock-AgentCore-Runtime-Session-Id";

/// Generate a fresh opaque session identifier.
#[must_use]
pub fn new_session_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
