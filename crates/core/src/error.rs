//! Error types for the Quanta domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error type; [`Error`] wraps them.

use thiserror::Error;

/// The top-level error type for Quanta operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Completion errors ---
    #[error("Completion error: {0}")]
    Completion(#[from] CompletionError),

    // --- Agent errors ---
    #[error("Agent error: {0}")]
    Agent(#[from] AgentError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Why a call to the completion service did not produce a reply.
#[derive(Debug, Clone, Error)]
pub enum CompletionError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Completion request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Malformed completion response: {0}")]
    MalformedResponse(String),

    #[error("Completion timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Completion service not configured: {0}")]
    NotConfigured(String),
}

/// Text returned to callers when the completion step fails.
pub const DELIVERY_FAILURE_REPLY: &str = "Error processing quantum request. Please try again.";

/// The outcome of a message that the agent could not answer.
///
/// `Agent::process` returns this as structured data; `Agent::process_message`
/// folds it into [`AgentError::reply_text`] for callers that only handle text.
#[derive(Debug, Clone, Error)]
pub enum AgentError {
    #[error("Agent '{agent}' is unavailable")]
    Unavailable { agent: String },

    #[error("Agent '{agent}' failed to deliver a reply: {source}")]
    DeliveryFailure {
        agent: String,
        #[source]
        source: CompletionError,
    },
}

impl AgentError {
    /// The fixed reply text for this error kind.
    pub fn reply_text(&self) -> String {
        match self {
            Self::Unavailable { agent } => format!(
                "Error: {agent} is currently deactivated. This agent will be available in future updates."
            ),
            Self::DeliveryFailure { .. } => DELIVERY_FAILURE_REPLY.to_string(),
        }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }
}

/// Error returned by an event handler.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct HandlerError(pub String);

impl HandlerError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

impl From<String> for HandlerError {
    fn from(reason: String) -> Self {
        Self(reason)
    }
}

impl From<&str> for HandlerError {
    fn from(reason: &str) -> Self {
        Self(reason.to_string())
    }
}

/// A handler that returned an error or panicked during `publish`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("handler #{handler_index} for '{event}' failed: {reason}")]
pub struct HandlerFailure {
    pub event: String,
    /// Position of the handler in registration order.
    pub handler_index: usize,
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completion_error_displays_correctly() {
        let err = Error::Completion(CompletionError::ApiError {
            status_code: 502,
            message: "Bad gateway".into(),
        });
        assert!(err.to_string().contains("502"));
        assert!(err.to_string().contains("Bad gateway"));
    }

    #[test]
    fn unavailable_reply_embeds_agent_name() {
        let err = AgentError::Unavailable {
            agent: "Nova".into(),
        };
        assert_eq!(
            err.reply_text(),
            "Error: Nova is currently deactivated. This agent will be available in future updates."
        );
        assert!(err.is_unavailable());
    }

    #[test]
    fn delivery_failure_reply_hides_cause() {
        let err = AgentError::DeliveryFailure {
            agent: "Nova".into(),
            source: CompletionError::Timeout { timeout_ms: 250 },
        };
        assert_eq!(err.reply_text(), DELIVERY_FAILURE_REPLY);
        assert!(err.to_string().contains("250ms"));
    }

    #[test]
    fn handler_failure_names_event_and_index() {
        let failure = HandlerFailure {
            event: "response".into(),
            handler_index: 2,
            reason: "boom".into(),
        };
        assert_eq!(failure.to_string(), "handler #2 for 'response' failed: boom");
    }
}
