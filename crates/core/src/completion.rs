//! CompletionService trait, the contract for refining a draft into a reply.
//!
//! The agent hands the service its name, personality, the pattern matcher's
//! draft, and a short window of recent messages. The service answers with the
//! final reply text. How that reply is produced is the service's business.
//!
//! Implementations: the HTTP client in `quanta-providers`, scripted mocks in tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CompletionError;
use crate::message::{Message, MessageKind};

/// A request to refine a draft reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// Name of the requesting agent
    pub agent: String,

    /// The pattern matcher's draft
    pub message: String,

    /// The agent's personality string
    pub personality: String,

    /// Recent messages, oldest first
    #[serde(default)]
    pub context: Vec<ContextEntry>,
}

/// One message of conversation context, as sent on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextEntry {
    pub source: String,
    pub target: String,
    pub kind: MessageKind,
    pub content: String,

    /// Unix epoch milliseconds.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

impl From<&Message> for ContextEntry {
    fn from(message: &Message) -> Self {
        Self {
            source: message.source().to_string(),
            target: message.target().to_string(),
            kind: message.kind(),
            content: message.content().to_string(),
            timestamp: message.timestamp(),
        }
    }
}

/// A successful completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub response: String,
}

impl CompletionResponse {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
        }
    }
}

/// The external service that turns a draft plus context into a final reply.
///
/// Any failure (transport, non-success status, unparsable body) is reported as
/// a [`CompletionError`]; the agent treats all of them the same way.
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// A human-readable name for this service (e.g., "http", "scripted").
    fn name(&self) -> &str;

    /// Refine `request.message` into a reply.
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> std::result::Result<CompletionResponse, CompletionError>;
}
