//! Message domain types.
//!
//! A [`Message`] is the value object that flows through an agent:
//! the caller's text arrives as a `command`, the refined reply is stored as a
//! `response`, and both land in short-term memory in chronological order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Source / target name used for the human side of an exchange.
pub const USER: &str = "user";

/// Whether a message carries a request or a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    /// Text sent to an agent
    Command,
    /// Text produced by an agent
    Response,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Command => "command",
            Self::Response => "response",
        }
    }
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single exchange message. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    id: String,

    /// Serialized as Unix epoch milliseconds.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    timestamp: DateTime<Utc>,

    source: String,
    target: String,
    kind: MessageKind,
    content: String,
}

impl Message {
    /// Create a message with every field given explicitly.
    pub fn new(
        id: impl Into<String>,
        timestamp: DateTime<Utc>,
        source: impl Into<String>,
        target: impl Into<String>,
        kind: MessageKind,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            timestamp,
            source: source.into(),
            target: target.into(),
            kind,
            content: content.into(),
        }
    }

    /// A command from the user to `agent`.
    pub fn command(
        id: impl Into<String>,
        timestamp: DateTime<Utc>,
        agent: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self::new(id, timestamp, USER, agent, MessageKind::Command, content)
    }

    /// A response from `agent` back to the user.
    pub fn response(
        id: impl Into<String>,
        timestamp: DateTime<Utc>,
        agent: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self::new(id, timestamp, agent, USER, MessageKind::Response, content)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn kind(&self) -> MessageKind {
        self.kind
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}
