//! Agent identity, settings, and state types.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Immutable identity of an agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentProfile {
    /// Display name; also the source/target of the agent's messages
    pub name: String,

    /// What the agent does (e.g., "navigator")
    pub role: String,

    /// Personality string forwarded to the completion service
    pub personality: String,
}

impl AgentProfile {
    pub fn new(
        name: impl Into<String>,
        role: impl Into<String>,
        personality: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            role: role.into(),
            personality: personality.into(),
        }
    }
}

/// Runtime knobs for an agent's message pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSettings {
    /// Upper bound on a single completion call
    #[serde(default = "default_completion_timeout_ms")]
    pub completion_timeout_ms: u64,

    /// How many recent messages are sent as context
    #[serde(default = "default_recent_context_window")]
    pub recent_context_window: usize,

    /// Maximum short-term messages kept (None = unbounded)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_term_capacity: Option<usize>,

    /// Confidence gained per successful exchange
    #[serde(default = "default_confidence_step")]
    pub confidence_step: f64,

    /// Confidence at construction
    #[serde(default = "default_initial_confidence")]
    pub initial_confidence: f64,

    /// Tokens of this many characters or fewer are not learned
    #[serde(default = "default_min_token_len")]
    pub min_token_len: usize,
}

fn default_completion_timeout_ms() -> u64 {
    30_000
}
fn default_recent_context_window() -> usize {
    5
}
fn default_confidence_step() -> f64 {
    0.01
}
fn default_initial_confidence() -> f64 {
    1.0
}
fn default_min_token_len() -> usize {
    3
}

impl AgentSettings {
    pub fn completion_timeout(&self) -> Duration {
        Duration::from_millis(self.completion_timeout_ms)
    }
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            completion_timeout_ms: default_completion_timeout_ms(),
            recent_context_window: default_recent_context_window(),
            short_term_capacity: None,
            confidence_step: default_confidence_step(),
            initial_confidence: default_initial_confidence(),
            min_token_len: default_min_token_len(),
        }
    }
}

/// What the agent is doing right now.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    /// Waiting for work (default)
    #[default]
    Idle,
    /// Running the message pipeline
    Processing,
    /// Updating memory from a completed exchange
    Learning,
}

/// Point-in-time copy of an agent's observable state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSnapshot {
    pub name: String,
    pub role: String,
    pub personality: String,
    pub status: AgentStatus,
    pub available: bool,
    pub initialized: bool,
    pub confidence: f64,
    pub short_term_len: usize,
    pub long_term_len: usize,
}
