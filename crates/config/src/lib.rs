//! Configuration loading and validation for Quanta.
//!
//! Loads configuration from `~/.quanta/config.toml` with environment
//! variable overrides. Validates all settings at load time.

use quanta_core::agent::{AgentProfile, AgentSettings};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// The root configuration structure.
///
/// Maps directly to `~/.quanta/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Completion service endpoint
    #[serde(default)]
    pub completion: CompletionConfig,

    /// Pipeline settings shared by every agent
    #[serde(default)]
    pub agent: AgentSettings,

    /// Agents to construct
    #[serde(default)]
    pub agents: Vec<AgentProfile>,
}

/// Where and how to reach the completion service.
#[derive(Clone, Serialize, Deserialize)]
pub struct CompletionConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_path")]
    pub path: String,

    /// Sent as a bearer token when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Transport-level timeout for the HTTP client
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:3000".into()
}
fn default_path() -> String {
    "/api/quantum/agent/process".into()
}
fn default_http_timeout_secs() -> u64 {
    60
}

impl CompletionConfig {
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            path: default_path(),
            api_key: None,
            http_timeout_secs: default_http_timeout_secs(),
        }
    }
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for CompletionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionConfig")
            .field("base_url", &self.base_url)
            .field("path", &self.path)
            .field("api_key", &redact(&self.api_key))
            .field("http_timeout_secs", &self.http_timeout_secs)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.quanta/config.toml).
    ///
    /// Environment overrides (highest priority):
    /// - `QUANTA_COMPLETION_URL`
    /// - `QUANTA_API_KEY`
    /// - `QUANTA_COMPLETION_TIMEOUT_MS`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup (the process environment in
    /// [`AppConfig::load`]).
    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(url) = lookup("QUANTA_COMPLETION_URL") {
            self.completion.base_url = url;
        }

        if let Some(key) = lookup("QUANTA_API_KEY") {
            self.completion.api_key = Some(key);
        }

        if let Some(raw) = lookup("QUANTA_COMPLETION_TIMEOUT_MS") {
            self.agent.completion_timeout_ms = raw.trim().parse().map_err(|_| {
                ConfigError::ValidationError(format!(
                    "QUANTA_COMPLETION_TIMEOUT_MS must be a whole number of milliseconds, got '{raw}'"
                ))
            })?;
        }

        Ok(())
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".quanta")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        let agent = &self.agent;

        if !(0.0..=1.0).contains(&agent.confidence_step) {
            return Err(ConfigError::ValidationError(
                "agent.confidence_step must be between 0.0 and 1.0".into(),
            ));
        }

        if !(0.0..=1.0).contains(&agent.initial_confidence) {
            return Err(ConfigError::ValidationError(
                "agent.initial_confidence must be between 0.0 and 1.0".into(),
            ));
        }

        if agent.recent_context_window == 0 {
            return Err(ConfigError::ValidationError(
                "agent.recent_context_window must be > 0".into(),
            ));
        }

        if agent.short_term_capacity == Some(0) {
            return Err(ConfigError::ValidationError(
                "agent.short_term_capacity must be > 0 when set".into(),
            ));
        }

        if agent.completion_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "agent.completion_timeout_ms must be > 0".into(),
            ));
        }

        if self.completion.base_url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "completion.base_url must not be empty".into(),
            ));
        }

        let mut seen = HashSet::new();
        for profile in &self.agents {
            if !seen.insert(profile.name.as_str()) {
                return Err(ConfigError::ValidationError(format!(
                    "duplicate agent name '{}'",
                    profile.name
                )));
            }
        }

        Ok(())
    }

    /// Look up a configured agent by name.
    pub fn agent_profile(&self, name: &str) -> Option<&AgentProfile> {
        self.agents.iter().find(|p| p.name == name)
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
