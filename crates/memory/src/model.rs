//! The per-agent memory model.

use chrono::{DateTime, Utc};
use quanta_core::message::Message;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::debug;

use crate::tokens::extract_tokens;

/// Data recorded for a learned pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearnedPattern {
    /// Reply template associated with the pattern
    pub response: String,

    /// How many times the pattern has been observed
    pub hits: u64,

    /// When the pattern was last observed
    pub last_seen: DateTime<Utc>,
}

/// Conversation history and derived knowledge for one agent.
///
/// Short-term memory is unbounded unless a capacity is given, in which case
/// the oldest message is evicted once the capacity is exceeded. Long-term
/// memory has no forgetting path.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MemoryModel {
    short_term: VecDeque<Message>,
    long_term: HashSet<String>,
    patterns: HashMap<String, LearnedPattern>,
    #[serde(skip_serializing_if = "Option::is_none")]
    capacity: Option<usize>,
}

impl MemoryModel {
    /// An unbounded memory model.
    pub fn new() -> Self {
        Self::default()
    }

    /// A memory model keeping at most `capacity` short-term messages.
    ///
    /// `None` means unbounded.
    pub fn with_capacity(capacity: Option<usize>) -> Self {
        Self {
            capacity,
            ..Self::default()
        }
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    /// Append a message to short-term memory.
    pub fn append(&mut self, message: Message) {
        self.short_term.push_back(message);

        if let Some(capacity) = self.capacity {
            while self.short_term.len() > capacity {
                if let Some(evicted) = self.short_term.pop_front() {
                    debug!(id = %evicted.id(), capacity, "Evicted oldest short-term message");
                }
            }
        }
    }

    /// The last `limit` messages, oldest first.
    pub fn recent_window(&self, limit: usize) -> Vec<&Message> {
        let skip = self.short_term.len().saturating_sub(limit);
        self.short_term.iter().skip(skip).collect()
    }

    /// All short-term messages, oldest first.
    pub fn short_term(&self) -> impl ExactSizeIterator<Item = &Message> + '_ {
        self.short_term.iter()
    }

    pub fn short_term_len(&self) -> usize {
        self.short_term.len()
    }

    /// Insert a token into long-term memory. Returns whether it was new.
    pub fn learn_token(&mut self, token: impl Into<String>) -> bool {
        self.long_term.insert(token.into())
    }

    /// Learn every token of `input` longer than `min_len` characters.
    /// Returns how many tokens were new.
    pub fn learn_from(&mut self, input: &str, min_len: usize) -> usize {
        extract_tokens(input, min_len)
            .filter(|token| self.long_term.insert(token.clone()))
            .count()
    }

    /// Read-only view of long-term memory.
    pub fn tokens(&self) -> &HashSet<String> {
        &self.long_term
    }

    pub fn long_term_len(&self) -> usize {
        self.long_term.len()
    }

    pub fn knows(&self, token: &str) -> bool {
        self.long_term.contains(token)
    }

    /// Record (or replace) learned data for `key`.
    pub fn record_pattern(&mut self, key: impl Into<String>, pattern: LearnedPattern) {
        self.patterns.insert(key.into(), pattern);
    }

    pub fn pattern(&self, key: &str) -> Option<&LearnedPattern> {
        self.patterns.get(key)
    }

    pub fn patterns(&self) -> &HashMap<String, LearnedPattern> {
        &self.patterns
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn msg(n: i64) -> Message {
        Message::command(
            format!("m-{n}"),
            Utc.timestamp_millis_opt(n).unwrap(),
            "Nova",
            format!("message {n}"),
        )
    }

    #[test]
    fn append_preserves_chronological_order() {
        let mut memory = MemoryModel::new();
        for n in 0..3 {
            memory.append(msg(n));
        }
        let ids: Vec<&str> = memory.short_term().map(Message::id).collect();
        assert_eq!(ids, vec!["m-0", "m-1", "m-2"]);
    }

    #[test]
    fn recent_window_caps_at_limit_oldest_first() {
        let mut memory = MemoryModel::new();
        for n in 0..120 {
            memory.append(msg(n));
        }

        let window = memory.recent_window(5);
        let ids: Vec<&str> = window.iter().map(|m| m.id()).collect();
        assert_eq!(ids, vec!["m-115", "m-116", "m-117", "m-118", "m-119"]);
    }

    #[test]
    fn recent_window_on_short_or_empty_history() {
        let mut memory = MemoryModel::new();
        assert!(memory.recent_window(5).is_empty());

        memory.append(msg(1));
        memory.append(msg(2));
        assert_eq!(memory.recent_window(5).len(), 2);
        assert!(memory.recent_window(0).is_empty());
    }

    #[test]
    fn relearning_a_token_is_idempotent() {
        let mut memory = MemoryModel::new();
        assert!(memory.learn_token("entanglement"));
        for _ in 0..10 {
            assert!(!memory.learn_token("entanglement"));
        }
        assert_eq!(memory.long_term_len(), 1);
        assert!(memory.knows("entanglement"));
    }

    #[test]
    fn learn_from_counts_only_new_tokens() {
        let mut memory = MemoryModel::new();
        assert_eq!(memory.learn_from("Explain entanglement please", 3), 3);
        assert_eq!(memory.learn_from("explain ENTANGLEMENT again", 3), 1);
        assert_eq!(memory.long_term_len(), 4);
    }

    #[test]
    fn capacity_evicts_oldest_messages() {
        let mut memory = MemoryModel::with_capacity(Some(3));
        for n in 0..5 {
            memory.append(msg(n));
        }
        assert_eq!(memory.short_term_len(), 3);
        let ids: Vec<&str> = memory.short_term().map(Message::id).collect();
        assert_eq!(ids, vec!["m-2", "m-3", "m-4"]);
    }

    #[test]
    fn patterns_are_an_explicit_extension_point() {
        let mut memory = MemoryModel::new();
        memory.learn_from("Explain superposition", 3);
        assert!(memory.patterns().is_empty());

        memory.record_pattern(
            "superposition",
            LearnedPattern {
                response: "Both at once.".into(),
                hits: 1,
                last_seen: Utc.timestamp_millis_opt(0).unwrap(),
            },
        );
        assert_eq!(memory.pattern("superposition").map(|p| p.hits), Some(1));
    }

    #[test]
    fn exports_as_json() {
        let mut memory = MemoryModel::new();
        memory.append(msg(7));
        memory.learn_token("qubit");
        let json = serde_json::to_value(&memory).unwrap();
        assert_eq!(json["short_term"][0]["id"], "m-7");
        assert_eq!(json["long_term"][0], "qubit");
        assert!(json.get("capacity").is_none());
    }
}
