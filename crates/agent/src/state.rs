//! Mutable per-agent state: status, availability gate, confidence, memory.

use quanta_core::agent::{AgentSettings, AgentStatus};
use quanta_memory::MemoryModel;

/// Everything about an agent that changes over its lifetime.
///
/// `status` and `available` are independent: the gate decides whether a
/// message is processed at all, the status says what the pipeline is doing.
#[derive(Debug, Clone)]
pub struct AgentState {
    status: AgentStatus,
    available: bool,
    initialized: bool,
    confidence: f64,
    memory: MemoryModel,
}

impl AgentState {
    /// A deactivated, idle agent with empty memory.
    pub fn new(settings: &AgentSettings) -> Self {
        Self {
            status: AgentStatus::Idle,
            available: false,
            initialized: false,
            confidence: settings.initial_confidence.clamp(0.0, 1.0),
            memory: MemoryModel::with_capacity(settings.short_term_capacity),
        }
    }

    pub fn initialize(&mut self) {
        self.initialized = true;
        self.available = true;
        self.status = AgentStatus::Idle;
    }

    pub fn deactivate(&mut self) {
        self.available = false;
        self.status = AgentStatus::Idle;
    }

    pub fn is_available(&self) -> bool {
        self.available
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Initialized and not deactivated since.
    pub fn is_active(&self) -> bool {
        self.initialized && self.available
    }

    pub fn status(&self) -> AgentStatus {
        self.status
    }

    pub(crate) fn set_status(&mut self, status: AgentStatus) {
        self.status = status;
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn memory(&self) -> &MemoryModel {
        &self.memory
    }

    pub(crate) fn memory_mut(&mut self) -> &mut MemoryModel {
        &mut self.memory
    }

    /// Learn from a completed exchange and return how many tokens were new.
    ///
    /// Confidence rises by the configured step and never exceeds 1.0.
    pub(crate) fn learn(&mut self, input: &str, settings: &AgentSettings) -> usize {
        self.status = AgentStatus::Learning;

        let learned = self.memory.learn_from(input, settings.min_token_len);
        self.confidence = (self.confidence + settings.confidence_step.max(0.0)).min(1.0);

        self.status = AgentStatus::Idle;
        learned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(initial_confidence: f64) -> AgentSettings {
        AgentSettings {
            initial_confidence,
            ..AgentSettings::default()
        }
    }

    #[test]
    fn starts_deactivated_and_idle() {
        let state = AgentState::new(&AgentSettings::default());
        assert!(!state.is_available());
        assert!(!state.is_active());
        assert_eq!(state.status(), AgentStatus::Idle);
        assert_eq!(state.memory().short_term_len(), 0);
    }

    #[test]
    fn initialize_is_idempotent() {
        let mut state = AgentState::new(&AgentSettings::default());
        state.initialize();
        state.initialize();
        assert!(state.is_active());
        assert_eq!(state.status(), AgentStatus::Idle);
    }

    #[test]
    fn deactivate_closes_gate_and_resets_status() {
        let mut state = AgentState::new(&AgentSettings::default());
        state.initialize();
        state.set_status(AgentStatus::Processing);
        state.deactivate();
        assert!(!state.is_available());
        assert!(!state.is_active());
        assert!(state.is_initialized());
        assert_eq!(state.status(), AgentStatus::Idle);
    }

    #[test]
    fn confidence_is_clamped_and_non_decreasing() {
        let settings = settings(0.95);
        let mut state = AgentState::new(&settings);
        let mut previous = state.confidence();
        for _ in 0..20 {
            state.learn("entanglement", &settings);
            assert!(state.confidence() >= previous);
            assert!(state.confidence() <= 1.0);
            previous = state.confidence();
        }
        assert_eq!(state.confidence(), 1.0);
    }

    #[test]
    fn initial_confidence_outside_range_is_clamped() {
        assert_eq!(AgentState::new(&settings(3.0)).confidence(), 1.0);
        assert_eq!(AgentState::new(&settings(-1.0)).confidence(), 0.0);
    }

    #[test]
    fn learning_returns_to_idle_and_records_tokens() {
        let settings = AgentSettings::default();
        let mut state = AgentState::new(&settings);
        let learned = state.learn("Explain entanglement please", &settings);
        assert_eq!(learned, 3);
        assert_eq!(state.status(), AgentStatus::Idle);
        assert!(state.memory().knows("entanglement"));
    }
}
