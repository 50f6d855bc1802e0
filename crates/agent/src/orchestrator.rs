//! The agent orchestrator.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use quanta_core::agent::{AgentProfile, AgentSettings, AgentSnapshot, AgentStatus};
use quanta_core::clock::{Clock, IdGenerator, SystemClock, UuidGenerator};
use quanta_core::completion::{CompletionRequest, CompletionService, ContextEntry};
use quanta_core::error::{AgentError, CompletionError, HandlerError};
use quanta_core::event::{AgentEvent, EventBus, PublishReport};
use quanta_core::message::Message;
use tracing::{debug, info, warn};

use crate::pattern::PatternMatcher;
use crate::state::AgentState;

/// A stateful agent that drafts, refines, remembers, and announces replies.
///
/// All methods take `&self`; share an agent behind an `Arc`. Calls to
/// [`Agent::process`] are serialized in submission order, while
/// `initialize`, `deactivate`, and the accessors never wait for an
/// in-flight message.
pub struct Agent {
    /// Immutable identity
    profile: AgentProfile,

    /// Pipeline settings
    settings: AgentSettings,

    /// Status, gate, confidence, memory. Never held across an await.
    state: Mutex<AgentState>,

    /// Held for the whole pipeline; FIFO, so turns run in submission order.
    pipeline: tokio::sync::Mutex<()>,

    /// Draft generator
    matcher: PatternMatcher,

    /// Refines drafts into replies
    completion: Arc<dyn CompletionService>,

    /// Lifecycle observers
    events: Arc<EventBus>,

    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
}

impl Agent {
    /// Create a deactivated agent with default settings.
    pub fn new(profile: AgentProfile, completion: Arc<dyn CompletionService>) -> Self {
        let settings = AgentSettings::default();
        Self {
            profile,
            state: Mutex::new(AgentState::new(&settings)),
            settings,
            pipeline: tokio::sync::Mutex::new(()),
            matcher: PatternMatcher::default(),
            completion,
            events: Arc::new(EventBus::new()),
            clock: Arc::new(SystemClock),
            ids: Arc::new(UuidGenerator),
        }
    }

    /// Replace the pipeline settings. Resets state, so call it before use.
    pub fn with_settings(mut self, settings: AgentSettings) -> Self {
        self.state = Mutex::new(AgentState::new(&settings));
        self.settings = settings;
        self
    }

    /// Use a custom rule table for drafts.
    pub fn with_matcher(mut self, matcher: PatternMatcher) -> Self {
        self.matcher = matcher;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    /// Publish lifecycle events on an existing bus instead of a private one.
    pub fn with_event_bus(mut self, events: Arc<EventBus>) -> Self {
        self.events = events;
        self
    }

    fn lock_state(&self) -> MutexGuard<'_, AgentState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ── Lifecycle ────────────────────────────────────────────────────────

    /// Open the availability gate. Idempotent; memory is untouched.
    pub fn initialize(&self) {
        self.lock_state().initialize();
        info!(agent = %self.profile.name, role = %self.profile.role, "Agent initialized");
    }

    /// Close the availability gate.
    ///
    /// A message already in flight runs to completion; later calls return
    /// the unavailable reply.
    pub fn deactivate(&self) {
        self.lock_state().deactivate();
        info!(agent = %self.profile.name, "Agent deactivated");
    }

    /// True iff the agent has been initialized and not deactivated since.
    pub fn is_active(&self) -> bool {
        self.lock_state().is_active()
    }

    // ── Message pipeline ─────────────────────────────────────────────────

    /// Process `text` and return the reply, or the fixed error text when the
    /// agent is unavailable or the completion service fails.
    ///
    /// The reply echoes the completion service's output and is therefore
    /// attacker-influenced. It is not sanitized here; escape it before
    /// rendering it as markup.
    pub async fn process_message(&self, text: &str) -> String {
        self.process(text).await.unwrap_or_else(|e| e.reply_text())
    }

    /// Process `text`, reporting failures as an [`AgentError`].
    ///
    /// 1. Unavailable agents return immediately with no side effects
    /// 2. The command is recorded in short-term memory
    /// 3. The pattern matcher drafts a reply
    /// 4. The completion service refines the draft (bounded by the timeout)
    /// 5. On success the reply is recorded, learned from, and published
    pub async fn process(&self, text: &str) -> Result<String, AgentError> {
        if !self.lock_state().is_available() {
            debug!(agent = %self.profile.name, "Rejected message: agent unavailable");
            return Err(self.unavailable());
        }

        let _turn = self.pipeline.lock().await;

        // Deactivation may have happened while this call was queued.
        let (command, context) = {
            let mut state = self.lock_state();
            if !state.is_available() {
                debug!(agent = %self.profile.name, "Rejected queued message: agent unavailable");
                return Err(self.unavailable());
            }

            state.set_status(AgentStatus::Processing);
            let command = Message::command(
                self.ids.next_id(),
                self.clock.now(),
                &self.profile.name,
                text,
            );
            state.memory_mut().append(command.clone());

            let context: Vec<ContextEntry> = state
                .memory()
                .recent_window(self.settings.recent_context_window)
                .into_iter()
                .map(ContextEntry::from)
                .collect();
            (command, context)
        };
        let _idle = IdleOnDrop(&self.state);

        debug!(
            agent = %self.profile.name,
            message_id = %command.id(),
            context = context.len(),
            "Processing message"
        );

        let draft = self.matcher.generate_response(text);
        let request = CompletionRequest {
            agent: self.profile.name.clone(),
            message: draft,
            personality: self.profile.personality.clone(),
            context,
        };

        match self.refine(request).await {
            Ok(reply) => {
                let response = Message::response(
                    self.ids.next_id(),
                    self.clock.now(),
                    &self.profile.name,
                    reply.as_str(),
                );

                {
                    let mut state = self.lock_state();
                    state.memory_mut().append(response.clone());
                    let learned = state.learn(text, &self.settings);
                    debug!(
                        agent = %self.profile.name,
                        learned,
                        confidence = state.confidence(),
                        "Learned from exchange"
                    );
                }

                self.notify(AgentEvent::Response, &response).await;
                Ok(reply)
            }
            Err(e) => {
                warn!(agent = %self.profile.name, error = %e, "Completion failed");
                self.lock_state().set_status(AgentStatus::Idle);

                self.notify(AgentEvent::DeliveryFailed, &command).await;
                Err(AgentError::DeliveryFailure {
                    agent: self.profile.name.clone(),
                    source: e,
                })
            }
        }
    }

    /// Call the completion service, bounded by the configured timeout.
    async fn refine(&self, request: CompletionRequest) -> Result<String, CompletionError> {
        let timeout = self.settings.completion_timeout();
        match tokio::time::timeout(timeout, self.completion.complete(request)).await {
            Ok(result) => result.map(|r| r.response),
            Err(_) => Err(CompletionError::Timeout {
                timeout_ms: self.settings.completion_timeout_ms,
            }),
        }
    }

    /// Publish a lifecycle event. Handler failures are logged by the bus and
    /// never reach the caller.
    async fn notify(&self, event: AgentEvent, message: &Message) {
        let report = self.events.publish_with_report(event, message).await;
        if !report.all_succeeded() {
            debug!(
                agent = %self.profile.name,
                event = %report.event,
                failures = report.failures.len(),
                "Lifecycle observers failed"
            );
        }
    }

    fn unavailable(&self) -> AgentError {
        AgentError::Unavailable {
            agent: self.profile.name.clone(),
        }
    }

    // ── Events ───────────────────────────────────────────────────────────

    /// Register a handler for `event`.
    ///
    /// Handlers for the agent's own lifecycle events run inside the message
    /// pipeline and must not call [`Agent::process`] on the same agent.
    pub fn subscribe<F, Fut>(&self, event: impl Into<String>, handler: F)
    where
        F: Fn(Message) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<(), HandlerError>> + Send + 'static,
    {
        self.events.subscribe(event, handler);
    }

    /// Run every handler for `event`. Returns true iff any were registered.
    pub async fn publish(&self, event: impl AsRef<str>, message: &Message) -> bool {
        self.events.publish(event, message).await
    }

    /// Run every handler for `event` and report which ones failed.
    pub async fn publish_with_report(
        &self,
        event: impl AsRef<str>,
        message: &Message,
    ) -> PublishReport {
        self.events.publish_with_report(event, message).await
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    // ── Accessors ────────────────────────────────────────────────────────

    pub fn name(&self) -> &str {
        &self.profile.name
    }

    pub fn profile(&self) -> &AgentProfile {
        &self.profile
    }

    pub fn settings(&self) -> &AgentSettings {
        &self.settings
    }

    pub fn status(&self) -> AgentStatus {
        self.lock_state().status()
    }

    pub fn confidence(&self) -> f64 {
        self.lock_state().confidence()
    }

    /// The last `limit` short-term messages, oldest first.
    pub fn recent_messages(&self, limit: usize) -> Vec<Message> {
        self.lock_state()
            .memory()
            .recent_window(limit)
            .into_iter()
            .cloned()
            .collect()
    }

    /// All short-term messages, oldest first.
    pub fn short_term(&self) -> Vec<Message> {
        self.lock_state().memory().short_term().cloned().collect()
    }

    /// Learned tokens, sorted.
    pub fn long_term_tokens(&self) -> Vec<String> {
        let mut tokens: Vec<String> = self.lock_state().memory().tokens().iter().cloned().collect();
        tokens.sort();
        tokens
    }

    pub fn snapshot(&self) -> AgentSnapshot {
        let state = self.lock_state();
        AgentSnapshot {
            name: self.profile.name.clone(),
            role: self.profile.role.clone(),
            personality: self.profile.personality.clone(),
            status: state.status(),
            available: state.is_available(),
            initialized: state.is_initialized(),
            confidence: state.confidence(),
            short_term_len: state.memory().short_term_len(),
            long_term_len: state.memory().long_term_len(),
        }
    }
}

/// Returns the agent to idle when a turn ends, including when the caller
/// drops the `process` future or the completion service panics.
struct IdleOnDrop<'a>(&'a Mutex<AgentState>);

impl Drop for IdleOnDrop<'_> {
    fn drop(&mut self) {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .set_status(AgentStatus::Idle);
    }
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("profile", &self.profile)
            .field("completion", &self.completion.name())
            .field("state", &self.snapshot())
            .finish()
    }
}
