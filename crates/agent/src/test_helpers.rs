//! Shared test helpers for agent tests.

use quanta_core::completion::{CompletionRequest, CompletionResponse, CompletionService};
use quanta_core::error::CompletionError;
use std::sync::Mutex;
use std::time::Duration;

/// A completion service that returns a sequence of scripted outcomes.
///
/// Each call to `complete` returns the next outcome in the queue and records
/// the request. Panics if more calls are made than outcomes provided.
pub struct ScriptedCompletion {
    outcomes: Mutex<Vec<Result<CompletionResponse, CompletionError>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedCompletion {
    pub fn new(outcomes: Vec<Result<CompletionResponse, CompletionError>>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A service that answers every call with the given replies, in order.
    pub fn replies(replies: &[&str]) -> Self {
        Self::new(
            replies
                .iter()
                .map(|r| Ok(CompletionResponse::new(*r)))
                .collect(),
        )
    }

    /// A service whose single call fails with a network error.
    pub fn network_failure() -> Self {
        Self::new(vec![Err(CompletionError::Network(
            "connection refused".into(),
        ))])
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl CompletionService for ScriptedCompletion {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, CompletionError> {
        let mut requests = self.requests.lock().unwrap();
        let mut outcomes = self.outcomes.lock().unwrap();

        if outcomes.is_empty() {
            panic!(
                "ScriptedCompletion: no more outcomes (call #{})",
                requests.len() + 1
            );
        }

        requests.push(request);
        outcomes.remove(0)
    }
}

/// A completion service that sleeps before answering.
pub struct SlowCompletion {
    pub delay: Duration,
    pub reply: String,
}

#[async_trait::async_trait]
impl CompletionService for SlowCompletion {
    fn name(&self) -> &str {
        "slow"
    }

    async fn complete(
        &self,
        _request: CompletionRequest,
    ) -> Result<CompletionResponse, CompletionError> {
        tokio::time::sleep(self.delay).await;
        Ok(CompletionResponse::new(self.reply.clone()))
    }
}
