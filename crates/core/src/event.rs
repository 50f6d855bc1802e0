//! Event bus: per-agent publish/subscribe for lifecycle notifications.
//!
//! Handlers are registered under an event name and invoked with the
//! [`Message`] that triggered the event. `publish` runs every handler for the
//! name concurrently, waits for all of them, and collects failures into a
//! [`PublishReport`] instead of returning early on the first one.

use futures::FutureExt;
use futures::future::{BoxFuture, join_all};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, warn};

use crate::error::{HandlerError, HandlerFailure};
use crate::message::Message;

type Handler =
    Arc<dyn Fn(Message) -> BoxFuture<'static, std::result::Result<(), HandlerError>> + Send + Sync>;

/// Lifecycle events an agent publishes on its own bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentEvent {
    /// A reply was recorded; payload is the response message
    Response,
    /// The completion step failed; payload is the command message
    DeliveryFailed,
}

impl AgentEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Response => "response",
            Self::DeliveryFailed => "delivery_failed",
        }
    }
}

impl AsRef<str> for AgentEvent {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl From<AgentEvent> for String {
    fn from(event: AgentEvent) -> Self {
        event.as_str().to_string()
    }
}

/// What happened during a single `publish`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReport {
    pub event: String,
    /// Number of handlers that were invoked
    pub handlers: usize,
    /// Handlers that returned an error or panicked
    pub failures: Vec<HandlerFailure>,
}

impl PublishReport {
    /// True iff at least one handler was registered for the event.
    pub fn delivered(&self) -> bool {
        self.handlers > 0
    }

    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty()
    }
}

/// A named-event bus with ordered handler lists.
#[derive(Default)]
pub struct EventBus {
    handlers: RwLock<HashMap<String, Vec<Handler>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` under `event`. Handlers for the same event are kept
    /// in registration order.
    pub fn subscribe<F, Fut>(&self, event: impl Into<String>, handler: F)
    where
        F: Fn(Message) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<(), HandlerError>> + Send + 'static,
    {
        let event = event.into();
        let handler: Handler = Arc::new(move |message: Message| handler(message).boxed());

        let mut handlers = self.handlers.write().unwrap_or_else(PoisonError::into_inner);
        let list = handlers.entry(event.clone()).or_default();
        list.push(handler);
        debug!(event = %event, handlers = list.len(), "Handler subscribed");
    }

    /// Invoke every handler for `event`. Returns true iff any were registered.
    pub async fn publish(&self, event: impl AsRef<str>, message: &Message) -> bool {
        self.publish_with_report(event, message).await.delivered()
    }

    /// Invoke every handler for `event` and report per-handler failures.
    ///
    /// Handlers run concurrently in the caller's task. A handler that returns
    /// an error or panics is recorded in the report; the others still run to
    /// completion.
    pub async fn publish_with_report(
        &self,
        event: impl AsRef<str>,
        message: &Message,
    ) -> PublishReport {
        let event = event.as_ref();

        // Clone the list so the lock is not held across handler execution.
        let handlers: Vec<Handler> = self
            .handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(event)
            .cloned()
            .unwrap_or_default();

        if handlers.is_empty() {
            debug!(event = %event, "No handlers registered, nothing to publish");
            return PublishReport {
                event: event.to_string(),
                handlers: 0,
                failures: Vec::new(),
            };
        }

        let runs = handlers.iter().enumerate().map(|(index, handler)| {
            let run = handler(message.clone());
            async move { (index, AssertUnwindSafe(run).catch_unwind().await) }
        });

        let mut failures = Vec::new();
        for (index, outcome) in join_all(runs).await {
            let reason = match outcome {
                Ok(Ok(())) => continue,
                Ok(Err(e)) => e.to_string(),
                Err(panic) => format!("handler panicked: {}", panic_message(&*panic)),
            };
            warn!(event = %event, handler = index, error = %reason, "Event handler failed");
            failures.push(HandlerFailure {
                event: event.to_string(),
                handler_index: index,
                reason,
            });
        }

        debug!(
            event = %event,
            handlers = handlers.len(),
            failures = failures.len(),
            "Event published"
        );

        PublishReport {
            event: event.to_string(),
            handlers: handlers.len(),
            failures,
        }
    }

    /// Number of handlers registered under `event`.
    pub fn handler_count(&self, event: impl AsRef<str>) -> usize {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(event.as_ref())
            .map_or(0, Vec::len)
    }

    /// Names of all events with at least one handler, sorted.
    pub fn event_names(&self) -> Vec<String> {
        let handlers = self.handlers.read().unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<String> = handlers
            .iter()
            .filter(|(_, list)| !list.is_empty())
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let handlers = self.handlers.read().unwrap_or_else(PoisonError::into_inner);
        let counts: HashMap<&str, usize> = handlers
            .iter()
            .map(|(name, list)| (name.as_str(), list.len()))
            .collect();
        f.debug_struct("EventBus").field("handlers", &counts).finish()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn sample() -> Message {
        Message::response("m-1", Utc::now(), "Nova", "Entanglement links particles.")
    }

    #[tokio::test]
    async fn publish_without_handlers_returns_false() {
        let bus = EventBus::new();
        let report = bus.publish_with_report("response", &sample()).await;
        assert!(!report.delivered());
        assert!(report.all_succeeded());
        assert!(!bus.publish("response", &sample()).await);
    }

    #[tokio::test]
    async fn all_handlers_run_before_publish_resolves() {
        let bus = EventBus::new();
        let ran = Arc::new(AtomicUsize::new(0));

        for delay_ms in [30_u64, 0, 10] {
            let ran = Arc::clone(&ran);
            bus.subscribe("response", move |_msg| {
                let ran = Arc::clone(&ran);
                async move {
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                    ran.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            });
        }

        assert!(bus.publish("response", &sample()).await);
        assert_eq!(ran.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn handlers_run_concurrently() {
        let bus = EventBus::new();
        let barrier = Arc::new(tokio::sync::Barrier::new(2));

        // Each handler waits for the other; sequential execution would hang.
        for _ in 0..2 {
            let barrier = Arc::clone(&barrier);
            bus.subscribe("response", move |_msg| {
                let barrier = Arc::clone(&barrier);
                async move {
                    barrier.wait().await;
                    Ok(())
                }
            });
        }

        let published =
            tokio::time::timeout(Duration::from_secs(5), bus.publish("response", &sample())).await;
        assert_eq!(published.ok(), Some(true));
    }

    #[tokio::test]
    async fn failing_handler_does_not_block_others() {
        let bus = EventBus::new();
        let ran = Arc::new(AtomicUsize::new(0));

        bus.subscribe("response", |_msg| async { Err(HandlerError::new("disk full")) });
        bus.subscribe("response", |_msg| async {
            if true {
                panic!("observer crashed");
            }
            Ok(())
        });
        let counter = Arc::clone(&ran);
        bus.subscribe("response", move |_msg| {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });

        let report = bus.publish_with_report("response", &sample()).await;
        assert!(report.delivered());
        assert_eq!(report.handlers, 3);
        assert_eq!(ran.load(Ordering::SeqCst), 1);
        assert_eq!(report.failures.len(), 2);
        assert_eq!(report.failures[0].handler_index, 0);
        assert_eq!(report.failures[0].reason, "disk full");
        assert_eq!(report.failures[1].handler_index, 1);
        assert!(report.failures[1].reason.contains("observer crashed"));
    }

    #[tokio::test]
    async fn handlers_receive_the_published_message() {
        let bus = EventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&seen);
        bus.subscribe(AgentEvent::Response, move |msg: Message| {
            let sink = Arc::clone(&sink);
            async move {
                sink.lock().unwrap().push(msg.content().to_string());
                Ok(())
            }
        });

        assert!(bus.publish(AgentEvent::Response, &sample()).await);
        assert!(!bus.publish(AgentEvent::DeliveryFailed, &sample()).await);
        assert_eq!(*seen.lock().unwrap(), vec!["Entanglement links particles."]);
    }

    #[tokio::test]
    async fn publish_can_run_on_a_spawned_task() {
        let bus = Arc::new(EventBus::new());
        bus.subscribe("response", |_msg| async { Ok(()) });
        bus.subscribe("response", |_msg| async { Err(HandlerError::new("rejected")) });

        let task = {
            let bus = Arc::clone(&bus);
            tokio::spawn(async move { bus.publish_with_report("response", &sample()).await })
        };
        let report = task.await.unwrap();
        assert_eq!(report.handlers, 2);
        assert_eq!(report.failures.len(), 1);
    }

    #[test]
    fn introspection_counts_handlers() {
        let bus = EventBus::new();
        bus.subscribe("b", |_msg| async { Ok(()) });
        bus.subscribe("a", |_msg| async { Ok(()) });
        bus.subscribe("a", |_msg| async { Ok(()) });

        assert_eq!(bus.handler_count("a"), 2);
        assert_eq!(bus.handler_count("missing"), 0);
        assert_eq!(bus.event_names(), vec!["a", "b"]);
    }
}
