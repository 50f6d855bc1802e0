//! # Quanta Core
//!
//! Domain types, traits, and error definitions for the Quanta agent runtime.
//! This crate has **no framework dependencies**; it defines the domain model
//! that the memory, provider, and agent crates implement against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator is defined as a trait or capability here:
//! - [`CompletionService`] refines a draft into a final reply
//! - [`Clock`] and [`IdGenerator`] stamp messages, so tests can pin them
//! - [`EventBus`] is a composed pub/sub object the agent owns, not a base type

pub mod error;
pub mod message;
pub mod completion;
pub mod agent;
pub mod clock;
pub mod event;

// Re-export key types at crate root for ergonomics
pub use error::{AgentError, CompletionError, Error, HandlerError, HandlerFailure, Result};
pub use message::{Message, MessageKind};
pub use completion::{CompletionRequest, CompletionResponse, CompletionService, ContextEntry};
pub use agent::{AgentProfile, AgentSettings, AgentSnapshot, AgentStatus};
pub use clock::{Clock, IdGenerator, ManualClock, SequentialIds, SystemClock, UuidGenerator};
pub use event::{AgentEvent, EventBus, PublishReport};
