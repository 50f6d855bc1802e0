//! The Quanta agent: availability gate, message pipeline, and learning.
//!
//! Each message goes through a fixed pipeline:
//!
//! 1. **Gate**: an unavailable agent answers with a fixed error text
//! 2. **Record**: the command is appended to short-term memory
//! 3. **Draft**: the [`PatternMatcher`] produces a templated seed reply
//! 4. **Refine**: the completion service turns the draft into the reply
//! 5. **Learn**: tokens from the input enter long-term memory, confidence rises
//! 6. **Notify**: lifecycle observers on the agent's event bus are invoked
//!
//! Calls are serialized per agent, so replies are recorded in submission order.

pub mod orchestrator;
pub mod pattern;
pub mod state;

#[cfg(test)]
mod test_helpers;

pub use orchestrator::Agent;
pub use pattern::{PatternMatcher, PatternRule};
pub use state::AgentState;
