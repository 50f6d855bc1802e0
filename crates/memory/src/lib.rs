//! Memory model for Quanta agents.
//!
//! Each agent owns one [`MemoryModel`]:
//! - **short-term**: the chronological log of exchanged messages
//! - **long-term**: a deduplicated set of learned tokens, never forgotten
//! - **patterns**: learned pattern data keyed by name, filled by extensions

pub mod model;
pub mod tokens;

pub use model::{LearnedPattern, MemoryModel};
pub use tokens::extract_tokens;
