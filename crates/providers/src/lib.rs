//! Completion service clients for Quanta.
//!
//! All clients implement the `quanta_core::CompletionService` trait.

pub mod http;

pub use http::HttpCompletionClient;
