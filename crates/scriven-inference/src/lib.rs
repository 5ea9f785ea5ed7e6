//! # scriven-inference
//!
//! Generative provider backends and retry plumbing for Scriven.
//!
//! Implements `scriven_core::GenerationBackend` over HTTP for
//! Ollama-compatible providers, a deterministic mock for tests, and the
//! shared bounded-retry/deadline policy used by extraction and
//! synthesis.

pub mod config;
pub mod http;
pub mod mock;
pub mod retry;

pub use config::ProviderConfig;
pub use http::HttpGenerationBackend;
pub use mock::{MockCall, MockGenerationBackend};
pub use retry::{with_deadline, RetryPolicy};
