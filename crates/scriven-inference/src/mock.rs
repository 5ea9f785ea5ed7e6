//! Mock generation backend for deterministic testing.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let backend = MockGenerationBackend::new()
//!     .with_default_response("Drafted text")
//!     .with_response_for("improve", "Polished text");
//! ```

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use scriven_core::{Error, GenerationBackend, GenerationRequest, GenerationResponse, Result};

#[derive(Debug, Clone)]
struct MockConfig {
    /// Responses keyed by a substring of the prompt.
    mapped_responses: Vec<(String, String)>,
    default_response: String,
    latency: Duration,
    /// Number of leading calls that fail with a retryable error.
    failures_before_success: u32,
    healthy: bool,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            mapped_responses: Vec::new(),
            default_response: "Mock response".to_string(),
            latency: Duration::ZERO,
            failures_before_success: 0,
            healthy: true,
        }
    }
}

/// Recorded call to the mock backend.
#[derive(Debug, Clone)]
pub struct MockCall {
    pub system: String,
    pub prompt: String,
    pub model: String,
}

/// Deterministic [`GenerationBackend`] for tests.
#[derive(Clone)]
pub struct MockGenerationBackend {
    config: Arc<MockConfig>,
    call_log: Arc<Mutex<Vec<MockCall>>>,
    calls_seen: Arc<AtomicU32>,
}

impl MockGenerationBackend {
    pub fn new() -> Self {
        Self {
            config: Arc::new(MockConfig::default()),
            call_log: Arc::new(Mutex::new(Vec::new())),
            calls_seen: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Set the response returned when no mapping matches.
    pub fn with_default_response(mut self, response: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.config).default_response = response.into();
        self
    }

    /// Return `response` for prompts containing `prompt_substring`.
    /// Mappings are checked in registration order.
    pub fn with_response_for(
        mut self,
        prompt_substring: impl Into<String>,
        response: impl Into<String>,
    ) -> Self {
        Arc::make_mut(&mut self.config)
            .mapped_responses
            .push((prompt_substring.into(), response.into()));
        self
    }

    /// Add artificial latency per call.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        Arc::make_mut(&mut self.config).latency = latency;
        self
    }

    /// Fail the first `n` calls with a retryable provider error.
    pub fn with_failures(mut self, n: u32) -> Self {
        Arc::make_mut(&mut self.config).failures_before_success = n;
        self
    }

    /// Mark the backend unhealthy.
    pub fn with_unhealthy(mut self) -> Self {
        Arc::make_mut(&mut self.config).healthy = false;
        self
    }

    /// Get all recorded calls.
    pub fn calls(&self) -> Vec<MockCall> {
        self.call_log
            .lock()
            .map(|log| log.clone())
            .unwrap_or_default()
    }

    /// Total number of generate calls, including failed ones.
    pub fn call_count(&self) -> u32 {
        self.calls_seen.load(Ordering::SeqCst)
    }
}

impl Default for MockGenerationBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GenerationBackend for MockGenerationBackend {
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse> {
        if !self.config.latency.is_zero() {
            tokio::time::sleep(self.config.latency).await;
        }

        let call_number = self.calls_seen.fetch_add(1, Ordering::SeqCst) + 1;
        if let Ok(mut log) = self.call_log.lock() {
            log.push(MockCall {
                system: request.system.clone(),
                prompt: request.prompt.clone(),
                model: request.model.clone(),
            });
        }

        if call_number <= self.config.failures_before_success {
            return Err(Error::Request(format!(
                "mock provider failure {} of {}",
                call_number, self.config.failures_before_success
            )));
        }

        let text = self
            .config
            .mapped_responses
            .iter()
            .find(|(needle, _)| request.prompt.contains(needle.as_str()))
            .map(|(_, response)| response.clone())
            .unwrap_or_else(|| self.config.default_response.clone());

        Ok(GenerationResponse {
            text,
            model: request.model,
            duration_ms: Some(self.config.latency.as_millis() as u64),
        })
    }

    async fn health_check(&self) -> bool {
        self.config.healthy
    }

    fn name(&self) -> &str {
        "mock"
    }
}
