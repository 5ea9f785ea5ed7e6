//! HTTP generation backend for Ollama-compatible providers.

use std::time::Instant;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use scriven_core::{Error, GenerationBackend, GenerationRequest, GenerationResponse, Result};

use crate::config::ProviderConfig;

#[derive(Serialize)]
struct GenerateBody<'a> {
    model: &'a str,
    system: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateReply {
    response: String,
    #[serde(default)]
    total_duration: Option<u64>,
}

/// Generation backend speaking the Ollama `/api/generate` protocol.
pub struct HttpGenerationBackend {
    client: Client,
    config: ProviderConfig,
}

impl HttpGenerationBackend {
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }

    /// Backend using [`ProviderConfig::from_env`].
    pub fn from_env() -> Result<Self> {
        Self::new(ProviderConfig::from_env())
    }
}

/// Map a non-success provider status to an error.
///
/// Client errors (4xx) mean the request itself was rejected — bad model
/// name, malformed body — and will fail identically on every attempt,
/// so they are non-retryable. Server errors and everything else stay
/// retryable transport errors.
fn classify_provider_error(status: reqwest::StatusCode, detail: &str) -> Error {
    if status.is_client_error() {
        Error::InvalidInput(format!("provider rejected request ({}): {}", status, detail))
    } else {
        Error::Request(format!("provider returned {}: {}", status, detail))
    }
}

#[async_trait]
impl GenerationBackend for HttpGenerationBackend {
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse> {
        let url = format!("{}/api/generate", self.config.base_url);
        let body = GenerateBody {
            model: &request.model,
            system: &request.system,
            prompt: &request.prompt,
            stream: false,
            options: GenerateOptions {
                temperature: request.temperature,
            },
        };

        let started = Instant::now();
        debug!(
            model = %request.model,
            prompt_len = request.prompt.len(),
            "provider: generate"
        );

        let response = self.client.post(&url).json(&body).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            warn!(status = %status, "provider: generate failed");
            return Err(classify_provider_error(status, &text));
        }

        let reply: GenerateReply = response.json().await?;
        debug!(
            response_len = reply.response.len(),
            duration_ms = started.elapsed().as_millis() as u64,
            "provider: generate complete"
        );

        Ok(GenerationResponse {
            text: reply.response,
            model: request.model,
            // Ollama reports nanoseconds.
            duration_ms: reply.total_duration.map(|ns| ns / 1_000_000),
        })
    }

    async fn health_check(&self) -> bool {
        let url = format!("{}/api/tags", self.config.base_url);
        match self.client.get(&url).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                debug!(error = %e, "provider: health check failed");
                false
            }
        }
    }

    fn name(&self) -> &str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_builds_from_config() {
        let backend = HttpGenerationBackend::new(ProviderConfig::default()).unwrap();
        assert_eq!(backend.name(), "http");
    }

    #[test]
    fn test_generate_body_serialization() {
        let body = GenerateBody {
            model: "llama3.2",
            system: "sys",
            prompt: "hello",
            stream: false,
            options: GenerateOptions { temperature: 0.7 },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "llama3.2");
        assert_eq!(json["stream"], false);
        assert!((json["options"]["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_generate_reply_tolerates_missing_duration() {
        let reply: GenerateReply = serde_json::from_str(r#"{"response":"hi"}"#).unwrap();
        assert_eq!(reply.response, "hi");
        assert!(reply.total_duration.is_none());
    }

    #[test]
    fn test_client_errors_are_not_retryable() {
        let err = classify_provider_error(reqwest::StatusCode::NOT_FOUND, "model missing");
        assert!(!err.is_retryable());
        assert!(matches!(err, Error::InvalidInput(_)));

        let err = classify_provider_error(reqwest::StatusCode::BAD_REQUEST, "bad body");
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_server_errors_stay_retryable() {
        let err =
            classify_provider_error(reqwest::StatusCode::INTERNAL_SERVER_ERROR, "overloaded");
        assert!(err.is_retryable());
        assert!(matches!(err, Error::Request(_)));

        let err = classify_provider_error(reqwest::StatusCode::SERVICE_UNAVAILABLE, "busy");
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_health_check_unreachable_is_false() {
        let config = ProviderConfig {
            base_url: "http://127.0.0.1:1".to_string(),
            request_timeout: std::time::Duration::from_millis(200),
            ..ProviderConfig::default()
        };
        let backend = HttpGenerationBackend::new(config).unwrap();
        assert!(!backend.health_check().await);
    }
}
