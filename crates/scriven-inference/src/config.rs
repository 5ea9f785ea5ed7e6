//! Provider configuration.

use std::time::Duration;

use scriven_core::defaults;

/// Configuration for a generative provider backend.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Provider base URL.
    pub base_url: String,
    /// Generation model name.
    pub model: String,
    /// HTTP request timeout.
    pub request_timeout: Duration,
    /// Default sampling temperature.
    pub temperature: f32,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::PROVIDER_BASE_URL.to_string(),
            model: defaults::GENERATION_MODEL.to_string(),
            request_timeout: Duration::from_secs(defaults::PROVIDER_REQUEST_TIMEOUT_SECS),
            temperature: 0.7,
        }
    }
}

impl ProviderConfig {
    /// Build from environment variables, falling back to defaults:
    /// - `SCRIVEN_PROVIDER_URL`
    /// - `SCRIVEN_GEN_MODEL`
    /// - `SCRIVEN_GEN_TIMEOUT_SECS`
    /// - `SCRIVEN_GEN_TEMPERATURE`
    pub fn from_env() -> Self {
        let base = Self::default();
        Self {
            base_url: std::env::var("SCRIVEN_PROVIDER_URL").unwrap_or(base.base_url),
            model: std::env::var("SCRIVEN_GEN_MODEL").unwrap_or(base.model),
            request_timeout: std::env::var("SCRIVEN_GEN_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_secs)
                .unwrap_or(base.request_timeout),
            temperature: std::env::var("SCRIVEN_GEN_TEMPERATURE")
                .ok()
                .and_then(|v| v.parse::<f32>().ok())
                .unwrap_or(base.temperature),
        }
    }
}
