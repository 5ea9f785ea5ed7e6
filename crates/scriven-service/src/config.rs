//! Service configuration.

use std::time::Duration;

use scriven_core::defaults;
use scriven_index::TagMatch;
use scriven_inference::RetryPolicy;

/// Tunables for a [`crate::KnowledgeService`] instance.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Per-tenant content-store quota in bytes.
    pub quota_bytes: i64,
    /// Bounded worker pool size for batch ingestion.
    pub max_concurrent_extractions: usize,
    /// Default tag filter combination mode.
    pub tag_match: TagMatch,
    /// Retry policy for extraction and synthesis.
    pub retry: RetryPolicy,
    /// Default deadline for a single extraction.
    pub extraction_deadline: Duration,
    /// Default deadline for a single synthesis call.
    pub synthesis_deadline: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            quota_bytes: defaults::TENANT_QUOTA_BYTES,
            max_concurrent_extractions: defaults::MAX_CONCURRENT_EXTRACTIONS,
            tag_match: TagMatch::Any,
            retry: RetryPolicy::default(),
            extraction_deadline: Duration::from_secs(defaults::EXTRACTION_TIMEOUT_SECS),
            synthesis_deadline: Duration::from_secs(defaults::SYNTHESIS_TIMEOUT_SECS),
        }
    }
}

impl ServiceConfig {
    /// Build from environment variables, falling back to defaults.
    /// Reads a local `.env` file first when present.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let base = Self::default();

        let quota_bytes = std::env::var("SCRIVEN_QUOTA_BYTES")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(base.quota_bytes);

        let max_concurrent_extractions = std::env::var("SCRIVEN_MAX_CONCURRENT_EXTRACTIONS")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(base.max_concurrent_extractions)
            .max(1);

        let tag_match = match std::env::var("SCRIVEN_TAG_MATCH").as_deref() {
            Ok("all") => TagMatch::All,
            _ => TagMatch::Any,
        };

        let retry = RetryPolicy {
            max_attempts: std::env::var("SCRIVEN_RETRY_MAX_ATTEMPTS")
                .ok()
                .and_then(|v| v.parse::<u32>().ok())
                .unwrap_or(base.retry.max_attempts)
                .max(1),
            base_delay: std::env::var("SCRIVEN_RETRY_BASE_DELAY_MS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_millis)
                .unwrap_or(base.retry.base_delay),
        };

        let extraction_deadline = std::env::var("SCRIVEN_EXTRACTION_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(base.extraction_deadline);

        let synthesis_deadline = std::env::var("SCRIVEN_SYNTHESIS_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(base.synthesis_deadline);

        Self {
            quota_bytes,
            max_concurrent_extractions,
            tag_match,
            retry,
            extraction_deadline,
            synthesis_deadline,
        }
    }

    pub fn with_quota_bytes(mut self, quota_bytes: i64) -> Self {
        self.quota_bytes = quota_bytes;
        self
    }

    pub fn with_max_concurrent_extractions(mut self, max: usize) -> Self {
        self.max_concurrent_extractions = max.max(1);
        self
    }

    pub fn with_tag_match(mut self, tag_match: TagMatch) -> Self {
        self.tag_match = tag_match;
        self
    }
}
