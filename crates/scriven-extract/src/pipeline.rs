//! Two-stage extraction pipeline.
//!
//! Stage one turns raw bytes into plain text through the registered
//! extractor for the media kind, under bounded retry and a caller
//! deadline. Stage two derives structured data from that text and is
//! strictly best-effort: its failure never discards stage-one output.

use std::time::Duration;

use tracing::{info, warn};

use scriven_core::{defaults, Error, ExtractedData, MediaKind, Result};
use scriven_inference::{with_deadline, RetryPolicy};

use crate::derive::DataDeriver;
use crate::registry::ExtractorRegistry;

/// Result of running the pipeline over one document.
#[derive(Debug, Clone)]
pub struct ExtractionOutcome {
    /// Plain text from stage one.
    pub text: String,
    /// Structured data from stage two; `None` when stage one produced
    /// no text to derive from.
    pub extracted: Option<ExtractedData>,
}

/// The extraction pipeline.
#[derive(Clone)]
pub struct ExtractionPipeline {
    registry: ExtractorRegistry,
    deriver: DataDeriver,
    retry: RetryPolicy,
    default_deadline: Duration,
}

impl ExtractionPipeline {
    pub fn new(registry: ExtractorRegistry, deriver: DataDeriver) -> Self {
        Self {
            registry,
            deriver,
            retry: RetryPolicy::default(),
            default_deadline: Duration::from_secs(defaults::EXTRACTION_TIMEOUT_SECS),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_default_deadline(mut self, deadline: Duration) -> Self {
        self.default_deadline = deadline;
        self
    }

    /// Stage one: extract plain text under retry and deadline.
    ///
    /// The deadline covers each attempt individually; a timed-out
    /// attempt is abandoned and counts as a retryable failure.
    pub async fn extract_text(
        &self,
        kind: MediaKind,
        data: &[u8],
        deadline: Option<Duration>,
    ) -> Result<String> {
        let extractor = self.registry.get(kind)?;
        let deadline = deadline.unwrap_or(self.default_deadline);

        self.retry
            .run(|attempt| {
                let extractor = extractor.clone();
                async move {
                    if attempt > 1 {
                        warn!(extractor = extractor.name(), attempt, "extraction retry");
                    }
                    with_deadline(deadline, extractor.extract_text(data), || {
                        Error::ExtractionTimeout(format!(
                            "{} extractor exceeded {:?}",
                            extractor.name(),
                            deadline
                        ))
                    })
                    .await
                }
            })
            .await
    }

    /// Stage two: best-effort structured derivation.
    pub async fn derive(&self, name: &str, text: &str) -> Option<ExtractedData> {
        if text.trim().is_empty() {
            return None;
        }
        Some(self.deriver.derive(name, text).await)
    }

    /// Run both stages for one document.
    pub async fn run(
        &self,
        name: &str,
        kind: MediaKind,
        data: &[u8],
        deadline: Option<Duration>,
    ) -> Result<ExtractionOutcome> {
        let text = self.extract_text(kind, data, deadline).await?;
        let extracted = self.derive(name, &text).await;
        info!(
            media_kind = %kind,
            size_bytes = data.len(),
            text_len = text.len(),
            derived = extracted.is_some(),
            "extraction complete"
        );
        Ok(ExtractionOutcome { text, extracted })
    }
}
