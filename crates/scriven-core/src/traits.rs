//! Core traits for Scriven abstractions.
//!
//! These traits define the interfaces that concrete implementations
//! must satisfy, enabling pluggable backends and testability. Every
//! collaborator is injected through one of these seams; nothing in the
//! engine reaches for ambient global state.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;
use crate::models::*;

// =============================================================================
// CONTENT STORE
// =============================================================================

/// Raw-bytes storage keyed by opaque [`ContentRef`]s.
///
/// Stores enforce a per-instance quota; each tenant gets its own store
/// instance so quotas never interact across tenants.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Store `data` and return a fresh reference to it.
    ///
    /// Fails with [`crate::Error::QuotaExceeded`] when the write would
    /// push usage past the quota, leaving usage unchanged.
    async fn put(&self, data: &[u8]) -> Result<ContentRef>;

    /// Retrieve the bytes behind `content_ref`.
    async fn get(&self, content_ref: ContentRef) -> Result<Vec<u8>>;

    /// Remove the bytes behind `content_ref`, reclaiming quota.
    ///
    /// Deleting an unknown reference is not an error.
    async fn delete(&self, content_ref: ContentRef) -> Result<()>;

    /// Current usage in bytes.
    async fn usage_bytes(&self) -> Result<i64>;
}

// =============================================================================
// DOCUMENT REPOSITORIES
// =============================================================================

/// Repository for knowledge (source) documents.
#[async_trait]
pub trait DocumentRepository: Send + Sync {
    /// Insert a new document record.
    async fn insert(&self, doc: KnowledgeDocument) -> Result<()>;

    /// Fetch a document by ID.
    async fn fetch(&self, id: Uuid) -> Result<KnowledgeDocument>;

    /// List all documents in insertion order.
    async fn list(&self) -> Result<Vec<KnowledgeDocument>>;

    /// Replace an existing document record.
    async fn update(&self, doc: KnowledgeDocument) -> Result<()>;

    /// Remove a document record. Returns the removed record.
    async fn remove(&self, id: Uuid) -> Result<KnowledgeDocument>;
}

/// Patch applied to a generated document's mutable fields.
///
/// `None` fields are left untouched. A successful patch appends a new
/// version entry.
#[derive(Debug, Clone, Default)]
pub struct UpdatePatch {
    pub title: Option<String>,
    pub sections: Option<Vec<Section>>,
    pub tags: Option<Vec<String>>,
    pub category: Option<String>,
    pub priority: Option<Priority>,
    /// Human-readable description recorded on the version entry.
    pub description: Option<String>,
    /// Opt-in optimistic concurrency: when set, the update fails with
    /// [`crate::Error::ConcurrentModification`] unless the stored
    /// document is still at this version.
    pub expected_version: Option<i32>,
}

/// Repository for generated (output) documents.
///
/// Implementations serialize mutations per document so version numbers
/// stay dense even under concurrent callers.
#[async_trait]
pub trait GeneratedDocumentRepository: Send + Sync {
    /// Insert a new generated document with its initial version entry.
    async fn insert(&self, doc: GeneratedDocument) -> Result<()>;

    /// Fetch a generated document by ID.
    async fn fetch(&self, id: Uuid) -> Result<GeneratedDocument>;

    /// List all generated documents in insertion order.
    async fn list(&self) -> Result<Vec<GeneratedDocument>>;

    /// Apply `patch` under the per-document lock, appending a version.
    async fn update(&self, id: Uuid, patch: UpdatePatch, author: &str)
        -> Result<GeneratedDocument>;

    /// Change lifecycle status atomically: the write happens under the
    /// per-document lock and only if the stored status still equals
    /// `expected`, otherwise [`crate::Error::ConcurrentModification`].
    /// Transition legality is enforced by the lifecycle layer.
    async fn compare_and_set_status(
        &self,
        id: Uuid,
        expected: DocumentStatus,
        next: DocumentStatus,
    ) -> Result<GeneratedDocument>;

    /// Fetch the section content snapshot of a specific version.
    async fn fetch_version_sections(&self, id: Uuid, version: i32) -> Result<Vec<Section>>;

    /// Restore the section content of an earlier version as a new
    /// version (the history itself is never rewritten).
    async fn restore_version(&self, id: Uuid, version: i32, author: &str)
        -> Result<GeneratedDocument>;

    /// Hard-delete a generated document. Returns the removed record.
    async fn remove(&self, id: Uuid) -> Result<GeneratedDocument>;
}

// =============================================================================
// ACTIVITY SINK
// =============================================================================

/// Receiver for lifecycle activity records.
///
/// Emission is fire-and-forget: a failing sink must never fail or delay
/// the operation that produced the record.
#[async_trait]
pub trait ActivitySink: Send + Sync {
    async fn record(&self, activity: ActivityRecord);
}

/// Sink that drops every record. Useful for tests and embedders that
/// do not track activity.
pub struct NoOpActivitySink;

#[async_trait]
impl ActivitySink for NoOpActivitySink {
    async fn record(&self, _activity: ActivityRecord) {}
}

// =============================================================================
// GENERATION BACKEND
// =============================================================================

/// Request sent to a generative provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub model: String,
    pub system: String,
    pub prompt: String,
    /// Sampling temperature; providers clamp to their supported range.
    pub temperature: f32,
}

/// Response from a generative provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationResponse {
    pub text: String,
    pub model: String,
    /// Total wall-clock duration reported by the provider, if any.
    pub duration_ms: Option<u64>,
}

/// Text-generation provider abstraction.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Run one generation call. Transient failures surface as
    /// retryable errors; the synthesis layer applies bounded retry.
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse>;

    /// Whether the provider is reachable.
    async fn health_check(&self) -> bool;

    /// Backend name for logging.
    fn name(&self) -> &str;
}

// =============================================================================
// MEDIA EXTRACTION
// =============================================================================

/// Text extraction from one media kind.
#[async_trait]
pub trait MediaExtractor: Send + Sync {
    /// Media kind this extractor handles.
    fn media_kind(&self) -> MediaKind;

    /// Extract plain text from raw bytes.
    async fn extract_text(&self, data: &[u8]) -> Result<String>;

    /// Whether the extractor's external tooling is available.
    async fn health_check(&self) -> bool;

    /// Extractor name for logging.
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_noop_activity_sink_accepts_records() {
        let sink = NoOpActivitySink;
        sink.record(ActivityRecord::now(
            ActivityKind::Created,
            Uuid::new_v4(),
            "Offer letter",
            "alice",
        ))
        .await;
    }

    #[test]
    fn test_update_patch_default_is_empty() {
        let patch = UpdatePatch::default();
        assert!(patch.title.is_none());
        assert!(patch.sections.is_none());
        assert!(patch.expected_version.is_none());
    }

    #[test]
    fn test_generation_request_serializes() {
        let req = GenerationRequest {
            model: "llama3.2".into(),
            system: "You are a writing assistant.".into(),
            prompt: "Draft an offer".into(),
            temperature: 0.7,
        };
        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains("\"model\":\"llama3.2\""));
    }

    #[test]
    fn test_traits_are_object_safe() {
        fn assert_dyn<T: ?Sized>() {}
        assert_dyn::<dyn ContentStore>();
        assert_dyn::<dyn DocumentRepository>();
        assert_dyn::<dyn GeneratedDocumentRepository>();
        assert_dyn::<dyn ActivitySink>();
        assert_dyn::<dyn GenerationBackend>();
        assert_dyn::<dyn MediaExtractor>();
    }
}
