//! The knowledge service facade.
//!
//! Ties the content store, repositories, index, extraction pipeline,
//! synthesis engine, and lifecycle manager together behind the
//! operations callers integrate against. All collaborators are injected
//! so tenants get fully isolated instances.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinSet;
use tracing::{info, warn};
use uuid::Uuid;

use scriven_core::{
    ActivitySink, ContentStore, DocumentRepository, Error, GeneratedContent,
    GeneratedDocumentRepository, GenerationBackend, KeyInfoAggregate, KnowledgeDocument,
    MediaKind, OrganizationProfile, Result, UpdatePatch,
};
use scriven_extract::{DataDeriver, ExtractionPipeline, ExtractorRegistry};
use scriven_index::InMemoryIndex;
use scriven_synthesis::SynthesisEngine;

use crate::config::ServiceConfig;
use crate::lifecycle::{CreateDocumentRequest, DocumentFilter, LifecycleManager};

/// One file in a batch upload.
#[derive(Debug, Clone)]
pub struct UploadItem {
    pub name: String,
    pub media_kind: MediaKind,
    pub bytes: Vec<u8>,
}

/// Partial-result report for batch ingestion.
#[derive(Debug, Default)]
pub struct UploadReport {
    pub succeeded: Vec<KnowledgeDocument>,
    /// (file name, error message) per failed item.
    pub failed: Vec<(String, String)>,
}

/// Partial-result report for bulk lifecycle operations.
#[derive(Debug, Default)]
pub struct BulkReport {
    pub succeeded: Vec<Uuid>,
    /// (document id, error message) per failed item.
    pub failed: Vec<(Uuid, String)>,
}

/// Facade over one tenant's knowledge base and synthesis engine.
#[derive(Clone)]
pub struct KnowledgeService {
    config: ServiceConfig,
    store: Arc<dyn ContentStore>,
    documents: Arc<dyn DocumentRepository>,
    index: InMemoryIndex,
    pipeline: ExtractionPipeline,
    synthesis: SynthesisEngine,
    lifecycle: LifecycleManager,
    /// Per-document mutation locks for knowledge documents.
    doc_locks: Arc<Mutex<HashMap<Uuid, Arc<Mutex<()>>>>>,
}

impl KnowledgeService {
    /// Wire a service from injected collaborators.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: ServiceConfig,
        store: Arc<dyn ContentStore>,
        documents: Arc<dyn DocumentRepository>,
        generated: Arc<dyn GeneratedDocumentRepository>,
        activity: Arc<dyn ActivitySink>,
        backend: Arc<dyn GenerationBackend>,
        model: impl Into<String>,
    ) -> Self {
        let model = model.into();
        let pipeline = ExtractionPipeline::new(
            ExtractorRegistry::with_defaults(),
            DataDeriver::with_backend(backend.clone(), model.clone()),
        )
        .with_retry_policy(config.retry)
        .with_default_deadline(config.extraction_deadline);

        let synthesis = SynthesisEngine::new(backend, documents.clone(), model)
            .with_retry_policy(config.retry)
            .with_deadline(config.synthesis_deadline);

        Self {
            config,
            store,
            documents,
            index: InMemoryIndex::new(),
            pipeline,
            synthesis,
            lifecycle: LifecycleManager::new(generated, activity),
            doc_locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Replace the extraction pipeline (custom registry or deriver).
    pub fn with_pipeline(mut self, pipeline: ExtractionPipeline) -> Self {
        self.pipeline = pipeline;
        self
    }

    /// Lifecycle operations on generated documents.
    pub fn lifecycle(&self) -> &LifecycleManager {
        &self.lifecycle
    }

    /// Current content-store usage in bytes.
    pub async fn usage_bytes(&self) -> Result<i64> {
        self.store.usage_bytes().await
    }

    async fn lock_for(&self, id: Uuid) -> Arc<Mutex<()>> {
        let mut locks = self.doc_locks.lock().await;
        locks.entry(id).or_default().clone()
    }

    // =========================================================================
    // INGESTION
    // =========================================================================

    /// Upload one document: store bytes, extract synchronously, index.
    ///
    /// The returned record carries extraction status directly: populated
    /// text on success, empty text (`needs_attention`) when extraction
    /// failed terminally. Quota rejection stores nothing.
    pub async fn upload_document(
        &self,
        name: &str,
        media_kind: MediaKind,
        bytes: &[u8],
        principal: &str,
    ) -> Result<KnowledgeDocument> {
        let content_ref = self.store.put(bytes).await?;

        let outcome = match self.pipeline.run(name, media_kind, bytes, None).await {
            Ok(outcome) => Some(outcome),
            Err(Error::UnsupportedMedia(kind)) => {
                // Nothing useful can ever come of these bytes; undo the
                // store write and reject the upload.
                self.store.delete(content_ref).await?;
                return Err(Error::UnsupportedMedia(kind));
            }
            Err(e) => {
                warn!(name, error = %e, "upload: extraction failed terminally, storing for attention");
                None
            }
        };

        let mut doc = KnowledgeDocument::new(
            name,
            media_kind,
            content_ref,
            outcome.as_ref().map(|o| o.text.clone()).unwrap_or_default(),
            bytes.len() as i64,
            principal,
        );
        doc.extracted = outcome.and_then(|o| o.extracted);

        self.documents.insert(doc.clone()).await?;
        self.index.index(&doc).await;
        info!(document_id = %doc.id, media_kind = %media_kind, size_bytes = doc.size_bytes, "upload complete");
        Ok(doc)
    }

    /// Upload a batch of files, extracting concurrently up to the
    /// configured worker-pool bound. One item's failure never aborts
    /// the others.
    pub async fn upload_documents(&self, items: Vec<UploadItem>, principal: &str) -> UploadReport {
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_extractions));
        let mut join_set = JoinSet::new();

        for item in items {
            let service = self.clone();
            let semaphore = semaphore.clone();
            let principal = principal.to_string();
            join_set.spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                let result = service
                    .upload_document(&item.name, item.media_kind, &item.bytes, &principal)
                    .await;
                (item.name, result)
            });
        }

        let mut report = UploadReport::default();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((_, Ok(doc))) => report.succeeded.push(doc),
                Ok((name, Err(e))) => report.failed.push((name, e.to_string())),
                Err(e) => report.failed.push(("<task>".to_string(), e.to_string())),
            }
        }
        info!(
            succeeded = report.succeeded.len(),
            failed = report.failed.len(),
            "batch upload complete"
        );
        report
    }

    /// Re-run extraction for an existing document from its stored bytes.
    pub async fn reextract_document(&self, id: Uuid) -> Result<KnowledgeDocument> {
        let lock = self.lock_for(id).await;
        let _guard = lock.lock().await;

        let mut doc = self.documents.fetch(id).await?;
        let bytes = self.store.get(doc.content_ref).await?;
        let outcome = self
            .pipeline
            .run(&doc.name, doc.media_kind, &bytes, None)
            .await?;

        doc.extracted_text = outcome.text;
        doc.extracted = outcome.extracted;
        self.documents.update(doc.clone()).await?;
        self.index.index(&doc).await;
        Ok(doc)
    }

    // =========================================================================
    // SEARCH & CORPUS MAINTENANCE
    // =========================================================================

    /// Free-text search with optional tag and category filters.
    ///
    /// Filters intersect with the ranked search results, preserving the
    /// search order. The tag filter uses the configured combination
    /// mode (OR by default).
    pub async fn search_documents(
        &self,
        query: &str,
        tags: Option<&[String]>,
        category: Option<&str>,
    ) -> Result<Vec<KnowledgeDocument>> {
        let mut ids = self.index.search(query).await;

        if let Some(tags) = tags {
            let allowed = self.index.filter_by_tags(tags, self.config.tag_match).await;
            ids.retain(|id| allowed.contains(id));
        }
        if let Some(category) = category {
            let allowed = self.index.filter_by_category(category).await;
            ids.retain(|id| allowed.contains(id));
        }

        let mut docs = Vec::with_capacity(ids.len());
        for id in ids {
            // Index and repository can only drift transiently; skip
            // anything the repository no longer has.
            match self.documents.fetch(id).await {
                Ok(doc) => docs.push(doc),
                Err(Error::DocumentNotFound(_)) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(docs)
    }

    pub async fn get_document(&self, id: Uuid) -> Result<KnowledgeDocument> {
        self.documents.fetch(id).await
    }

    pub async fn list_documents(&self) -> Result<Vec<KnowledgeDocument>> {
        self.documents.list().await
    }

    /// Replace a document's tag set; the index update is atomic with
    /// the repository commit under the per-document lock.
    pub async fn update_document_tags(
        &self,
        id: Uuid,
        tags: &[String],
    ) -> Result<KnowledgeDocument> {
        let lock = self.lock_for(id).await;
        let _guard = lock.lock().await;

        let mut doc = self.documents.fetch(id).await?;
        doc.set_tags(tags);
        self.documents.update(doc.clone()).await?;
        self.index.index(&doc).await;
        Ok(doc)
    }

    /// Replace a document's category with a normalized value.
    pub async fn update_document_category(
        &self,
        id: Uuid,
        category: &str,
    ) -> Result<KnowledgeDocument> {
        let lock = self.lock_for(id).await;
        let _guard = lock.lock().await;

        let mut doc = self.documents.fetch(id).await?;
        doc.set_category(category);
        self.documents.update(doc.clone()).await?;
        self.index.index(&doc).await;
        Ok(doc)
    }

    /// Hard-delete a document: record, index entry, and stored bytes.
    pub async fn delete_document(&self, id: Uuid) -> Result<()> {
        let lock = self.lock_for(id).await;
        let _guard = lock.lock().await;

        let doc = self.documents.remove(id).await?;
        self.index.remove(id).await;
        self.store.delete(doc.content_ref).await?;
        self.doc_locks.lock().await.remove(&id);
        info!(document_id = %id, "document deleted");
        Ok(())
    }

    // =========================================================================
    // SYNTHESIS
    // =========================================================================

    pub async fn synthesize(
        &self,
        prompt: &str,
        source_ids: &[Uuid],
        profile: &OrganizationProfile,
    ) -> Result<GeneratedContent> {
        self.synthesis.generate(prompt, source_ids, profile).await
    }

    pub async fn improve_text(&self, text: &str, style: &str) -> Result<String> {
        self.synthesis.improve_text(text, style).await
    }

    pub async fn suggest(&self, context: &str) -> Vec<String> {
        self.synthesis.suggest(context).await
    }

    pub async fn extract_key_info(&self, source_ids: &[Uuid]) -> Result<KeyInfoAggregate> {
        self.synthesis.extract_key_info(source_ids).await
    }

    // =========================================================================
    // GENERATED DOCUMENTS
    // =========================================================================

    pub async fn create_generated_document(
        &self,
        req: CreateDocumentRequest,
    ) -> Result<scriven_core::GeneratedDocument> {
        self.lifecycle.create(req).await
    }

    pub async fn update_generated_document(
        &self,
        id: Uuid,
        patch: UpdatePatch,
        author: &str,
    ) -> Result<scriven_core::GeneratedDocument> {
        self.lifecycle.update(id, patch, author).await
    }

    pub async fn get_generated_document(
        &self,
        id: Uuid,
    ) -> Result<scriven_core::GeneratedDocument> {
        self.lifecycle.fetch(id).await
    }

    pub async fn archive_generated_document(
        &self,
        id: Uuid,
        actor: &str,
    ) -> Result<scriven_core::GeneratedDocument> {
        self.lifecycle.archive(id, actor).await
    }

    pub async fn restore_generated_document(
        &self,
        id: Uuid,
        actor: &str,
    ) -> Result<scriven_core::GeneratedDocument> {
        self.lifecycle.restore(id, actor).await
    }

    pub async fn toggle_favorite(
        &self,
        id: Uuid,
        actor: &str,
    ) -> Result<scriven_core::GeneratedDocument> {
        self.lifecycle.toggle_favorite(id, actor).await
    }

    pub async fn delete_generated_document(&self, id: Uuid, actor: &str) -> Result<()> {
        self.lifecycle.delete(id, actor).await?;
        Ok(())
    }

    pub async fn list_generated_documents(
        &self,
        filter: DocumentFilter,
    ) -> Result<Vec<scriven_core::GeneratedDocument>> {
        self.lifecycle.list_filtered(filter).await
    }

    /// Synthesize and immediately persist the result as a draft.
    pub async fn synthesize_to_document(
        &self,
        prompt: &str,
        source_ids: &[Uuid],
        profile: &OrganizationProfile,
        owner: &str,
    ) -> Result<scriven_core::GeneratedDocument> {
        let content = self.synthesis.generate(prompt, source_ids, profile).await?;
        self.lifecycle
            .create_from_synthesis(owner, &content, &[], "", scriven_core::Priority::Normal)
            .await
    }

    /// Archive each id independently, collecting per-item outcomes.
    pub async fn bulk_archive(&self, ids: &[Uuid], actor: &str) -> BulkReport {
        let mut report = BulkReport::default();
        for &id in ids {
            match self.lifecycle.archive(id, actor).await {
                Ok(_) => report.succeeded.push(id),
                Err(e) => report.failed.push((id, e.to_string())),
            }
        }
        report
    }

    /// Toggle favorite on each id independently.
    pub async fn bulk_favorite(&self, ids: &[Uuid], actor: &str) -> BulkReport {
        let mut report = BulkReport::default();
        for &id in ids {
            match self.lifecycle.toggle_favorite(id, actor).await {
                Ok(_) => report.succeeded.push(id),
                Err(e) => report.failed.push((id, e.to_string())),
            }
        }
        report
    }
}
