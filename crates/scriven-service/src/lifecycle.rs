//! Document lifecycle manager.
//!
//! Owns the generated-document state machine (draft → final → sent →
//! archived, restore back to draft), version history access, favorite
//! toggling, and activity emission. Transition legality is enforced
//! here; the repository commits the status change compare-and-set so
//! concurrent transitions cannot bypass the check.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use scriven_core::{
    normalize_tags, ActivityKind, ActivityRecord, ActivitySink, DocumentStatus, Error,
    GeneratedContent, GeneratedDocument, GeneratedDocumentRepository, Priority, Result, Section,
    UpdatePatch, VersionEntry, FAVORITE_TAG,
};
use scriven_store::content_hash;

/// Request to create a generated document.
#[derive(Debug, Clone)]
pub struct CreateDocumentRequest {
    pub owner: String,
    pub title: String,
    pub sections: Vec<Section>,
    pub tags: Vec<String>,
    pub category: String,
    pub priority: Priority,
}

/// Listing filter for generated documents.
///
/// `All` covers the working set; archived documents only show up under
/// their own filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DocumentFilter {
    #[default]
    All,
    Favorite,
    Archived,
}

/// Lifecycle manager over a generated-document repository.
#[derive(Clone)]
pub struct LifecycleManager {
    repo: Arc<dyn GeneratedDocumentRepository>,
    activity: Arc<dyn ActivitySink>,
}

impl LifecycleManager {
    pub fn new(
        repo: Arc<dyn GeneratedDocumentRepository>,
        activity: Arc<dyn ActivitySink>,
    ) -> Self {
        Self { repo, activity }
    }

    async fn emit(&self, kind: ActivityKind, doc: &GeneratedDocument, actor: &str) {
        self.activity
            .record(ActivityRecord::now(kind, doc.id, &doc.title, actor))
            .await;
    }

    /// Create a new draft document at version 1.
    pub async fn create(&self, req: CreateDocumentRequest) -> Result<GeneratedDocument> {
        let now = Utc::now();
        let doc = GeneratedDocument {
            id: Uuid::now_v7(),
            owner: req.owner.clone(),
            title: req.title,
            sections: req.sections,
            status: DocumentStatus::Draft,
            tags: normalize_tags(&req.tags),
            category: scriven_core::normalize_category(&req.category),
            priority: req.priority,
            created_at: now,
            updated_at: now,
            versions: Vec::new(),
        };
        self.repo.insert(doc.clone()).await?;
        let doc = self.repo.fetch(doc.id).await?;
        self.emit(ActivityKind::Created, &doc, &req.owner).await;
        info!(document_id = %doc.id, "lifecycle: created");
        Ok(doc)
    }

    /// Create a draft from synthesized content. The initial version
    /// entry records the synthesis provenance.
    pub async fn create_from_synthesis(
        &self,
        owner: &str,
        content: &GeneratedContent,
        tags: &[String],
        category: &str,
        priority: Priority,
    ) -> Result<GeneratedDocument> {
        let mut sections = vec![Section::heading(&content.suggested_title)];
        for block in content.content.split("\n\n").filter(|b| !b.trim().is_empty()) {
            sections.push(Section::paragraph(block.trim()));
        }

        let description = if content.sources.is_empty() {
            "Synthesized from prompt".to_string()
        } else {
            format!("Synthesized from {} sources", content.sources.len())
        };

        let now = Utc::now();
        let mut doc = GeneratedDocument {
            id: Uuid::now_v7(),
            owner: owner.to_string(),
            title: content.suggested_title.clone(),
            sections,
            status: DocumentStatus::Draft,
            tags: normalize_tags(tags),
            category: scriven_core::normalize_category(category),
            priority,
            created_at: now,
            updated_at: now,
            versions: Vec::new(),
        };
        doc.versions.push(VersionEntry {
            version: 1,
            description,
            hash: content_hash(&doc.content_text()),
            created_at: now,
            author: owner.to_string(),
        });

        self.repo.insert(doc.clone()).await?;
        let doc = self.repo.fetch(doc.id).await?;
        self.emit(ActivityKind::Created, &doc, owner).await;
        info!(document_id = %doc.id, sources = content.sources.len(), "lifecycle: created from synthesis");
        Ok(doc)
    }

    pub async fn fetch(&self, id: Uuid) -> Result<GeneratedDocument> {
        self.repo.fetch(id).await
    }

    pub async fn list(&self) -> Result<Vec<GeneratedDocument>> {
        self.repo.list().await
    }

    /// List documents matching `filter`.
    pub async fn list_filtered(&self, filter: DocumentFilter) -> Result<Vec<GeneratedDocument>> {
        let docs = self.repo.list().await?;
        Ok(docs
            .into_iter()
            .filter(|d| match filter {
                DocumentFilter::All => d.status != DocumentStatus::Archived,
                DocumentFilter::Favorite => {
                    d.is_favorite() && d.status != DocumentStatus::Archived
                }
                DocumentFilter::Archived => d.status == DocumentStatus::Archived,
            })
            .collect())
    }

    /// Apply an update patch. Content (section) changes append a
    /// version; metadata changes do not.
    pub async fn update(
        &self,
        id: Uuid,
        patch: UpdatePatch,
        author: &str,
    ) -> Result<GeneratedDocument> {
        let doc = self.repo.update(id, patch, author).await?;
        self.emit(ActivityKind::Modified, &doc, author).await;
        Ok(doc)
    }

    /// Replace the tag set, preserving favorite state: the reserved
    /// favorite tag is owned by [`Self::toggle_favorite`], so plain tag
    /// edits can neither add nor drop it accidentally. Adding it
    /// explicitly is allowed.
    pub async fn set_tags(
        &self,
        id: Uuid,
        tags: &[String],
        author: &str,
    ) -> Result<GeneratedDocument> {
        let current = self.repo.fetch(id).await?;
        let mut tags = normalize_tags(tags);
        if current.is_favorite() && !tags.iter().any(|t| t == FAVORITE_TAG) {
            tags.push(FAVORITE_TAG.to_string());
            tags.sort();
        }
        let patch = UpdatePatch {
            tags: Some(tags),
            ..Default::default()
        };
        self.update(id, patch, author).await
    }

    /// Move to `next` status, enforcing the state machine.
    ///
    /// The write is compare-and-set against the status the legality
    /// check saw, so a racing transition cannot slip an illegal edge
    /// through; the loser gets `ConcurrentModification`.
    pub async fn transition(
        &self,
        id: Uuid,
        next: DocumentStatus,
        actor: &str,
    ) -> Result<GeneratedDocument> {
        let doc = self.repo.fetch(id).await?;
        if !doc.status.can_transition_to(next) {
            return Err(Error::InvalidTransition {
                from: doc.status,
                to: next,
            });
        }
        let doc = self.repo.compare_and_set_status(id, doc.status, next).await?;
        let kind = match next {
            DocumentStatus::Archived => ActivityKind::Archived,
            DocumentStatus::Sent => ActivityKind::Shared,
            _ => ActivityKind::Modified,
        };
        self.emit(kind, &doc, actor).await;
        info!(document_id = %id, status = %next, "lifecycle: transition");
        Ok(doc)
    }

    /// Archive from any non-archived status.
    pub async fn archive(&self, id: Uuid, actor: &str) -> Result<GeneratedDocument> {
        self.transition(id, DocumentStatus::Archived, actor).await
    }

    /// Restore an archived document back to draft. The only transition
    /// out of archived.
    pub async fn restore(&self, id: Uuid, actor: &str) -> Result<GeneratedDocument> {
        self.transition(id, DocumentStatus::Draft, actor).await
    }

    /// Flip favorite state via the reserved tag.
    pub async fn toggle_favorite(&self, id: Uuid, actor: &str) -> Result<GeneratedDocument> {
        let doc = self.repo.fetch(id).await?;
        let mut tags = doc.tags.clone();
        if doc.is_favorite() {
            tags.retain(|t| t != FAVORITE_TAG);
        } else {
            tags.push(FAVORITE_TAG.to_string());
        }
        let patch = UpdatePatch {
            tags: Some(tags),
            ..Default::default()
        };
        self.update(id, patch, actor).await
    }

    /// Restore the content of an earlier version as a new version.
    pub async fn restore_version(
        &self,
        id: Uuid,
        version: i32,
        author: &str,
    ) -> Result<GeneratedDocument> {
        let doc = self.repo.restore_version(id, version, author).await?;
        self.emit(ActivityKind::Modified, &doc, author).await;
        Ok(doc)
    }

    /// Unified diff between two versions' plain-text content.
    pub async fn diff_versions(&self, id: Uuid, from: i32, to: i32) -> Result<String> {
        let from_sections = self.repo.fetch_version_sections(id, from).await?;
        let to_sections = self.repo.fetch_version_sections(id, to).await?;

        let render = |sections: &[Section]| {
            let mut out = String::new();
            for s in sections {
                out.push_str(&s.body);
                out.push('\n');
            }
            out
        };
        let from_content = render(&from_sections);
        let to_content = render(&to_sections);

        let diff = similar::TextDiff::from_lines(&from_content, &to_content);
        let mut output = String::new();
        output.push_str(&format!("--- version {}\n", from));
        output.push_str(&format!("+++ version {}\n", to));
        for change in diff.iter_all_changes() {
            let sign = match change.tag() {
                similar::ChangeTag::Delete => "-",
                similar::ChangeTag::Insert => "+",
                similar::ChangeTag::Equal => " ",
            };
            output.push_str(&format!("{}{}", sign, change));
        }
        Ok(output)
    }

    /// Hard delete. Archived or not, the record and its history go.
    pub async fn delete(&self, id: Uuid, actor: &str) -> Result<GeneratedDocument> {
        let doc = self.repo.remove(id).await?;
        self.emit(ActivityKind::Modified, &doc, actor).await;
        info!(document_id = %id, "lifecycle: deleted");
        Ok(doc)
    }
}
