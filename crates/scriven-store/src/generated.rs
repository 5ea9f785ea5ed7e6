//! In-memory generated document repository with version history.
//!
//! Mutations are serialized per document through a lock map, so version
//! numbers stay dense (1, 2, 3, ...) even when callers race. The history
//! is append-only: restores copy an old snapshot forward as a new
//! version rather than rewriting anything.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use scriven_core::{
    normalize_tags, Error, GeneratedDocument, GeneratedDocumentRepository, Result, Section,
    UpdatePatch, VersionEntry,
};

/// md5 hex digest of a document's plain-text content, recorded on each
/// version entry for change detection.
pub fn content_hash(text: &str) -> String {
    format!("{:x}", md5::compute(text))
}

#[derive(Default)]
struct Inner {
    docs: Vec<GeneratedDocument>,
    /// Section snapshots per (document, version).
    snapshots: HashMap<(Uuid, i32), Vec<Section>>,
}

/// In-memory [`GeneratedDocumentRepository`].
#[derive(Clone, Default)]
pub struct MemoryGeneratedRepository {
    inner: Arc<RwLock<Inner>>,
    /// Per-document mutation locks, keyed by id.
    locks: Arc<Mutex<HashMap<Uuid, Arc<Mutex<()>>>>>,
}

impl MemoryGeneratedRepository {
    pub fn new() -> Self {
        Self::default()
    }

    async fn lock_for(&self, id: Uuid) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks.entry(id).or_default().clone()
    }
}

#[async_trait]
impl GeneratedDocumentRepository for MemoryGeneratedRepository {
    async fn insert(&self, mut doc: GeneratedDocument) -> Result<()> {
        let mut inner = self.inner.write().await;
        if inner.docs.iter().any(|d| d.id == doc.id) {
            return Err(Error::InvalidInput(format!(
                "document {} already exists",
                doc.id
            )));
        }
        // Records always enter history at version 1.
        if doc.versions.is_empty() {
            doc.versions.push(VersionEntry {
                version: 1,
                description: "Created".to_string(),
                hash: content_hash(&doc.content_text()),
                created_at: Utc::now(),
                author: doc.owner.clone(),
            });
        }
        doc.tags = normalize_tags(&doc.tags);
        inner
            .snapshots
            .insert((doc.id, doc.current_version()), doc.sections.clone());
        inner.docs.push(doc);
        Ok(())
    }

    async fn fetch(&self, id: Uuid) -> Result<GeneratedDocument> {
        let inner = self.inner.read().await;
        inner
            .docs
            .iter()
            .find(|d| d.id == id)
            .cloned()
            .ok_or(Error::DocumentNotFound(id))
    }

    async fn list(&self) -> Result<Vec<GeneratedDocument>> {
        Ok(self.inner.read().await.docs.clone())
    }

    async fn update(
        &self,
        id: Uuid,
        patch: UpdatePatch,
        author: &str,
    ) -> Result<GeneratedDocument> {
        let lock = self.lock_for(id).await;
        let _guard = lock.lock().await;

        let mut inner = self.inner.write().await;
        let Inner { docs, snapshots } = &mut *inner;
        let doc = docs
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or(Error::DocumentNotFound(id))?;

        if let Some(expected) = patch.expected_version {
            if doc.current_version() != expected {
                return Err(Error::ConcurrentModification(id));
            }
        }

        if let Some(title) = patch.title {
            doc.title = title;
        }
        if let Some(tags) = patch.tags {
            doc.tags = normalize_tags(&tags);
        }
        if let Some(category) = patch.category {
            doc.category = scriven_core::normalize_category(&category);
        }
        if let Some(priority) = patch.priority {
            doc.priority = priority;
        }

        // Only content changes enter the version history; metadata
        // edits (tags, category, priority, title) do not bump versions.
        if let Some(sections) = patch.sections {
            doc.sections = sections;
            let next_version = doc.current_version() + 1;
            doc.versions.push(VersionEntry {
                version: next_version,
                description: patch.description.unwrap_or_else(|| "Updated".to_string()),
                hash: content_hash(&doc.content_text()),
                created_at: Utc::now(),
                author: author.to_string(),
            });
            snapshots.insert((id, next_version), doc.sections.clone());
        }
        doc.updated_at = Utc::now();

        Ok(doc.clone())
    }

    async fn compare_and_set_status(
        &self,
        id: Uuid,
        expected: scriven_core::DocumentStatus,
        next: scriven_core::DocumentStatus,
    ) -> Result<GeneratedDocument> {
        let lock = self.lock_for(id).await;
        let _guard = lock.lock().await;

        let mut inner = self.inner.write().await;
        let doc = inner
            .docs
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or(Error::DocumentNotFound(id))?;
        // A racing transition committed between the caller's legality
        // check and this write; make it re-fetch and re-validate.
        if doc.status != expected {
            return Err(Error::ConcurrentModification(id));
        }
        doc.status = next;
        doc.updated_at = Utc::now();
        Ok(doc.clone())
    }

    async fn fetch_version_sections(&self, id: Uuid, version: i32) -> Result<Vec<Section>> {
        let inner = self.inner.read().await;
        if !inner.docs.iter().any(|d| d.id == id) {
            return Err(Error::DocumentNotFound(id));
        }
        inner
            .snapshots
            .get(&(id, version))
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("version {} of document {}", version, id)))
    }

    async fn restore_version(
        &self,
        id: Uuid,
        version: i32,
        author: &str,
    ) -> Result<GeneratedDocument> {
        let lock = self.lock_for(id).await;
        let _guard = lock.lock().await;

        let mut inner = self.inner.write().await;
        let Inner { docs, snapshots } = &mut *inner;
        let doc = docs
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or(Error::DocumentNotFound(id))?;

        let sections = snapshots
            .get(&(id, version))
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("version {} of document {}", version, id)))?;

        doc.sections = sections;
        let next_version = doc.current_version() + 1;
        doc.versions.push(VersionEntry {
            version: next_version,
            description: format!("Restored from version {}", version),
            hash: content_hash(&doc.content_text()),
            created_at: Utc::now(),
            author: author.to_string(),
        });
        doc.updated_at = Utc::now();
        snapshots.insert((id, next_version), doc.sections.clone());

        Ok(doc.clone())
    }

    async fn remove(&self, id: Uuid) -> Result<GeneratedDocument> {
        let lock = self.lock_for(id).await;
        let _guard = lock.lock().await;

        let mut inner = self.inner.write().await;
        let pos = inner
            .docs
            .iter()
            .position(|d| d.id == id)
            .ok_or(Error::DocumentNotFound(id))?;
        let doc = inner.docs.remove(pos);
        inner.snapshots.retain(|(doc_id, _), _| *doc_id != id);
        drop(inner);

        self.locks.lock().await.remove(&id);
        Ok(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scriven_core::{DocumentStatus, Priority};

    fn doc(title: &str) -> GeneratedDocument {
        GeneratedDocument {
            id: Uuid::now_v7(),
            owner: "alice".into(),
            title: title.into(),
            sections: vec![Section::heading(title), Section::paragraph("Body text.")],
            status: DocumentStatus::Draft,
            tags: vec![],
            category: scriven_core::UNCATEGORIZED.into(),
            priority: Priority::Normal,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            versions: vec![],
        }
    }

    #[tokio::test]
    async fn test_insert_creates_version_one() {
        let repo = MemoryGeneratedRepository::new();
        let d = doc("Offer");
        let id = d.id;
        repo.insert(d).await.unwrap();
        let stored = repo.fetch(id).await.unwrap();
        assert_eq!(stored.current_version(), 1);
        assert_eq!(stored.versions[0].description, "Created");
        assert!(!stored.versions[0].hash.is_empty());
    }

    #[tokio::test]
    async fn test_update_appends_dense_versions() {
        let repo = MemoryGeneratedRepository::new();
        let d = doc("Offer");
        let id = d.id;
        repo.insert(d).await.unwrap();

        for i in 0..3 {
            let patch = UpdatePatch {
                sections: Some(vec![Section::paragraph(format!("Revision {}", i))]),
                description: Some(format!("edit {}", i)),
                ..Default::default()
            };
            repo.update(id, patch, "bob").await.unwrap();
        }

        let stored = repo.fetch(id).await.unwrap();
        let numbers: Vec<_> = stored.versions.iter().map(|v| v.version).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4]);
        assert_eq!(stored.versions[3].author, "bob");
    }

    #[tokio::test]
    async fn test_concurrent_updates_stay_dense() {
        let repo = MemoryGeneratedRepository::new();
        let d = doc("Offer");
        let id = d.id;
        repo.insert(d).await.unwrap();

        let mut handles = Vec::new();
        for i in 0..8 {
            let repo = repo.clone();
            handles.push(tokio::spawn(async move {
                let patch = UpdatePatch {
                    sections: Some(vec![Section::paragraph(format!("edit {}", i))]),
                    ..Default::default()
                };
                repo.update(id, patch, "writer").await
            }));
        }
        for h in handles {
            h.await.unwrap().unwrap();
        }

        let stored = repo.fetch(id).await.unwrap();
        let numbers: Vec<_> = stored.versions.iter().map(|v| v.version).collect();
        assert_eq!(numbers, (1..=9).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_expected_version_mismatch() {
        let repo = MemoryGeneratedRepository::new();
        let d = doc("Offer");
        let id = d.id;
        repo.insert(d).await.unwrap();

        let patch = UpdatePatch {
            title: Some("New title".into()),
            expected_version: Some(5),
            ..Default::default()
        };
        assert!(matches!(
            repo.update(id, patch, "bob").await,
            Err(Error::ConcurrentModification(_))
        ));

        let patch = UpdatePatch {
            title: Some("New title".into()),
            expected_version: Some(1),
            ..Default::default()
        };
        repo.update(id, patch, "bob").await.unwrap();
    }

    #[tokio::test]
    async fn test_metadata_update_does_not_bump_version() {
        let repo = MemoryGeneratedRepository::new();
        let d = doc("Offer");
        let id = d.id;
        repo.insert(d).await.unwrap();

        let patch = UpdatePatch {
            tags: Some(vec!["Finance".to_string(), "finance".to_string()]),
            category: Some("Contracts".to_string()),
            ..Default::default()
        };
        let updated = repo.update(id, patch, "alice").await.unwrap();
        assert_eq!(updated.current_version(), 1);
        assert_eq!(updated.tags, vec!["finance"]);
        assert_eq!(updated.category, "contracts");
    }

    #[tokio::test]
    async fn test_restore_version_appends() {
        let repo = MemoryGeneratedRepository::new();
        let d = doc("Offer");
        let id = d.id;
        let original_sections = d.sections.clone();
        repo.insert(d).await.unwrap();

        let patch = UpdatePatch {
            sections: Some(vec![Section::paragraph("rewritten")]),
            ..Default::default()
        };
        repo.update(id, patch, "bob").await.unwrap();

        let restored = repo.restore_version(id, 1, "alice").await.unwrap();
        assert_eq!(restored.sections, original_sections);
        assert_eq!(restored.current_version(), 3);
        assert_eq!(restored.versions[2].description, "Restored from version 1");
        // History untouched.
        assert_eq!(restored.versions[1].version, 2);
    }

    #[tokio::test]
    async fn test_fetch_version_sections() {
        let repo = MemoryGeneratedRepository::new();
        let d = doc("Offer");
        let id = d.id;
        repo.insert(d).await.unwrap();

        let v1 = repo.fetch_version_sections(id, 1).await.unwrap();
        assert_eq!(v1.len(), 2);
        assert!(matches!(
            repo.fetch_version_sections(id, 9).await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_remove_clears_history() {
        let repo = MemoryGeneratedRepository::new();
        let d = doc("Offer");
        let id = d.id;
        repo.insert(d).await.unwrap();
        repo.remove(id).await.unwrap();
        assert!(matches!(
            repo.fetch(id).await,
            Err(Error::DocumentNotFound(_))
        ));
        assert!(matches!(
            repo.fetch_version_sections(id, 1).await,
            Err(Error::DocumentNotFound(_))
        ));
    }

    #[test]
    fn test_content_hash_is_hex() {
        let hash = content_hash("some text");
        assert_eq!(hash.len(), 32);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
