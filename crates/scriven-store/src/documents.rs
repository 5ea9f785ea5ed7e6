//! In-memory knowledge document repository.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use scriven_core::{DocumentRepository, Error, KnowledgeDocument, Result};

/// In-memory [`DocumentRepository`] preserving insertion order.
///
/// One instance per tenant; cloning shares the underlying storage.
#[derive(Clone, Default)]
pub struct MemoryDocumentRepository {
    docs: Arc<RwLock<Vec<KnowledgeDocument>>>,
}

impl MemoryDocumentRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentRepository for MemoryDocumentRepository {
    async fn insert(&self, doc: KnowledgeDocument) -> Result<()> {
        let mut docs = self.docs.write().await;
        if docs.iter().any(|d| d.id == doc.id) {
            return Err(Error::InvalidInput(format!(
                "document {} already exists",
                doc.id
            )));
        }
        docs.push(doc);
        Ok(())
    }

    async fn fetch(&self, id: Uuid) -> Result<KnowledgeDocument> {
        let docs = self.docs.read().await;
        docs.iter()
            .find(|d| d.id == id)
            .cloned()
            .ok_or(Error::DocumentNotFound(id))
    }

    async fn list(&self) -> Result<Vec<KnowledgeDocument>> {
        Ok(self.docs.read().await.clone())
    }

    async fn update(&self, doc: KnowledgeDocument) -> Result<()> {
        let mut docs = self.docs.write().await;
        match docs.iter_mut().find(|d| d.id == doc.id) {
            Some(slot) => {
                *slot = doc;
                Ok(())
            }
            None => Err(Error::DocumentNotFound(doc.id)),
        }
    }

    async fn remove(&self, id: Uuid) -> Result<KnowledgeDocument> {
        let mut docs = self.docs.write().await;
        match docs.iter().position(|d| d.id == id) {
            Some(pos) => Ok(docs.remove(pos)),
            None => Err(Error::DocumentNotFound(id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scriven_core::{ContentRef, MediaKind};

    fn doc(name: &str) -> KnowledgeDocument {
        KnowledgeDocument::new(
            name,
            MediaKind::Text,
            ContentRef::generate(),
            "body",
            4,
            "alice",
        )
    }

    #[tokio::test]
    async fn test_insert_and_fetch() {
        let repo = MemoryDocumentRepository::new();
        let d = doc("notes.txt");
        let id = d.id;
        repo.insert(d).await.unwrap();
        assert_eq!(repo.fetch(id).await.unwrap().name, "notes.txt");
    }

    #[tokio::test]
    async fn test_insert_duplicate_rejected() {
        let repo = MemoryDocumentRepository::new();
        let d = doc("a.txt");
        repo.insert(d.clone()).await.unwrap();
        assert!(matches!(
            repo.insert(d).await,
            Err(Error::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_list_preserves_insertion_order() {
        let repo = MemoryDocumentRepository::new();
        for name in ["first.txt", "second.txt", "third.txt"] {
            repo.insert(doc(name)).await.unwrap();
        }
        let names: Vec<_> = repo
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.name)
            .collect();
        assert_eq!(names, vec!["first.txt", "second.txt", "third.txt"]);
    }

    #[tokio::test]
    async fn test_update_replaces() {
        let repo = MemoryDocumentRepository::new();
        let mut d = doc("a.txt");
        let id = d.id;
        repo.insert(d.clone()).await.unwrap();
        d.set_category("legal");
        repo.update(d).await.unwrap();
        assert_eq!(repo.fetch(id).await.unwrap().category, "legal");
    }

    #[tokio::test]
    async fn test_remove_then_fetch_not_found() {
        let repo = MemoryDocumentRepository::new();
        let d = doc("a.txt");
        let id = d.id;
        repo.insert(d).await.unwrap();
        repo.remove(id).await.unwrap();
        assert!(matches!(
            repo.fetch(id).await,
            Err(Error::DocumentNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_remove_unknown_errors() {
        let repo = MemoryDocumentRepository::new();
        assert!(matches!(
            repo.remove(Uuid::new_v4()).await,
            Err(Error::DocumentNotFound(_))
        ));
    }
}
