//! # scriven-index
//!
//! In-memory search index over the knowledge corpus.
//!
//! Token-substring matching over document name, extracted text, tags,
//! and category (case-insensitive). Ranking is by match count with a
//! stable insertion/update-order tie-break, so results are deterministic
//! for a given corpus snapshot. The index holds no document content
//! authority; it is re-derived from committed repository state on every
//! mutation.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::trace;
use uuid::Uuid;

use scriven_core::{normalize_category, normalize_tags, KnowledgeDocument};

/// Tag filter combination mode.
///
/// [`TagMatch::Any`] (OR across the requested tags) is the default;
/// [`TagMatch::All`] requires every requested tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TagMatch {
    #[default]
    Any,
    All,
}

#[derive(Debug, Clone)]
struct IndexEntry {
    seq: u64,
    name: String,
    text: String,
    tags: Vec<String>,
    category: String,
}

impl IndexEntry {
    /// Occurrences of `token` across all indexed fields.
    fn match_count(&self, token: &str) -> usize {
        let mut count = self.name.matches(token).count() + self.text.matches(token).count();
        count += self.tags.iter().map(|t| t.matches(token).count()).sum::<usize>();
        count += self.category.matches(token).count();
        count
    }
}

#[derive(Default)]
struct Inner {
    entries: HashMap<Uuid, IndexEntry>,
    next_seq: u64,
}

/// Shared in-memory index. Cloning shares the underlying state.
#[derive(Clone, Default)]
pub struct InMemoryIndex {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the entry for `document`.
    ///
    /// An update receives a fresh sequence number, moving the document
    /// to the back of tie-broken orderings.
    pub async fn index(&self, document: &KnowledgeDocument) {
        let mut inner = self.inner.write().await;
        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.entries.insert(
            document.id,
            IndexEntry {
                seq,
                name: document.name.to_lowercase(),
                text: document.extracted_text.to_lowercase(),
                tags: document.tags.clone(),
                category: document.category.clone(),
            },
        );
    }

    /// Remove a document from the index. Unknown ids are a no-op.
    pub async fn remove(&self, id: Uuid) {
        self.inner.write().await.entries.remove(&id);
    }

    /// Number of indexed documents.
    pub async fn len(&self) -> usize {
        self.inner.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.entries.is_empty()
    }

    /// Free-text search returning ranked document ids.
    ///
    /// The query is split on whitespace into lowercase tokens; a
    /// document matches when every token occurs as a substring of some
    /// indexed field. Results are ordered by total occurrence count
    /// (descending), then by sequence number. An empty or whitespace
    /// query returns the whole corpus in sequence order.
    pub async fn search(&self, free_text: &str) -> Vec<Uuid> {
        let tokens: Vec<String> = free_text
            .split_whitespace()
            .map(|t| t.to_lowercase())
            .collect();

        let inner = self.inner.read().await;
        if tokens.is_empty() {
            let mut all: Vec<(&Uuid, &IndexEntry)> = inner.entries.iter().collect();
            all.sort_by_key(|(_, e)| e.seq);
            return all.into_iter().map(|(id, _)| *id).collect();
        }

        let mut scored: Vec<(Uuid, usize, u64)> = Vec::new();
        for (id, entry) in &inner.entries {
            let counts: Vec<usize> = tokens.iter().map(|t| entry.match_count(t)).collect();
            if counts.iter().all(|&c| c > 0) {
                scored.push((*id, counts.iter().sum(), entry.seq));
            }
        }
        scored.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
        trace!(query = %free_text, hits = scored.len(), "index: search");
        scored.into_iter().map(|(id, _, _)| id).collect()
    }

    /// Filter by tags with the given combination mode, in sequence order.
    pub async fn filter_by_tags(&self, tags: &[String], mode: TagMatch) -> Vec<Uuid> {
        let wanted = normalize_tags(tags);
        if wanted.is_empty() {
            return Vec::new();
        }
        let inner = self.inner.read().await;
        let mut hits: Vec<(&Uuid, &IndexEntry)> = inner
            .entries
            .iter()
            .filter(|(_, e)| match mode {
                TagMatch::Any => wanted.iter().any(|t| e.tags.contains(t)),
                TagMatch::All => wanted.iter().all(|t| e.tags.contains(t)),
            })
            .collect();
        hits.sort_by_key(|(_, e)| e.seq);
        hits.into_iter().map(|(id, _)| *id).collect()
    }

    /// Filter by normalized category equality, in sequence order.
    pub async fn filter_by_category(&self, category: &str) -> Vec<Uuid> {
        let wanted = normalize_category(category);
        let inner = self.inner.read().await;
        let mut hits: Vec<(&Uuid, &IndexEntry)> = inner
            .entries
            .iter()
            .filter(|(_, e)| e.category == wanted)
            .collect();
        hits.sort_by_key(|(_, e)| e.seq);
        hits.into_iter().map(|(id, _)| *id).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scriven_core::{ContentRef, MediaKind};

    fn doc(name: &str, text: &str) -> KnowledgeDocument {
        KnowledgeDocument::new(
            name,
            MediaKind::Text,
            ContentRef::generate(),
            text,
            text.len() as i64,
            "alice",
        )
    }

    #[tokio::test]
    async fn test_empty_query_returns_all_in_order() {
        let index = InMemoryIndex::new();
        let a = doc("a.txt", "alpha");
        let b = doc("b.txt", "beta");
        index.index(&a).await;
        index.index(&b).await;
        assert_eq!(index.search("").await, vec![a.id, b.id]);
        assert_eq!(index.search("   ").await, vec![a.id, b.id]);
    }

    #[tokio::test]
    async fn test_substring_match_case_insensitive() {
        let index = InMemoryIndex::new();
        let d = doc("Sprint-Notes.txt", "agile sprints of 2 weeks");
        index.index(&d).await;
        assert_eq!(index.search("sprint").await, vec![d.id]);
        assert_eq!(index.search("SPRINT").await, vec![d.id]);
        assert!(index.search("kanban").await.is_empty());
    }

    #[tokio::test]
    async fn test_all_tokens_must_match() {
        let index = InMemoryIndex::new();
        let d = doc("plan.txt", "agile sprints");
        index.index(&d).await;
        assert_eq!(index.search("agile sprint").await, vec![d.id]);
        assert!(index.search("agile kanban").await.is_empty());
    }

    #[tokio::test]
    async fn test_ranking_by_match_count_then_seq() {
        let index = InMemoryIndex::new();
        let once = doc("a.txt", "sprint");
        let thrice = doc("b.txt", "sprint sprint sprint");
        index.index(&once).await;
        index.index(&thrice).await;
        assert_eq!(index.search("sprint").await, vec![thrice.id, once.id]);
    }

    #[tokio::test]
    async fn test_tie_break_is_insertion_order() {
        let index = InMemoryIndex::new();
        let a = doc("a.txt", "sprint");
        let b = doc("b.txt", "sprint");
        index.index(&a).await;
        index.index(&b).await;
        assert_eq!(index.search("sprint").await, vec![a.id, b.id]);
    }

    #[tokio::test]
    async fn test_reindex_moves_to_back_and_updates_fields() {
        let index = InMemoryIndex::new();
        let a = doc("a.txt", "sprint");
        let mut b = doc("b.txt", "sprint");
        index.index(&b).await;
        index.index(&a).await;
        // Re-index b: it now sorts after a on ties, with new tags live.
        b.set_tags(&["process".to_string()]);
        index.index(&b).await;
        assert_eq!(index.search("sprint").await, vec![a.id, b.id]);
        assert_eq!(
            index.filter_by_tags(&["process".to_string()], TagMatch::Any).await,
            vec![b.id]
        );
    }

    #[tokio::test]
    async fn test_search_covers_name_tags_category() {
        let index = InMemoryIndex::new();
        let mut d = doc("quarterly-report.pdf", "numbers");
        d.set_tags(&["finance".to_string()]);
        d.set_category("Reports");
        index.index(&d).await;
        assert_eq!(index.search("quarterly").await, vec![d.id]);
        assert_eq!(index.search("finance").await, vec![d.id]);
        assert_eq!(index.search("reports").await, vec![d.id]);
    }

    #[tokio::test]
    async fn test_filter_by_tags_any_vs_all() {
        let index = InMemoryIndex::new();
        let mut a = doc("a.txt", "x");
        a.set_tags(&["legal".to_string(), "urgent".to_string()]);
        let mut b = doc("b.txt", "y");
        b.set_tags(&["legal".to_string()]);
        index.index(&a).await;
        index.index(&b).await;

        let wanted = vec!["legal".to_string(), "urgent".to_string()];
        assert_eq!(
            index.filter_by_tags(&wanted, TagMatch::Any).await,
            vec![a.id, b.id]
        );
        assert_eq!(index.filter_by_tags(&wanted, TagMatch::All).await, vec![a.id]);
    }

    #[tokio::test]
    async fn test_filter_by_tags_empty_request() {
        let index = InMemoryIndex::new();
        index.index(&doc("a.txt", "x")).await;
        assert!(index.filter_by_tags(&[], TagMatch::Any).await.is_empty());
    }

    #[tokio::test]
    async fn test_filter_by_category_normalizes() {
        let index = InMemoryIndex::new();
        let mut d = doc("a.txt", "x");
        d.set_category("Contracts");
        index.index(&d).await;
        assert_eq!(index.filter_by_category("contracts").await, vec![d.id]);
        assert_eq!(index.filter_by_category("CONTRACTS").await, vec![d.id]);
        assert!(index.filter_by_category("reports").await.is_empty());
    }

    #[tokio::test]
    async fn test_remove() {
        let index = InMemoryIndex::new();
        let d = doc("a.txt", "sprint");
        index.index(&d).await;
        index.remove(d.id).await;
        assert!(index.search("sprint").await.is_empty());
        assert!(index.is_empty().await);
        // Removing again is fine.
        index.remove(d.id).await;
    }

    #[test]
    fn test_tag_match_serde() {
        assert_eq!(serde_json::to_string(&TagMatch::Any).unwrap(), "\"any\"");
        let m: TagMatch = serde_json::from_str("\"all\"").unwrap();
        assert_eq!(m, TagMatch::All);
    }
}
