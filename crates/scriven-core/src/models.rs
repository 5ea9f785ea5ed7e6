//! Data model for the Scriven knowledge base and synthesis engine.
//!
//! Three entity families live here:
//! - corpus items ([`KnowledgeDocument`] and its derived [`ExtractedData`]),
//! - output artifacts ([`GeneratedDocument`] with its versioned section
//!   content and [`DocumentStatus`] state machine),
//! - boundary values consumed or emitted whole ([`OrganizationProfile`],
//!   [`ActivityRecord`], [`GeneratedContent`], [`KeyInfoAggregate`]).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::tags;

// =============================================================================
// MEDIA KIND
// =============================================================================

/// Media kind of an uploaded source document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Pdf,
    Image,
    Text,
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pdf => write!(f, "pdf"),
            Self::Image => write!(f, "image"),
            Self::Text => write!(f, "text"),
        }
    }
}

impl std::str::FromStr for MediaKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "pdf" => Ok(Self::Pdf),
            "image" => Ok(Self::Image),
            "text" => Ok(Self::Text),
            other => Err(Error::UnsupportedMedia(other.to_string())),
        }
    }
}

// =============================================================================
// CONTENT REFERENCE
// =============================================================================

/// Opaque, stable pointer into a Content Store.
///
/// Serializes as the underlying UUID string. Callers never construct paths
/// from it; only the store that issued the reference can resolve it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentRef(pub Uuid);

impl ContentRef {
    /// Issue a fresh time-ordered reference.
    pub fn generate() -> Self {
        Self(Uuid::now_v7())
    }
}

impl std::fmt::Display for ContentRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// KNOWLEDGE DOCUMENT
// =============================================================================

/// Coarse sentiment label derived from document text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    #[default]
    Neutral,
    Negative,
}

/// Structured signal derived from a document's extracted text.
///
/// Always regenerable and replaceable; never treated as authoritative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ExtractedData {
    pub title: String,
    /// Bounded to [`crate::defaults::SUMMARY_MAX_CHARS`].
    pub summary: String,
    /// Ordered key points.
    pub key_points: Vec<String>,
    /// Named entities mentioned in the text.
    pub entities: Vec<String>,
    pub sentiment: Sentiment,
}

/// A corpus item: one ingested source document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeDocument {
    pub id: Uuid,
    pub name: String,
    pub media_kind: MediaKind,
    /// Pointer to the raw bytes in the Content Store (never inline).
    pub content_ref: ContentRef,
    /// Plain text produced by the extraction pipeline. Empty only when
    /// extraction terminally failed; see [`Self::needs_attention`].
    pub extracted_text: String,
    /// Sorted, deduplicated, no empty entries.
    pub tags: Vec<String>,
    /// Never empty; defaults to [`tags::UNCATEGORIZED`].
    pub category: String,
    pub size_bytes: i64,
    pub uploaded_at: DateTime<Utc>,
    pub uploaded_by: String,
    pub extracted: Option<ExtractedData>,
}

impl KnowledgeDocument {
    /// Create a new document record from a completed upload.
    ///
    /// Tags and category are normalized on the way in so the invariants
    /// hold from construction.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: impl Into<String>,
        media_kind: MediaKind,
        content_ref: ContentRef,
        extracted_text: impl Into<String>,
        size_bytes: i64,
        uploaded_by: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            name: name.into(),
            media_kind,
            content_ref,
            extracted_text: extracted_text.into(),
            tags: Vec::new(),
            category: tags::UNCATEGORIZED.to_string(),
            size_bytes,
            uploaded_at: Utc::now(),
            uploaded_by: uploaded_by.into(),
            extracted: None,
        }
    }

    /// True when extraction terminally failed and the document was stored
    /// with empty text so it can be surfaced, not silently dropped.
    pub fn needs_attention(&self) -> bool {
        self.extracted_text.is_empty()
    }

    /// Replace the tag set with a normalized copy of `new_tags`.
    pub fn set_tags(&mut self, new_tags: &[String]) {
        self.tags = tags::normalize_tags(new_tags);
    }

    /// Replace the category with a normalized value (empty input falls back
    /// to the uncategorized sentinel).
    pub fn set_category(&mut self, category: &str) {
        self.category = tags::normalize_category(category);
    }
}

// =============================================================================
// GENERATED DOCUMENT
// =============================================================================

/// Kind of a content section within a generated document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionKind {
    Heading,
    Paragraph,
    List,
    Signature,
}

/// One typed content block of a generated document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub kind: SectionKind,
    pub body: String,
}

impl Section {
    pub fn heading(body: impl Into<String>) -> Self {
        Self {
            kind: SectionKind::Heading,
            body: body.into(),
        }
    }

    pub fn paragraph(body: impl Into<String>) -> Self {
        Self {
            kind: SectionKind::Paragraph,
            body: body.into(),
        }
    }
}

/// Lifecycle status of a generated document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    #[default]
    Draft,
    Final,
    Sent,
    Archived,
}

impl DocumentStatus {
    /// Whether the state machine permits moving to `next`.
    ///
    /// Allowed: draft→final, final→sent, any non-archived→archived,
    /// archived→draft (restore). Everything else is rejected.
    pub fn can_transition_to(self, next: DocumentStatus) -> bool {
        use DocumentStatus::*;
        matches!(
            (self, next),
            (Draft, Final) | (Final, Sent) | (Draft | Final | Sent, Archived) | (Archived, Draft)
        )
    }
}

impl std::fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Draft => write!(f, "draft"),
            Self::Final => write!(f, "final"),
            Self::Sent => write!(f, "sent"),
            Self::Archived => write!(f, "archived"),
        }
    }
}

/// Priority of a generated document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
}

/// One entry in a generated document's version history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionEntry {
    /// Strictly increasing, dense, starting at 1.
    pub version: i32,
    pub description: String,
    /// md5 hash of the serialized section content at this version.
    pub hash: String,
    pub created_at: DateTime<Utc>,
    pub author: String,
}

/// An output artifact of synthesis or manual authoring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedDocument {
    pub id: Uuid,
    pub owner: String,
    pub title: String,
    pub sections: Vec<Section>,
    pub status: DocumentStatus,
    /// Favorite state is the reserved tag [`tags::FAVORITE_TAG`], keeping
    /// tag-based filtering uniform.
    pub tags: Vec<String>,
    pub category: String,
    pub priority: Priority,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Ordered, dense version history; index 0 is version 1.
    pub versions: Vec<VersionEntry>,
}

impl GeneratedDocument {
    /// Current version number (0 only for a record that has never been
    /// committed, which repositories do not produce).
    pub fn current_version(&self) -> i32 {
        self.versions.last().map(|v| v.version).unwrap_or(0)
    }

    /// Whether the reserved favorite tag is present.
    pub fn is_favorite(&self) -> bool {
        self.tags.iter().any(|t| t == tags::FAVORITE_TAG)
    }

    /// Plain-text rendering of the section content, used for hashing and
    /// version diffs.
    pub fn content_text(&self) -> String {
        let mut out = String::new();
        for section in &self.sections {
            out.push_str(&section.body);
            out.push('\n');
        }
        out
    }
}

// =============================================================================
// BOUNDARY VALUES
// =============================================================================

/// Read-only organizational profile supplied by the external profile
/// collaborator. The core never persists or mutates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct OrganizationProfile {
    pub name: String,
    pub address: String,
    pub email: String,
    pub phone: String,
    pub legal_ids: Vec<String>,
    /// Default signatory used for signature blocks.
    pub signatory: String,
}

/// Type of an emitted activity record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Created,
    Modified,
    Shared,
    Archived,
}

impl std::fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Modified => write!(f, "modified"),
            Self::Shared => write!(f, "shared"),
            Self::Archived => write!(f, "archived"),
        }
    }
}

/// Activity record pushed to the external observability collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub kind: ActivityKind,
    pub document_id: Uuid,
    pub title: String,
    pub at: DateTime<Utc>,
    pub actor: String,
}

impl ActivityRecord {
    pub fn now(
        kind: ActivityKind,
        document_id: Uuid,
        title: impl Into<String>,
        actor: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            document_id,
            title: title.into(),
            at: Utc::now(),
            actor: actor.into(),
        }
    }
}

/// Output of the synthesis engine's generate operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedContent {
    pub content: String,
    /// Provenance: exactly the set of source ids that were read.
    pub sources: Vec<Uuid>,
    /// Quality signal in `0.0..=1.0`.
    pub confidence: f32,
    pub suggested_title: String,
}

/// Aggregated derived signal across a set of source documents.
///
/// Fields degrade (empty list / `None`) when sources lack the derived
/// datum; a missing datum on one source never fails the whole call.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct KeyInfoAggregate {
    pub key_points: Vec<String>,
    pub entities: Vec<String>,
    pub summary: Option<String>,
    pub recommendations: Vec<String>,
}
