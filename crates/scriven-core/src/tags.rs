//! Tag and category normalization.
//!
//! Tags are free-form labels kept in a canonical shape everywhere:
//! lowercase, trimmed, deduplicated, sorted, never empty. Categories use
//! the same normalization but are single-valued with an "uncategorized"
//! fallback. Favorite state on generated documents is expressed through
//! the reserved [`FAVORITE_TAG`] so tag filtering stays uniform.

/// Reserved tag marking a generated document as a favorite.
pub const FAVORITE_TAG: &str = "favorite";

/// Category assigned when none is provided.
pub const UNCATEGORIZED: &str = "uncategorized";

/// Normalize a single tag: trim and lowercase. Returns `None` for
/// entries that are empty after trimming.
pub fn normalize_tag(tag: &str) -> Option<String> {
    let trimmed = tag.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

/// Normalize a tag set: per-tag normalization, then dedup + sort.
pub fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut out: Vec<String> = tags.iter().filter_map(|t| normalize_tag(t)).collect();
    out.sort();
    out.dedup();
    out
}

/// Normalize a category, falling back to [`UNCATEGORIZED`] when the input
/// is empty or whitespace.
pub fn normalize_category(category: &str) -> String {
    normalize_tag(category).unwrap_or_else(|| UNCATEGORIZED.to_string())
}
