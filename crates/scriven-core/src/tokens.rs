//! Token estimation for prompt budgeting.
//!
//! Synthesis packs source excerpts into a bounded context window. An
//! exact tokenizer is provider-specific, so budgeting uses a fast
//! character-ratio estimate that errs on the generous side.

use crate::defaults::CHARS_PER_TOKEN;

/// Estimate the token count of `text` using a character ratio.
///
/// Based on the observation that English text averages roughly 3.7
/// characters per token under common BPE schemes.
pub fn estimate_tokens(text: &str) -> usize {
    (text.len() as f64 / CHARS_PER_TOKEN).ceil() as usize
}

/// Check whether `text` likely exceeds a token limit.
///
/// Useful for quick filtering before truncation.
pub fn likely_exceeds_limit(text: &str, limit: usize) -> bool {
    estimate_tokens(text) > limit
}

/// Truncate `text` to approximately `limit` tokens, cutting at a char
/// boundary. Returns the input unchanged when it already fits.
pub fn truncate_to_tokens(text: &str, limit: usize) -> &str {
    if !likely_exceeds_limit(text, limit) {
        return text;
    }
    let max_chars = (limit as f64 * CHARS_PER_TOKEN) as usize;
    let mut end = max_chars.min(text.len());
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}
