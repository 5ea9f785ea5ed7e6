//! Plain-text extractor.

use async_trait::async_trait;
use tracing::warn;

use scriven_core::{Error, MediaKind, MediaExtractor, Result};

/// Extractor for plain-text documents: UTF-8 decode, no external tools.
pub struct TextExtractor;

#[async_trait]
impl MediaExtractor for TextExtractor {
    fn media_kind(&self) -> MediaKind {
        MediaKind::Text
    }

    async fn extract_text(&self, data: &[u8]) -> Result<String> {
        if data.is_empty() {
            return Err(Error::ExtractionFailed(
                "cannot extract text from empty data".to_string(),
            ));
        }
        match std::str::from_utf8(data) {
            Ok(text) => Ok(text.to_string()),
            Err(_) => {
                // Salvage what we can from mixed encodings.
                warn!("text extraction: input is not valid UTF-8, decoding lossily");
                Ok(String::from_utf8_lossy(data).into_owned())
            }
        }
    }

    async fn health_check(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        "text"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_extracts_utf8() {
        let text = TextExtractor.extract_text(b"hello world").await.unwrap();
        assert_eq!(text, "hello world");
    }

    #[tokio::test]
    async fn test_lossy_decode_on_invalid_utf8() {
        let text = TextExtractor
            .extract_text(&[0x68, 0x69, 0xFF, 0x21])
            .await
            .unwrap();
        assert!(text.starts_with("hi"));
        assert!(text.ends_with('!'));
    }

    #[tokio::test]
    async fn test_empty_data_fails() {
        let err = TextExtractor.extract_text(b"").await.unwrap_err();
        assert!(matches!(err, Error::ExtractionFailed(_)));
    }

    #[tokio::test]
    async fn test_always_healthy() {
        assert!(TextExtractor.health_check().await);
    }
}
