//! Image OCR extractor using `tesseract`.

use std::io::Write;

use async_trait::async_trait;
use tempfile::NamedTempFile;
use tokio::process::Command;

use scriven_core::{defaults, Error, MediaKind, MediaExtractor, Result};

use super::run_cmd_with_timeout;

/// OCR extractor shelling out to `tesseract`. Input bytes are validated
/// against known image signatures before the tool runs.
pub struct ImageExtractor;

#[async_trait]
impl MediaExtractor for ImageExtractor {
    fn media_kind(&self) -> MediaKind {
        MediaKind::Image
    }

    async fn extract_text(&self, data: &[u8]) -> Result<String> {
        if data.is_empty() {
            return Err(Error::ExtractionFailed(
                "cannot run OCR on empty image data".to_string(),
            ));
        }

        match infer::get(data) {
            Some(kind) if kind.matcher_type() == infer::MatcherType::Image => {}
            _ => {
                return Err(Error::ExtractionFailed(
                    "input does not look like a supported image format".to_string(),
                ))
            }
        }

        let mut tmpfile = NamedTempFile::new()
            .map_err(|e| Error::ExtractionFailed(format!("failed to create temp file: {}", e)))?;
        tmpfile
            .write_all(data)
            .map_err(|e| Error::ExtractionFailed(format!("failed to write temp file: {}", e)))?;
        let tmp_path = tmpfile.path().to_string_lossy().to_string();

        // "stdout" makes tesseract print recognized text instead of
        // writing an output file.
        let text = run_cmd_with_timeout(
            Command::new("tesseract").args([&tmp_path, "stdout"]),
            defaults::EXTRACTION_TIMEOUT_SECS,
        )
        .await?;

        Ok(text.trim().to_string())
    }

    async fn health_check(&self) -> bool {
        match Command::new("tesseract").arg("--version").output().await {
            Ok(output) => output.status.success(),
            Err(_) => false,
        }
    }

    fn name(&self) -> &str {
        "image"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_data_fails() {
        let err = ImageExtractor.extract_text(b"").await.unwrap_err();
        assert!(matches!(err, Error::ExtractionFailed(_)));
    }

    #[tokio::test]
    async fn test_non_image_bytes_rejected() {
        let err = ImageExtractor
            .extract_text(b"plain text, not an image")
            .await
            .unwrap_err();
        match err {
            Error::ExtractionFailed(msg) => assert!(msg.contains("image")),
            other => panic!("Expected ExtractionFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_png_signature_accepted_when_tool_present() {
        // Only run if tesseract is available
        if !ImageExtractor.health_check().await {
            eprintln!("tesseract not available, skipping");
            return;
        }

        // 1x1 white PNG.
        let png: &[u8] = &[
            0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48,
            0x44, 0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x02, 0x00, 0x00,
            0x00, 0x90, 0x77, 0x53, 0xDE, 0x00, 0x00, 0x00, 0x0C, 0x49, 0x44, 0x41, 0x54, 0x08,
            0xD7, 0x63, 0xF8, 0xFF, 0xFF, 0x3F, 0x00, 0x05, 0xFE, 0x02, 0xFE, 0xDC, 0xCC, 0x59,
            0xE7, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
        ];
        // A blank image yields empty text; the call itself must succeed.
        let text = ImageExtractor.extract_text(png).await.unwrap();
        assert!(text.len() < 100);
    }
}
