//! PDF extractor using `pdftotext` (poppler-utils).

use std::io::Write;

use async_trait::async_trait;
use tempfile::NamedTempFile;
use tokio::process::Command;

use scriven_core::{defaults, Error, MediaKind, MediaExtractor, Result};

use super::run_cmd_with_timeout;

/// Extractor shelling out to `pdftotext`. Each invocation is guarded by
/// a per-command timeout.
pub struct PdfExtractor;

#[async_trait]
impl MediaExtractor for PdfExtractor {
    fn media_kind(&self) -> MediaKind {
        MediaKind::Pdf
    }

    async fn extract_text(&self, data: &[u8]) -> Result<String> {
        if data.is_empty() {
            return Err(Error::ExtractionFailed(
                "cannot extract text from empty PDF data".to_string(),
            ));
        }

        // Validate PDF magic bytes (%PDF)
        if data.len() < 4 || &data[0..4] != b"%PDF" {
            return Err(Error::ExtractionFailed(
                "not a valid PDF (missing %PDF header)".to_string(),
            ));
        }

        // pdftotext reads from a file path.
        let mut tmpfile = NamedTempFile::new()
            .map_err(|e| Error::ExtractionFailed(format!("failed to create temp file: {}", e)))?;
        tmpfile
            .write_all(data)
            .map_err(|e| Error::ExtractionFailed(format!("failed to write temp file: {}", e)))?;
        let tmp_path = tmpfile.path().to_string_lossy().to_string();

        let text = run_cmd_with_timeout(
            Command::new("pdftotext").args([&tmp_path, "-"]),
            defaults::EXTRACTION_TIMEOUT_SECS,
        )
        .await?;

        Ok(text.trim().to_string())
    }

    async fn health_check(&self) -> bool {
        match Command::new("pdftotext").arg("-v").output().await {
            Ok(output) => {
                // pdftotext -v prints version to stderr and exits with 0 or 99
                // depending on the version. Both indicate the binary exists.
                output.status.success() || output.status.code() == Some(99)
            }
            Err(_) => false,
        }
    }

    fn name(&self) -> &str {
        "pdf"
    }
}
