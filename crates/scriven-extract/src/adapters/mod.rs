//! Media extractor implementations.
//!
//! One adapter per media kind. PDF and image adapters shell out to
//! external tools (`pdftotext`, `tesseract`); their `health_check`
//! reports whether the tool is on PATH so callers can gate on it.

mod image;
mod pdf;
mod text;

pub use image::ImageExtractor;
pub use pdf::PdfExtractor;
pub use text::TextExtractor;

use scriven_core::{Error, Result};
use tokio::process::Command;

/// Run a command with a timeout, returning stdout as a string.
pub(crate) async fn run_cmd_with_timeout(cmd: &mut Command, timeout_secs: u64) -> Result<String> {
    let output = tokio::time::timeout(std::time::Duration::from_secs(timeout_secs), cmd.output())
        .await
        .map_err(|_| {
            Error::ExtractionTimeout(format!("external command timed out after {}s", timeout_secs))
        })?
        .map_err(|e| Error::ExtractionFailed(format!("failed to execute command: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::ExtractionFailed(format!(
            "command failed (exit {}): {}",
            output.status,
            stderr.trim()
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
