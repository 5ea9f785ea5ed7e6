//! Extractor registry: media kind → extractor dispatch.

use std::collections::HashMap;
use std::sync::Arc;

use scriven_core::{Error, MediaExtractor, MediaKind, Result};

use crate::adapters::{ImageExtractor, PdfExtractor, TextExtractor};

/// Registry of media extractors keyed by media kind.
#[derive(Clone, Default)]
pub struct ExtractorRegistry {
    extractors: HashMap<MediaKind, Arc<dyn MediaExtractor>>,
}

impl ExtractorRegistry {
    /// Empty registry; callers register extractors explicitly.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in text, PDF, and image extractors.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(TextExtractor));
        registry.register(Arc::new(PdfExtractor));
        registry.register(Arc::new(ImageExtractor));
        registry
    }

    /// Register an extractor, replacing any existing one for the kind.
    pub fn register(&mut self, extractor: Arc<dyn MediaExtractor>) {
        self.extractors.insert(extractor.media_kind(), extractor);
    }

    /// Resolve the extractor for `kind`.
    pub fn get(&self, kind: MediaKind) -> Result<Arc<dyn MediaExtractor>> {
        self.extractors
            .get(&kind)
            .cloned()
            .ok_or_else(|| Error::UnsupportedMedia(kind.to_string()))
    }

    /// Media kinds with a registered extractor.
    pub fn supported_kinds(&self) -> Vec<MediaKind> {
        self.extractors.keys().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    #[test]
    fn test_defaults_cover_all_media_kinds() {
        let registry = ExtractorRegistry::with_defaults();
        for kind in [MediaKind::Text, MediaKind::Pdf, MediaKind::Image] {
            assert!(registry.get(kind).is_ok());
        }
        assert_eq!(registry.supported_kinds().len(), 3);
    }

    #[test]
    fn test_empty_registry_reports_unsupported() {
        let registry = ExtractorRegistry::new();
        let err = registry.get(MediaKind::Pdf).err().unwrap();
        assert!(matches!(err, Error::UnsupportedMedia(k) if k == "pdf"));
    }

    struct FixedExtractor;

    #[async_trait]
    impl MediaExtractor for FixedExtractor {
        fn media_kind(&self) -> MediaKind {
            MediaKind::Pdf
        }
        async fn extract_text(&self, _data: &[u8]) -> scriven_core::Result<String> {
            Ok("fixed".to_string())
        }
        async fn health_check(&self) -> bool {
            true
        }
        fn name(&self) -> &str {
            "fixed"
        }
    }

    #[tokio::test]
    async fn test_register_replaces() {
        let mut registry = ExtractorRegistry::with_defaults();
        registry.register(Arc::new(FixedExtractor));
        let extractor = registry.get(MediaKind::Pdf).unwrap();
        assert_eq!(extractor.name(), "fixed");
        assert_eq!(extractor.extract_text(b"ignored").await.unwrap(), "fixed");
    }
}
