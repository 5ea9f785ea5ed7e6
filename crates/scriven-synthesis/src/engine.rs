//! The synthesis engine.
//!
//! Orchestrates the generative provider: document generation with exact
//! provenance, best-effort text improvement, advisory suggestions, and
//! key-information aggregation across sources. Provider calls run under
//! bounded retry and a deadline; exhaustion surfaces as
//! `SynthesisUnavailable`.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};
use uuid::Uuid;

use scriven_core::{
    defaults, DocumentRepository, Error, GeneratedContent, GenerationBackend, GenerationRequest,
    GenerationResponse, KeyInfoAggregate, KnowledgeDocument, OrganizationProfile, Result,
};
use scriven_inference::{with_deadline, RetryPolicy};

use crate::prompts;

/// Content synthesis over a knowledge corpus.
#[derive(Clone)]
pub struct SynthesisEngine {
    backend: Arc<dyn GenerationBackend>,
    documents: Arc<dyn DocumentRepository>,
    model: String,
    temperature: f32,
    retry: RetryPolicy,
    default_deadline: Duration,
}

impl SynthesisEngine {
    pub fn new(
        backend: Arc<dyn GenerationBackend>,
        documents: Arc<dyn DocumentRepository>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            documents,
            model: model.into(),
            temperature: 0.7,
            retry: RetryPolicy::default(),
            default_deadline: Duration::from_secs(defaults::SYNTHESIS_TIMEOUT_SECS),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.default_deadline = deadline;
        self
    }

    /// Resolve source ids to documents, rejecting unknown ids.
    ///
    /// Provenance is a contract of the output: an id that does not
    /// resolve is a hard input error, never silently skipped.
    async fn resolve_sources(&self, source_ids: &[Uuid]) -> Result<Vec<KnowledgeDocument>> {
        let mut seen = Vec::new();
        let mut docs = Vec::new();
        for &id in source_ids {
            if seen.contains(&id) {
                continue;
            }
            seen.push(id);
            match self.documents.fetch(id).await {
                Ok(doc) => docs.push(doc),
                Err(Error::DocumentNotFound(_)) => return Err(Error::UnknownSource(id)),
                Err(e) => return Err(e),
            }
        }
        Ok(docs)
    }

    /// One provider round trip under retry and deadline.
    async fn call_provider(&self, system: String, prompt: String) -> Result<GenerationResponse> {
        let deadline = self.default_deadline;
        let result = self
            .retry
            .run(|attempt| {
                let request = GenerationRequest {
                    model: self.model.clone(),
                    system: system.clone(),
                    prompt: prompt.clone(),
                    temperature: self.temperature,
                };
                async move {
                    if attempt > 1 {
                        debug!(attempt, "synthesis retry");
                    }
                    with_deadline(deadline, self.backend.generate(request), || {
                        Error::Request(format!("synthesis call exceeded {:?}", deadline))
                    })
                    .await
                }
            })
            .await;

        result.map_err(|e| {
            if e.is_retryable() {
                Error::SynthesisUnavailable(e.to_string())
            } else {
                e
            }
        })
    }

    /// Generate new content from a request, a set of source documents,
    /// and the organization profile.
    ///
    /// `sources` on the result is exactly the deduplicated input id
    /// set. An empty id set is accepted: generation then works from the
    /// request and profile alone.
    pub async fn generate(
        &self,
        prompt: &str,
        source_ids: &[Uuid],
        profile: &OrganizationProfile,
    ) -> Result<GeneratedContent> {
        if prompt.trim().is_empty() {
            return Err(Error::EmptyPrompt);
        }

        let docs = self.resolve_sources(source_ids).await?;
        let source_texts: Vec<(String, String)> = docs
            .iter()
            .map(|d| (d.name.clone(), d.extracted_text.clone()))
            .collect();

        let system = prompts::system_prompt(profile);
        let user = prompts::generation_prompt(prompt, &source_texts);
        let response = self.call_provider(system, user).await?;

        let parsed =
            prompts::parse_generation(&response.text, &prompts::title_from_request(prompt));
        info!(
            source_count = docs.len(),
            confidence = parsed.confidence,
            "synthesis: generate complete"
        );

        Ok(GeneratedContent {
            content: parsed.content,
            sources: docs.iter().map(|d| d.id).collect(),
            confidence: parsed.confidence,
            suggested_title: parsed.title,
        })
    }

    /// Improve existing text in the given style.
    ///
    /// Unrecognized styles return the input unchanged; this path is
    /// best-effort, not correctness-critical.
    pub async fn improve_text(&self, text: &str, style: &str) -> Result<String> {
        if text.trim().is_empty() {
            return Ok(text.to_string());
        }
        if !prompts::known_style(style) {
            debug!(style, "improve: unknown style, returning input unchanged");
            return Ok(text.to_string());
        }

        let system = "You are an expert editor.".to_string();
        let response = self
            .call_provider(system, prompts::improve_prompt(text, style))
            .await?;

        let improved = response.text.trim();
        if improved.is_empty() {
            warn!("improve: provider returned empty text, keeping input");
            return Ok(text.to_string());
        }
        Ok(improved.to_string())
    }

    /// Advisory next-step suggestions. Callers must tolerate an empty
    /// list; provider failures are swallowed here.
    pub async fn suggest(&self, context: &str) -> Vec<String> {
        let system = "You are a helpful planning assistant.".to_string();
        match self
            .call_provider(system, prompts::suggest_prompt(context))
            .await
        {
            Ok(response) => prompts::parse_suggestions(&response.text),
            Err(e) => {
                warn!(error = %e, "suggest: provider failed, returning no suggestions");
                Vec::new()
            }
        }
    }

    /// Aggregate derived data across sources.
    ///
    /// Sources without derived data contribute nothing; a missing datum
    /// on one source never fails the call. Unknown ids are still a hard
    /// error, matching generate's provenance contract.
    pub async fn extract_key_info(&self, source_ids: &[Uuid]) -> Result<KeyInfoAggregate> {
        let docs = self.resolve_sources(source_ids).await?;

        let mut key_points = Vec::new();
        let mut entities = Vec::new();
        let mut summaries = Vec::new();

        for doc in &docs {
            if let Some(extracted) = &doc.extracted {
                for point in &extracted.key_points {
                    if !key_points.contains(point) {
                        key_points.push(point.clone());
                    }
                }
                for entity in &extracted.entities {
                    if !entities.contains(entity) {
                        entities.push(entity.clone());
                    }
                }
                if !extracted.summary.is_empty() {
                    summaries.push(extracted.summary.clone());
                }
            }
        }

        let summary = if summaries.is_empty() {
            None
        } else {
            Some(summaries.join(" "))
        };

        // Advisory recommendations; an empty list is fine.
        let recommendations = match &summary {
            Some(context) => self.suggest(context).await,
            None => Vec::new(),
        };

        Ok(KeyInfoAggregate {
            key_points,
            entities,
            summary,
            recommendations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scriven_core::{ContentRef, ExtractedData, MediaKind, Sentiment};
    use scriven_inference::MockGenerationBackend;
    use scriven_store::MemoryDocumentRepository;

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

    async fn engine_with(
        backend: MockGenerationBackend,
        docs: Vec<KnowledgeDocument>,
    ) -> (SynthesisEngine, Vec<Uuid>) {
        let repo = MemoryDocumentRepository::new();
        let mut ids = Vec::new();
        for d in docs {
            ids.push(d.id);
            repo.insert(d).await.unwrap();
        }
        let engine = SynthesisEngine::new(Arc::new(backend), Arc::new(repo), "mock-model");
        (engine, ids)
    }

    #[tokio::test]
    async fn test_generate_provenance_exact() {
        let backend = MockGenerationBackend::new()
            .with_default_response("TITLE: Report\nCONFIDENCE: 0.9\nCONTENT:\nDone.");
        let (engine, ids) = engine_with(
            backend,
            vec![doc("a.txt", "alpha"), doc("b.txt", "beta")],
        )
        .await;

        let result = engine
            .generate("Summarize", &ids, &OrganizationProfile::default())
            .await
            .unwrap();
        assert_eq!(result.sources, ids);
        assert_eq!(result.suggested_title, "Report");
        assert_eq!(result.content, "Done.");
        assert!((result.confidence - 0.9).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_generate_unknown_source_is_hard_error() {
        let (engine, mut ids) = engine_with(MockGenerationBackend::new(), vec![doc("a.txt", "x")])
            .await;
        let ghost = Uuid::new_v4();
        ids.push(ghost);
        let err = engine
            .generate("Summarize", &ids, &OrganizationProfile::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UnknownSource(id) if id == ghost));
    }

    #[tokio::test]
    async fn test_generate_empty_prompt_rejected() {
        let (engine, _) = engine_with(MockGenerationBackend::new(), vec![]).await;
        let err = engine
            .generate("   ", &[], &OrganizationProfile::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::EmptyPrompt));
    }

    #[tokio::test]
    async fn test_generate_empty_sources_accepted() {
        let backend = MockGenerationBackend::new().with_default_response("Some letter text");
        let (engine, _) = engine_with(backend, vec![]).await;
        let result = engine
            .generate("Write a letter", &[], &OrganizationProfile::default())
            .await
            .unwrap();
        assert!(result.sources.is_empty());
        assert_eq!(result.content, "Some letter text");
    }

    #[tokio::test]
    async fn test_generate_dedups_source_ids() {
        let backend = MockGenerationBackend::new();
        let (engine, ids) = engine_with(backend, vec![doc("a.txt", "x")]).await;
        let doubled = vec![ids[0], ids[0]];
        let result = engine
            .generate("Summarize", &doubled, &OrganizationProfile::default())
            .await
            .unwrap();
        assert_eq!(result.sources, vec![ids[0]]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_generate_unavailable_after_retries() {
        let backend = MockGenerationBackend::new().with_failures(100);
        let (engine, _) = engine_with(backend, vec![]).await;
        let err = engine
            .generate("Write", &[], &OrganizationProfile::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::SynthesisUnavailable(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_generate_recovers_from_transient_failure() {
        let backend = MockGenerationBackend::new()
            .with_failures(1)
            .with_default_response("recovered");
        let (engine, _) = engine_with(backend, vec![]).await;
        let result = engine
            .generate("Write", &[], &OrganizationProfile::default())
            .await
            .unwrap();
        assert_eq!(result.content, "recovered");
    }

    #[tokio::test]
    async fn test_improve_known_style() {
        let backend = MockGenerationBackend::new().with_default_response("Much better text.");
        let (engine, _) = engine_with(backend, vec![]).await;
        let improved = engine.improve_text("ok text", "formal").await.unwrap();
        assert_eq!(improved, "Much better text.");
    }

    #[tokio::test]
    async fn test_improve_unknown_style_returns_input() {
        let backend = MockGenerationBackend::new().with_default_response("should not be used");
        let (engine, _) = engine_with(backend.clone(), vec![]).await;
        let improved = engine.improve_text("original", "piratespeak").await.unwrap();
        assert_eq!(improved, "original");
        // No provider call was made.
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test]
    async fn test_improve_empty_provider_reply_keeps_input() {
        let backend = MockGenerationBackend::new().with_default_response("   ");
        let (engine, _) = engine_with(backend, vec![]).await;
        let improved = engine.improve_text("original", "casual").await.unwrap();
        assert_eq!(improved, "original");
    }

    #[tokio::test]
    async fn test_suggest_parses_list() {
        let backend = MockGenerationBackend::new()
            .with_default_response("- Review the draft\n- Send it to legal");
        let (engine, _) = engine_with(backend, vec![]).await;
        let suggestions = engine.suggest("working on a contract").await;
        assert_eq!(suggestions, vec!["Review the draft", "Send it to legal"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_suggest_swallows_provider_failure() {
        let backend = MockGenerationBackend::new().with_failures(100);
        let (engine, _) = engine_with(backend, vec![]).await;
        assert!(engine.suggest("anything").await.is_empty());
    }

    #[tokio::test]
    async fn test_extract_key_info_aggregates_and_degrades() {
        let mut with_data = doc("a.txt", "alpha");
        with_data.extracted = Some(ExtractedData {
            title: "A".into(),
            summary: "summary a".into(),
            key_points: vec!["point one".into(), "shared point".into()],
            entities: vec!["Acme".into()],
            sentiment: Sentiment::Neutral,
        });
        let mut with_more = doc("b.txt", "beta");
        with_more.extracted = Some(ExtractedData {
            title: "B".into(),
            summary: "summary b".into(),
            key_points: vec!["shared point".into(), "point two".into()],
            entities: vec!["Acme".into(), "Globex".into()],
            sentiment: Sentiment::Neutral,
        });
        let without_data = doc("c.txt", "gamma");

        let backend = MockGenerationBackend::new().with_default_response("- do a thing");
        let (engine, ids) =
            engine_with(backend, vec![with_data, with_more, without_data]).await;

        let agg = engine.extract_key_info(&ids).await.unwrap();
        assert_eq!(
            agg.key_points,
            vec!["point one", "shared point", "point two"]
        );
        assert_eq!(agg.entities, vec!["Acme", "Globex"]);
        assert_eq!(agg.summary.as_deref(), Some("summary a summary b"));
        assert_eq!(agg.recommendations, vec!["do a thing"]);
    }

    #[tokio::test]
    async fn test_extract_key_info_all_sources_bare() {
        let (engine, ids) = engine_with(MockGenerationBackend::new(), vec![doc("a.txt", "x")])
            .await;
        let agg = engine.extract_key_info(&ids).await.unwrap();
        assert!(agg.key_points.is_empty());
        assert!(agg.summary.is_none());
        assert!(agg.recommendations.is_empty());
    }

    #[tokio::test]
    async fn test_extract_key_info_unknown_source() {
        let (engine, _) = engine_with(MockGenerationBackend::new(), vec![]).await;
        let ghost = Uuid::new_v4();
        let err = engine.extract_key_info(&[ghost]).await.unwrap_err();
        assert!(matches!(err, Error::UnknownSource(id) if id == ghost));
    }
}
