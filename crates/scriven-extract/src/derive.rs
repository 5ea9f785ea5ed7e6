//! Structured-data derivation (stage two of extraction).
//!
//! Given a document's extracted text, derive an [`ExtractedData`]
//! record: title, bounded summary, key points, entities, and sentiment.
//! Two paths exist: a generative-provider prompt with lenient JSON
//! parsing, and a deterministic heuristic fallback used when no
//! provider is configured or the provider path fails. Derivation is
//! always best-effort; stage-one text is never discarded because
//! stage two failed.

use std::sync::{Arc, OnceLock};

use regex::Regex;
use serde::Deserialize;
use tracing::{debug, warn};

use scriven_core::{
    defaults, ExtractedData, GenerationBackend, GenerationRequest, Sentiment,
};

const POSITIVE_WORDS: &[&str] = &[
    "good", "great", "excellent", "success", "improve", "growth", "win", "agree", "approve",
    "benefit",
];
const NEGATIVE_WORDS: &[&str] = &[
    "bad", "poor", "fail", "failure", "decline", "loss", "problem", "risk", "reject", "dispute",
];

fn entity_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b[A-Z][A-Za-z]+(?:\s+[A-Z][A-Za-z]+)*\b").ok())
        .as_ref()
}

/// Build the provider prompt asking for derivation JSON.
pub fn build_derivation_prompt(name: &str, text: &str) -> String {
    let excerpt = scriven_core::truncate_to_tokens(text, defaults::CONTEXT_TOKEN_BUDGET);
    format!(
        "Analyze the following document and respond with only a JSON object with \
         these fields:\n\
         - \"title\": a short descriptive title\n\
         - \"summary\": a summary of at most {} characters\n\
         - \"key_points\": an array of the most important points\n\
         - \"entities\": an array of named people, organizations, and places\n\
         - \"sentiment\": one of \"positive\", \"neutral\", \"negative\"\n\n\
         Document name: {}\n\nDocument text:\n{}",
        defaults::SUMMARY_MAX_CHARS,
        name,
        excerpt
    )
}

#[derive(Deserialize, Default)]
struct RawDerived {
    #[serde(default)]
    title: String,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    key_points: Vec<String>,
    #[serde(default)]
    entities: Vec<String>,
    #[serde(default)]
    sentiment: String,
}

/// Parse a provider response into [`ExtractedData`], tolerating code
/// fences and prose around the JSON object. Returns `None` when no
/// usable object can be found.
pub fn parse_derived(raw: &str) -> Option<ExtractedData> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end <= start {
        return None;
    }
    let parsed: RawDerived = serde_json::from_str(&raw[start..=end]).ok()?;

    let sentiment = match parsed.sentiment.to_lowercase().as_str() {
        "positive" => Sentiment::Positive,
        "negative" => Sentiment::Negative,
        _ => Sentiment::Neutral,
    };

    Some(ExtractedData {
        title: parsed.title,
        summary: truncate_summary(&parsed.summary),
        key_points: parsed.key_points,
        entities: parsed.entities,
        sentiment,
    })
}

fn truncate_summary(summary: &str) -> String {
    let mut end = summary.len().min(defaults::SUMMARY_MAX_CHARS);
    while end > 0 && !summary.is_char_boundary(end) {
        end -= 1;
    }
    summary[..end].to_string()
}

/// Deterministic derivation used when no provider is reachable.
pub fn heuristic_derive(name: &str, text: &str) -> ExtractedData {
    let first_line = text.lines().find(|l| !l.trim().is_empty());
    let title = first_line
        .map(|l| l.trim().to_string())
        .filter(|l| l.len() <= 80)
        .unwrap_or_else(|| name.to_string());

    let summary = truncate_summary(text.trim());

    // Sentences long enough to carry meaning, first few only.
    let key_points: Vec<String> = text
        .split(['.', '\n'])
        .map(str::trim)
        .filter(|s| s.len() > 20)
        .take(5)
        .map(|s| s.to_string())
        .collect();

    let mut entities: Vec<String> = Vec::new();
    if let Some(re) = entity_regex() {
        for m in re.find_iter(text).take(20) {
            let candidate = m.as_str().to_string();
            if !entities.contains(&candidate) {
                entities.push(candidate);
            }
        }
        entities.truncate(10);
    }

    let lowered = text.to_lowercase();
    let positive = POSITIVE_WORDS
        .iter()
        .map(|w| lowered.matches(w).count())
        .sum::<usize>();
    let negative = NEGATIVE_WORDS
        .iter()
        .map(|w| lowered.matches(w).count())
        .sum::<usize>();
    let sentiment = match positive.cmp(&negative) {
        std::cmp::Ordering::Greater => Sentiment::Positive,
        std::cmp::Ordering::Less => Sentiment::Negative,
        std::cmp::Ordering::Equal => Sentiment::Neutral,
    };

    ExtractedData {
        title,
        summary,
        key_points,
        entities,
        sentiment,
    }
}

/// Derivation engine combining the provider path with the heuristic
/// fallback.
#[derive(Clone)]
pub struct DataDeriver {
    backend: Option<Arc<dyn GenerationBackend>>,
    model: String,
}

impl DataDeriver {
    /// Deriver using only the offline heuristic.
    pub fn heuristic_only() -> Self {
        Self {
            backend: None,
            model: String::new(),
        }
    }

    /// Deriver preferring the given provider backend.
    pub fn with_backend(backend: Arc<dyn GenerationBackend>, model: impl Into<String>) -> Self {
        Self {
            backend: Some(backend),
            model: model.into(),
        }
    }

    /// Derive structured data from extracted text. Never fails: any
    /// provider problem falls back to the heuristic.
    pub async fn derive(&self, name: &str, text: &str) -> ExtractedData {
        if let Some(backend) = &self.backend {
            let request = GenerationRequest {
                model: self.model.clone(),
                system: "You are a precise document analyst. Respond with JSON only.".to_string(),
                prompt: build_derivation_prompt(name, text),
                temperature: 0.2,
            };
            match backend.generate(request).await {
                Ok(response) => {
                    if let Some(derived) = parse_derived(&response.text) {
                        debug!(backend = backend.name(), "derivation: provider path used");
                        return derived;
                    }
                    warn!("derivation: provider response unparseable, using heuristic");
                }
                Err(e) => {
                    warn!(error = %e, "derivation: provider failed, using heuristic");
                }
            }
        }
        heuristic_derive(name, text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scriven_inference::MockGenerationBackend;

    const SAMPLE: &str = "Acme Corp quarterly review\n\nThe team at Acme Corp uses agile \
                          sprints of 2 weeks. Results this quarter were excellent and growth \
                          continued. Jane Doe presented the roadmap.";

    #[test]
    fn test_parse_derived_plain_json() {
        let raw = r#"{"title":"T","summary":"S","key_points":["a"],"entities":["Acme"],"sentiment":"positive"}"#;
        let data = parse_derived(raw).unwrap();
        assert_eq!(data.title, "T");
        assert_eq!(data.sentiment, Sentiment::Positive);
        assert_eq!(data.entities, vec!["Acme"]);
    }

    #[test]
    fn test_parse_derived_with_code_fence() {
        let raw = "Here you go:\n```json\n{\"title\":\"T\",\"summary\":\"S\"}\n```";
        let data = parse_derived(raw).unwrap();
        assert_eq!(data.title, "T");
        assert_eq!(data.sentiment, Sentiment::Neutral);
    }

    #[test]
    fn test_parse_derived_garbage_is_none() {
        assert!(parse_derived("no json here").is_none());
        assert!(parse_derived("{broken").is_none());
    }

    #[test]
    fn test_parse_derived_truncates_summary() {
        let long = "x".repeat(2000);
        let raw = format!("{{\"summary\":\"{}\"}}", long);
        let data = parse_derived(&raw).unwrap();
        assert_eq!(data.summary.len(), defaults::SUMMARY_MAX_CHARS);
    }

    #[test]
    fn test_heuristic_title_from_first_line() {
        let data = heuristic_derive("file.txt", SAMPLE);
        assert_eq!(data.title, "Acme Corp quarterly review");
    }

    #[test]
    fn test_heuristic_title_falls_back_to_name() {
        let data = heuristic_derive("notes.txt", "");
        assert_eq!(data.title, "notes.txt");
    }

    #[test]
    fn test_heuristic_key_points_nonempty() {
        let data = heuristic_derive("file.txt", SAMPLE);
        assert!(!data.key_points.is_empty());
        assert!(data.key_points.iter().any(|p| p.contains("sprints")));
    }

    #[test]
    fn test_heuristic_entities_found() {
        let data = heuristic_derive("file.txt", SAMPLE);
        assert!(data.entities.iter().any(|e| e.contains("Acme")));
        assert!(data.entities.iter().any(|e| e.contains("Jane Doe")));
    }

    #[test]
    fn test_heuristic_sentiment_positive() {
        let data = heuristic_derive("file.txt", SAMPLE);
        assert_eq!(data.sentiment, Sentiment::Positive);
    }

    #[test]
    fn test_heuristic_sentiment_negative() {
        let data = heuristic_derive("f", "a poor result, the project was a failure and a loss");
        assert_eq!(data.sentiment, Sentiment::Negative);
    }

    #[tokio::test]
    async fn test_deriver_uses_provider_json() {
        let backend = MockGenerationBackend::new().with_default_response(
            r#"{"title":"Provider title","summary":"s","key_points":["p"],"entities":[],"sentiment":"neutral"}"#,
        );
        let deriver = DataDeriver::with_backend(Arc::new(backend), "m");
        let data = deriver.derive("file.txt", SAMPLE).await;
        assert_eq!(data.title, "Provider title");
    }

    #[tokio::test]
    async fn test_deriver_falls_back_on_provider_failure() {
        let backend = MockGenerationBackend::new().with_failures(10);
        let deriver = DataDeriver::with_backend(Arc::new(backend), "m");
        let data = deriver.derive("file.txt", SAMPLE).await;
        assert_eq!(data.title, "Acme Corp quarterly review");
    }

    #[tokio::test]
    async fn test_deriver_falls_back_on_unparseable_response() {
        let backend = MockGenerationBackend::new().with_default_response("not json");
        let deriver = DataDeriver::with_backend(Arc::new(backend), "m");
        let data = deriver.derive("file.txt", SAMPLE).await;
        assert_eq!(data.title, "Acme Corp quarterly review");
    }

    #[tokio::test]
    async fn test_heuristic_only_never_fails() {
        let deriver = DataDeriver::heuristic_only();
        let data = deriver.derive("empty.txt", "").await;
        assert_eq!(data.title, "empty.txt");
        assert!(data.key_points.is_empty());
    }
}
