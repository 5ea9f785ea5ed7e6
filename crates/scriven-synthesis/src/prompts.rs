//! Prompt builders and lenient response parsers for synthesis.

use scriven_core::{defaults, truncate_to_tokens, OrganizationProfile};

/// Styles the improve operation recognizes. Anything else falls back to
/// returning the input unchanged.
pub const KNOWN_STYLES: &[&str] = &["formal", "casual", "technical", "concise"];

/// Whether `style` is a recognized improvement style.
pub fn known_style(style: &str) -> bool {
    KNOWN_STYLES.contains(&style.to_lowercase().as_str())
}

/// System prompt carrying the organization profile.
pub fn system_prompt(profile: &OrganizationProfile) -> String {
    let mut prompt = String::from(
        "You are a professional document-writing assistant. Write clear, \
         well-structured business prose.",
    );
    if !profile.name.is_empty() {
        prompt.push_str(&format!(
            "\n\nYou write on behalf of this organization:\nName: {}\nAddress: {}\nEmail: {}\nPhone: {}",
            profile.name, profile.address, profile.email, profile.phone
        ));
        if !profile.legal_ids.is_empty() {
            prompt.push_str(&format!("\nLegal identifiers: {}", profile.legal_ids.join(", ")));
        }
        if !profile.signatory.is_empty() {
            prompt.push_str(&format!("\nDefault signatory: {}", profile.signatory));
        }
    }
    prompt
}

/// User prompt for document generation from a request and source
/// excerpts. Excerpts share a token budget split evenly across sources.
pub fn generation_prompt(request: &str, sources: &[(String, String)]) -> String {
    let mut prompt = String::new();

    if !sources.is_empty() {
        let per_source_budget = defaults::CONTEXT_TOKEN_BUDGET / sources.len().max(1);
        prompt.push_str("Use the following source documents as reference material:\n\n");
        for (name, text) in sources {
            let excerpt = truncate_to_tokens(text, per_source_budget);
            prompt.push_str(&format!("--- Source: {} ---\n{}\n\n", name, excerpt));
        }
    }

    prompt.push_str(&format!(
        "Request:\n{}\n\n\
         Respond in this exact format:\n\
         TITLE: [a short document title]\n\
         CONFIDENCE: [0.0-1.0 number reflecting how well the sources support the request]\n\
         CONTENT:\n\
         [the full document text]",
        request
    ));
    prompt
}

/// Parsed generation reply.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedGeneration {
    pub title: String,
    pub confidence: f32,
    pub content: String,
}

/// Parse a generation reply, tolerating providers that ignore the
/// response format. A reply with no recognizable markers becomes the
/// whole content with moderate confidence.
pub fn parse_generation(raw: &str, fallback_title: &str) -> ParsedGeneration {
    let mut title = String::new();
    let mut confidence = None;
    let mut content_lines: Vec<&str> = Vec::new();
    let mut in_content = false;

    for line in raw.lines() {
        let trimmed = line.trim();
        if in_content {
            content_lines.push(line);
        } else if let Some(rest) = trimmed.strip_prefix("TITLE:") {
            title = rest.trim().to_string();
        } else if let Some(rest) = trimmed.strip_prefix("CONFIDENCE:") {
            confidence = rest.trim().parse::<f32>().ok();
        } else if trimmed.strip_prefix("CONTENT:").is_some() {
            in_content = true;
        }
    }

    let content = if in_content {
        content_lines.join("\n").trim().to_string()
    } else {
        raw.trim().to_string()
    };

    ParsedGeneration {
        title: if title.is_empty() {
            fallback_title.to_string()
        } else {
            title
        },
        confidence: confidence.unwrap_or(0.5).clamp(0.0, 1.0),
        content,
    }
}

/// Short fallback title derived from the request text.
pub fn title_from_request(request: &str) -> String {
    let words: Vec<&str> = request.split_whitespace().take(8).collect();
    let mut title = words.join(" ");
    if request.split_whitespace().count() > 8 {
        title.push_str("...");
    }
    title
}

/// Prompt for the improve operation.
pub fn improve_prompt(text: &str, style: &str) -> String {
    format!(
        "Rewrite the following text in a {} style. Preserve all information \
         and meaning. Output only the rewritten text, no explanations.\n\n{}",
        style.to_lowercase(),
        text
    )
}

/// Prompt for the advisory suggest operation.
pub fn suggest_prompt(context: &str) -> String {
    format!(
        "Given the following working context, suggest up to {} short, \
         concrete next steps. Output one suggestion per line, each \
         starting with \"- \".\n\nContext:\n{}",
        defaults::SUGGESTION_LIMIT,
        truncate_to_tokens(context, defaults::CONTEXT_TOKEN_BUDGET)
    )
}

/// Parse suggestion lines, tolerating bullets, numbering, or bare lines.
pub fn parse_suggestions(raw: &str) -> Vec<String> {
    raw.lines()
        .map(|line| {
            line.trim()
                .trim_start_matches(['-', '*', '•'])
                .trim_start_matches(|c: char| c.is_ascii_digit() || c == '.' || c == ')')
                .trim()
                .to_string()
        })
        .filter(|s| !s.is_empty())
        .take(defaults::SUGGESTION_LIMIT)
        .collect()
}
