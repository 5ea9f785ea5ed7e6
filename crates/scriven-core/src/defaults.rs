//! Centralized default values.
//!
//! Single source of truth for tunable constants so callers and configs
//! never drift apart. Everything here can be overridden through
//! configuration; these are the values used when nothing else is set.

/// Maximum length of a derived summary, in characters.
pub const SUMMARY_MAX_CHARS: usize = 500;

/// Token budget for source excerpts packed into a synthesis prompt.
pub const CONTEXT_TOKEN_BUDGET: usize = 4000;

/// Maximum number of extractions running at once in batch ingestion.
pub const MAX_CONCURRENT_EXTRACTIONS: usize = 4;

/// Attempts for retryable extraction and synthesis failures.
pub const RETRY_MAX_ATTEMPTS: u32 = 3;

/// Initial retry backoff in milliseconds (doubles per attempt).
pub const RETRY_BASE_DELAY_MS: u64 = 250;

/// Deadline for a single extraction run, in seconds.
pub const EXTRACTION_TIMEOUT_SECS: u64 = 30;

/// Deadline for a single synthesis call, in seconds.
pub const SYNTHESIS_TIMEOUT_SECS: u64 = 60;

/// Per-tenant content-store quota, in bytes (256 MiB).
pub const TENANT_QUOTA_BYTES: i64 = 256 * 1024 * 1024;

/// Default generative model name.
pub const GENERATION_MODEL: &str = "llama3.2";

/// Default generative provider base URL.
pub const PROVIDER_BASE_URL: &str = "http://localhost:11434";

/// HTTP request timeout for provider calls, in seconds.
pub const PROVIDER_REQUEST_TIMEOUT_SECS: u64 = 120;

/// Maximum number of suggestions returned by the advisory suggest call.
pub const SUGGESTION_LIMIT: usize = 5;

/// Characters per token for estimation purposes.
pub const CHARS_PER_TOKEN: f64 = 3.7;
