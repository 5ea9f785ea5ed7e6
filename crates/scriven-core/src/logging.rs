//! Structured logging field name constants.
//!
//! All crates use these constants so log aggregation tools can query by
//! standardized field names across every subsystem.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, automatic fallback applied |
//! | INFO  | Lifecycle events, operation completions |
//! | DEBUG | Decision points, intermediate values, config choices |
//! | TRACE | Per-item iteration, high-volume data (search hits) |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Correlation ID propagated across a service call and its sub-calls.
/// Format: UUIDv7 (time-ordered).
pub const REQUEST_ID: &str = "request_id";

/// Tenant key the operation runs under.
pub const TENANT: &str = "tenant";

/// Subsystem originating the log event.
/// Values: "store", "index", "extract", "inference", "synthesis", "service"
pub const SUBSYSTEM: &str = "subsystem";

/// Logical operation name.
/// Examples: "upload", "search", "generate", "transition"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Knowledge or generated document UUID being operated on.
pub const DOCUMENT_ID: &str = "document_id";

/// Content-store reference being read or written.
pub const CONTENT_REF: &str = "content_ref";

/// Media kind of the document being processed.
pub const MEDIA_KIND: &str = "media_kind";

/// Search query text.
pub const QUERY: &str = "query";

/// Generative model name.
pub const MODEL: &str = "model";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of results returned by a search or bulk operation.
pub const RESULT_COUNT: &str = "result_count";

/// Byte size of stored or extracted content.
pub const SIZE_BYTES: &str = "size_bytes";

/// Retry attempt number (1-based).
pub const ATTEMPT: &str = "attempt";

/// Byte length of a prompt sent to the provider.
pub const PROMPT_LEN: &str = "prompt_len";

/// Byte length of a provider response.
pub const RESPONSE_LEN: &str = "response_len";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Whether the operation succeeded.
pub const SUCCESS: &str = "success";

/// Error message on failure paths.
pub const ERROR: &str = "error";
