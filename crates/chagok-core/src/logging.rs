//! Structured logging schema and field name constants for chagok.
//!
//! All crates use these constants for consistent structured logging fields,
//! so log aggregation can query by standardized names across subsystems.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, automatic fallback applied |
//! | INFO  | Lifecycle events, operation completions, status transitions |
//! | DEBUG | Decision points, routing choices, intermediate values |
//! | TRACE | Per-item iteration, high-volume data (search hits, excerpts) |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Correlation ID propagated across request → worker invocation.
/// Format: UUIDv7 (time-ordered).
pub const REQUEST_ID: &str = "request_id";

/// Subsystem originating the log event.
/// Values: "api", "db", "storage", "index", "inference", "worker"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "router", "result_writer", "presign", "pool", "draft"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "request_upload", "commit", "list_evidence", "generate_draft"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Case identifier being operated on.
pub const CASE_ID: &str = "case_id";

/// Evidence identifier being operated on.
pub const EVIDENCE_ID: &str = "evidence_id";

/// Blob storage object key.
pub const OBJECT_KEY: &str = "object_key";

/// Routed media type ("text", "image", "audio", "video", "pdf").
pub const MEDIA_TYPE: &str = "media_type";

/// Evidence status after a transition.
pub const STATUS: &str = "status";

/// Acting user identifier.
pub const USER_ID: &str = "user_id";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of results returned by a query or search.
pub const RESULT_COUNT: &str = "result_count";

/// Byte length of a downloaded or parsed blob.
pub const BLOB_BYTES: &str = "blob_bytes";

// ─── Database fields ───────────────────────────────────────────────────────

/// Number of active connections in the pool.
pub const POOL_SIZE: &str = "pool_size";

/// Number of idle connections in the pool.
pub const POOL_IDLE: &str = "pool_idle";

// ─── Inference fields ──────────────────────────────────────────────────────

/// Model name used for inference.
pub const MODEL: &str = "model";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Boolean success/failure indicator.
pub const SUCCESS: &str = "success";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";
