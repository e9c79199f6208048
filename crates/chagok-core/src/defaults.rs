//! Default values and environment variable names used across the workspace.

// ─── Presigned upload credentials ──────────────────────────────────────────

/// Hard upper bound on presigned URL validity, in seconds (5 minutes).
/// Requests asking for more are clamped, never rejected.
pub const PRESIGN_MAX_EXPIRY_SECS: u64 = 300;

/// Maximum accepted upload size in bytes (100 MB), signed into every
/// presigned PUT credential.
pub const UPLOAD_MAX_BYTES: u64 = 100 * 1024 * 1024;

// ─── Auth tokens ───────────────────────────────────────────────────────────

/// Bearer token lifetime in seconds (24 hours).
pub const TOKEN_TTL_SECS: i64 = 24 * 60 * 60;

// ─── Draft composer ────────────────────────────────────────────────────────

/// Top-k semantic hits when a fault-cause section is requested.
pub const DRAFT_TOP_K_FOCUSED: usize = 10;

/// Top-k semantic hits for general section queries.
pub const DRAFT_TOP_K_GENERAL: usize = 5;

/// Maximum characters of evidence content included per prompt excerpt.
pub const DRAFT_EXCERPT_MAX_CHARS: usize = 500;

/// Maximum characters of a citation quote returned to the caller.
pub const CITATION_QUOTE_MAX_CHARS: usize = 200;

/// The fault-cause section name ("grounds for claim") that triggers the
/// focused retrieval query.
pub const SECTION_FAULT_CAUSE: &str = "청구원인";

// ─── Vector index ──────────────────────────────────────────────────────────

/// Prefix for per-case index names: `{prefix}{case_id}`.
pub const INDEX_NAME_PREFIX: &str = "case_";

/// Embedding dimensionality expected by the index.
pub const EMBEDDING_DIM: usize = 1536;

// ─── API server ────────────────────────────────────────────────────────────

/// Default bind address for the API server.
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";

/// Request body size limit for the API server, in bytes.
pub const API_BODY_LIMIT_BYTES: usize = 2 * 1024 * 1024;

// ─── Environment variable names ────────────────────────────────────────────

pub const ENV_DATABASE_URL: &str = "DATABASE_URL";
pub const ENV_BIND_ADDR: &str = "CHAGOK_BIND_ADDR";
pub const ENV_AUTH_SECRET: &str = "CHAGOK_AUTH_SECRET";
pub const ENV_STORAGE_SECRET: &str = "CHAGOK_STORAGE_SECRET";
pub const ENV_STORAGE_BASE_URL: &str = "CHAGOK_STORAGE_BASE_URL";
pub const ENV_STORAGE_ROOT: &str = "CHAGOK_STORAGE_ROOT";
pub const ENV_INDEX_BASE_URL: &str = "CHAGOK_INDEX_BASE_URL";
pub const ENV_INDEX_API_KEY: &str = "CHAGOK_INDEX_API_KEY";
pub const ENV_OPENAI_BASE_URL: &str = "OPENAI_BASE_URL";
pub const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_WHISPER_MODEL: &str = "CHAGOK_WHISPER_MODEL";
pub const ENV_VISION_MODEL: &str = "CHAGOK_VISION_MODEL";
pub const ENV_EMBEDDING_MODEL: &str = "CHAGOK_EMBEDDING_MODEL";
pub const ENV_GENERATION_MODEL: &str = "CHAGOK_GENERATION_MODEL";

// ─── Model defaults ────────────────────────────────────────────────────────

pub const DEFAULT_WHISPER_MODEL: &str = "whisper-1";
pub const DEFAULT_VISION_MODEL: &str = "gpt-4o";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";
pub const DEFAULT_GENERATION_MODEL: &str = "gpt-4o";
