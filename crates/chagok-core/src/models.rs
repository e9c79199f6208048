//! Data model for cases, evidence records, vector documents, and drafts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Cases and membership
// ---------------------------------------------------------------------------

/// Lifecycle status of a case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseStatus {
    Active,
    Closed,
}

impl CaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Closed => "closed",
        }
    }
}

/// Role of a user within a case.
///
/// Ordered: `Viewer < Member < Owner`. Upload and draft generation require
/// at least `Member`; closing a case requires `Owner`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseRole {
    Viewer,
    Member,
    Owner,
}

impl CaseRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Viewer => "viewer",
            Self::Member => "member",
            Self::Owner => "owner",
        }
    }

    /// Parse a role string from the database. Unknown values degrade to
    /// the least-privileged role.
    pub fn from_str_lossy(s: &str) -> Self {
        match s {
            "owner" => Self::Owner,
            "member" => Self::Member,
            _ => Self::Viewer,
        }
    }
}

/// A divorce-litigation matter; the access-control and data-isolation
/// boundary for everything else in the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Case {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub status: CaseStatus,
    pub owner_id: String,
    /// Reference to the case's vector index, set on first evidence upload
    /// and cleared when the case closes. `None` means no index exists.
    #[serde(default)]
    pub search_index_ref: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub closed_at: Option<DateTime<Utc>>,
}

/// Membership of a user in a case.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseMember {
    pub case_id: String,
    pub user_id: String,
    pub role: CaseRole,
    pub added_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Evidence records
// ---------------------------------------------------------------------------

/// Media type of an uploaded evidence file, as routed by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    Text,
    Image,
    Audio,
    Video,
    Pdf,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::Audio => "audio",
            Self::Video => "video",
            Self::Pdf => "pdf",
        }
    }

    pub fn from_str_opt(s: &str) -> Option<Self> {
        match s {
            "text" => Some(Self::Text),
            "image" => Some(Self::Image),
            "audio" => Some(Self::Audio),
            "video" => Some(Self::Video),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }

    /// The closed extension table mapping file extensions to media types.
    /// Case-insensitive; anything outside the table is `None`, never a
    /// silent default.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "txt" => Some(Self::Text),
            "jpg" | "jpeg" | "png" => Some(Self::Image),
            "mp3" | "wav" | "m4a" => Some(Self::Audio),
            "mp4" | "mov" => Some(Self::Video),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }
}

impl std::fmt::Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Evidence lifecycle status.
///
/// State machine: `uploading → queued → processing → {completed | failed |
/// review_needed}`. The only backward edge is the operator-triggered
/// `failed → queued` retry. `completed` and `failed` are terminal for UI
/// polling purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceStatus {
    Uploading,
    Queued,
    Processing,
    Completed,
    Failed,
    ReviewNeeded,
}

impl EvidenceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uploading => "uploading",
            Self::Queued => "queued",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::ReviewNeeded => "review_needed",
        }
    }

    pub fn from_str_opt(s: &str) -> Option<Self> {
        match s {
            "uploading" => Some(Self::Uploading),
            "queued" => Some(Self::Queued),
            "processing" => Some(Self::Processing),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            "review_needed" => Some(Self::ReviewNeeded),
            _ => None,
        }
    }

    /// Terminal states end frontend polling.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Progress rank used to enforce monotonicity.
    fn rank(&self) -> u8 {
        match self {
            Self::Uploading => 0,
            Self::Queued => 1,
            Self::Processing => 2,
            Self::Completed | Self::Failed | Self::ReviewNeeded => 3,
        }
    }

    /// Whether a transition to `next` is permitted.
    ///
    /// Forward moves and same-state re-application (idempotent redelivery)
    /// are allowed; the single backward edge is `failed → queued`.
    pub fn can_transition_to(&self, next: EvidenceStatus) -> bool {
        if *self == next {
            return true;
        }
        if *self == Self::Failed && next == Self::Queued {
            return true;
        }
        next.rank() > self.rank()
    }
}

impl std::fmt::Display for EvidenceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One evidence item: an uploaded file plus its AI-derived analysis.
///
/// Keyed by `(case_id, evidence_id)`. Created as a `queued` placeholder by
/// the presigned-URL issuer (or lazily by the worker for legacy keys) and
/// mutated only by the worker's result writer afterwards. Never hard-deleted;
/// case closure sets `deleted_at`.
///
/// The serialized shape is the persisted/external JSON contract:
/// `{case_id, evidence_id, type, timestamp, speaker, labels, ai_summary,
/// insights, content, s3_key, status, vector_id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceRecord {
    pub case_id: String,
    pub evidence_id: String,
    #[serde(rename = "type")]
    pub media_type: MediaType,
    /// Upload time; listing sorts ascending on this, not on completion time.
    #[serde(rename = "timestamp")]
    pub uploaded_at: DateTime<Utc>,
    #[serde(default)]
    pub speaker: Option<String>,
    /// Content classification tags (e.g. verbal-abuse categories).
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub ai_summary: Option<String>,
    #[serde(default)]
    pub insights: Vec<String>,
    /// Extracted full-text content.
    #[serde(default)]
    pub content: Option<String>,
    #[serde(rename = "s3_key")]
    pub storage_key: String,
    pub status: EvidenceStatus,
    /// Human-readable reason recorded when status is `failed`.
    #[serde(default)]
    pub failure_reason: Option<String>,
    /// Pointer to the vector document in the case index, once written.
    #[serde(default)]
    pub vector_id: Option<String>,
    /// SHA-256 of the last committed analysis payload. Redelivered commits
    /// with a matching hash are no-ops.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl EvidenceRecord {
    /// Build the `queued` placeholder row created alongside a presigned URL,
    /// so the frontend can immediately render a pending entry.
    pub fn placeholder(
        case_id: &str,
        evidence_id: &str,
        media_type: MediaType,
        storage_key: &str,
    ) -> Self {
        Self {
            case_id: case_id.to_string(),
            evidence_id: evidence_id.to_string(),
            media_type,
            uploaded_at: Utc::now(),
            speaker: None,
            labels: Vec::new(),
            ai_summary: None,
            insights: Vec::new(),
            content: None,
            storage_key: storage_key.to_string(),
            status: EvidenceStatus::Queued,
            failure_reason: None,
            vector_id: None,
            result_hash: None,
            deleted_at: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Analysis results (worker → result writer)
// ---------------------------------------------------------------------------

/// Successful analysis payload produced by a parser adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSuccess {
    /// Extracted full-text content.
    pub content: String,
    /// AI summary of the evidence.
    pub summary: String,
    /// Content classification labels.
    pub labels: Vec<String>,
    /// Free-form analysis observations.
    pub insights: Vec<String>,
    /// Dominant speaker, when the adapter can attribute one.
    pub speaker: Option<String>,
    /// Embedding vector for the case index.
    pub embedding: Vec<f32>,
}

/// Outcome of one worker invocation for one object, fed to the result writer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AnalysisOutcome {
    Success(AnalysisSuccess),
    /// Adapter or routing failure with a human-readable reason. Never
    /// retried automatically; the operator re-uploads or re-queues.
    Failure { reason: String },
}

// ---------------------------------------------------------------------------
// Vector documents
// ---------------------------------------------------------------------------

/// One document per evidence record in the per-case vector index.
///
/// Written by the worker, queried read-only by the draft composer, and
/// destroyed wholesale (index-level) when the case closes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorDocument {
    pub id: String,
    pub case_id: String,
    pub evidence_id: String,
    pub content: String,
    pub labels: Vec<String>,
    pub speaker: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub embedding: Vec<f32>,
}

/// A scored hit from a semantic query against a case index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorSearchHit {
    pub document: VectorDocument,
    pub score: f32,
}

// ---------------------------------------------------------------------------
// Draft preview
// ---------------------------------------------------------------------------

/// A citation pairing an evidence id with a quoted excerpt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftCitation {
    pub evidence_id: String,
    pub quote: String,
    #[serde(default)]
    pub labels: Vec<String>,
}

/// Ephemeral draft preview value object. Never persisted, never auto-filed;
/// produced per request for human review only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftPreview {
    pub case_id: String,
    pub draft_text: String,
    pub citations: Vec<DraftCitation>,
    pub generated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_ordering() {
        assert!(CaseRole::Viewer < CaseRole::Member);
        assert!(CaseRole::Member < CaseRole::Owner);
        assert!(CaseRole::Owner >= CaseRole::Member);
    }

    #[test]
    fn test_role_from_str_lossy() {
        assert_eq!(CaseRole::from_str_lossy("owner"), CaseRole::Owner);
        assert_eq!(CaseRole::from_str_lossy("member"), CaseRole::Member);
        assert_eq!(CaseRole::from_str_lossy("viewer"), CaseRole::Viewer);
        assert_eq!(CaseRole::from_str_lossy("bogus"), CaseRole::Viewer);
    }

    #[test]
    fn test_media_type_round_trip() {
        for mt in [
            MediaType::Text,
            MediaType::Image,
            MediaType::Audio,
            MediaType::Video,
            MediaType::Pdf,
        ] {
            assert_eq!(MediaType::from_str_opt(mt.as_str()), Some(mt));
        }
        assert_eq!(MediaType::from_str_opt("docx"), None);
    }

    #[test]
    fn test_media_type_from_extension() {
        assert_eq!(MediaType::from_extension("txt"), Some(MediaType::Text));
        assert_eq!(MediaType::from_extension("JPEG"), Some(MediaType::Image));
        assert_eq!(MediaType::from_extension("m4a"), Some(MediaType::Audio));
        assert_eq!(MediaType::from_extension("mov"), Some(MediaType::Video));
        assert_eq!(MediaType::from_extension("pdf"), Some(MediaType::Pdf));
        assert_eq!(MediaType::from_extension("docx"), None);
        assert_eq!(MediaType::from_extension("exe"), None);
    }

    #[test]
    fn test_status_terminal() {
        assert!(EvidenceStatus::Completed.is_terminal());
        assert!(EvidenceStatus::Failed.is_terminal());
        assert!(!EvidenceStatus::ReviewNeeded.is_terminal());
        assert!(!EvidenceStatus::Processing.is_terminal());
        assert!(!EvidenceStatus::Queued.is_terminal());
    }

    #[test]
    fn test_status_forward_transitions() {
        use EvidenceStatus::*;
        assert!(Uploading.can_transition_to(Queued));
        assert!(Queued.can_transition_to(Processing));
        assert!(Processing.can_transition_to(Completed));
        assert!(Processing.can_transition_to(Failed));
        assert!(Processing.can_transition_to(ReviewNeeded));
        assert!(Uploading.can_transition_to(Completed));
    }

    #[test]
    fn test_status_backward_transitions_rejected() {
        use EvidenceStatus::*;
        assert!(!Completed.can_transition_to(Queued));
        assert!(!Completed.can_transition_to(Processing));
        assert!(!Processing.can_transition_to(Queued));
        assert!(!Queued.can_transition_to(Uploading));
        assert!(!ReviewNeeded.can_transition_to(Processing));
    }

    #[test]
    fn test_status_failed_retry_edge() {
        assert!(EvidenceStatus::Failed.can_transition_to(EvidenceStatus::Queued));
        // The retry edge is exclusive to failed
        assert!(!EvidenceStatus::Completed.can_transition_to(EvidenceStatus::Queued));
        assert!(!EvidenceStatus::ReviewNeeded.can_transition_to(EvidenceStatus::Queued));
    }

    #[test]
    fn test_status_same_state_reapply() {
        // Idempotent redelivery re-applies the same terminal state
        assert!(EvidenceStatus::Completed.can_transition_to(EvidenceStatus::Completed));
        assert!(EvidenceStatus::Failed.can_transition_to(EvidenceStatus::Failed));
    }

    #[test]
    fn test_status_serde_snake_case() {
        let json = serde_json::to_string(&EvidenceStatus::ReviewNeeded).unwrap();
        assert_eq!(json, "\"review_needed\"");
        let back: EvidenceStatus = serde_json::from_str("\"queued\"").unwrap();
        assert_eq!(back, EvidenceStatus::Queued);
    }

    #[test]
    fn test_evidence_record_external_shape() {
        let record = EvidenceRecord::placeholder(
            "case_1",
            "ev_abc123def456",
            MediaType::Image,
            "cases/case_1/raw/ev_abc123def456_photo.jpg",
        );
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["case_id"], "case_1");
        assert_eq!(json["evidence_id"], "ev_abc123def456");
        assert_eq!(json["type"], "image");
        assert_eq!(json["s3_key"], "cases/case_1/raw/ev_abc123def456_photo.jpg");
        assert_eq!(json["status"], "queued");
        assert!(json["timestamp"].is_string());
        assert!(json["labels"].as_array().unwrap().is_empty());
        assert!(json["insights"].as_array().unwrap().is_empty());
        // Internal bookkeeping stays out of the external shape when unset
        assert!(json.get("result_hash").is_none());
        assert!(json.get("deleted_at").is_none());
    }

    #[test]
    fn test_evidence_record_deserialize_minimal() {
        let json = serde_json::json!({
            "case_id": "c1",
            "evidence_id": "ev_000000000001",
            "type": "text",
            "timestamp": "2025-06-01T12:00:00Z",
            "s3_key": "cases/c1/raw/chat.txt",
            "status": "completed"
        });
        let record: EvidenceRecord = serde_json::from_value(json).unwrap();
        assert_eq!(record.media_type, MediaType::Text);
        assert_eq!(record.status, EvidenceStatus::Completed);
        assert!(record.labels.is_empty());
        assert!(record.speaker.is_none());
        assert!(record.result_hash.is_none());
    }

    #[test]
    fn test_placeholder_defaults() {
        let rec = EvidenceRecord::placeholder("c1", "ev_1", MediaType::Pdf, "cases/c1/raw/x.pdf");
        assert_eq!(rec.status, EvidenceStatus::Queued);
        assert!(rec.ai_summary.is_none());
        assert!(rec.content.is_none());
        assert!(rec.vector_id.is_none());
        assert!(rec.deleted_at.is_none());
    }
}
