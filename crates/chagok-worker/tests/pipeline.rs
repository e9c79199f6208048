//! End-to-end worker pipeline tests over in-memory infrastructure.

use std::sync::Arc;

use serde_json::json;

use chagok_core::{
    Case, CaseRepository, CaseStatus, EvidenceRecord, EvidenceRepository, EvidenceStatus,
    MediaType,
};
use chagok_db::{InMemoryCaseRepository, InMemoryEvidenceRepository};
use chagok_index::InMemoryVectorIndex;
use chagok_inference::{MockEmbeddingBackend, MockGenerationBackend, MockTranscriptionBackend, MockVisionBackend};
use chagok_storage::{BlobStore, MemoryBlobStore};
use chagok_worker::{EvidenceAnalyzer, HandlerSummary, ParserRegistry, ResultWriter, UploadHandler};
use chrono::Utc;

const KAKAO_CHAT: &str = "\
[남편] [오후 9:12] 어디야
[남편] [오후 9:13] 왜 전화 안 받아
[아내] [오후 9:40] 회사야";

const ANALYSIS_JSON: &str =
    r#"{"summary": "늦은 밤 반복된 추궁 대화", "labels": ["폭언"], "insights": ["통제적 행동 정황"], "speaker": null}"#;

struct Fixture {
    cases: Arc<InMemoryCaseRepository>,
    evidence: Arc<InMemoryEvidenceRepository>,
    blobs: Arc<MemoryBlobStore>,
    index: Arc<InMemoryVectorIndex>,
    generation: Arc<MockGenerationBackend>,
    handler: UploadHandler,
}

fn fixture() -> Fixture {
    let cases = Arc::new(InMemoryCaseRepository::new());
    let evidence = Arc::new(InMemoryEvidenceRepository::new());
    let blobs = Arc::new(MemoryBlobStore::new());
    let index = Arc::new(InMemoryVectorIndex::new());
    let generation = Arc::new(MockGenerationBackend::new());

    let registry = ParserRegistry::with_backends(
        Arc::new(MockTranscriptionBackend::default()),
        Arc::new(MockVisionBackend::default()),
    );
    let analyzer = EvidenceAnalyzer::new(
        generation.clone(),
        Arc::new(MockEmbeddingBackend::default()),
    );
    let writer = ResultWriter::new(cases.clone(), evidence.clone(), index.clone());
    let handler = UploadHandler::new(blobs.clone(), evidence.clone(), registry, analyzer, writer);

    Fixture {
        cases,
        evidence,
        blobs,
        index,
        generation,
        handler,
    }
}

fn active_case(id: &str, owner: &str) -> Case {
    Case {
        id: id.to_string(),
        title: "이혼 사건".to_string(),
        description: None,
        status: CaseStatus::Active,
        owner_id: owner.to_string(),
        search_index_ref: None,
        created_at: Utc::now(),
        closed_at: None,
    }
}

fn upload_event(key: &str) -> serde_json::Value {
    json!({
        "Records": [{
            "s3": {
                "bucket": {"name": "chagok-evidence"},
                "object": {"key": key}
            }
        }]
    })
}

/// Canonical text upload lands as one completed record with analysis
/// fields, a vector document, and the case's index reference set.
#[tokio::test]
async fn test_canonical_text_upload_completes() {
    let fx = fixture();
    fx.cases.create(&active_case("c1", "u1")).await.unwrap();

    let key = "cases/c1/raw/ev_0123456789ab_chat.txt";
    fx.evidence
        .insert(&EvidenceRecord::placeholder(
            "c1",
            "ev_0123456789ab",
            MediaType::Text,
            key,
        ))
        .await
        .unwrap();
    fx.blobs.put(key, KAKAO_CHAT.as_bytes()).await.unwrap();
    fx.generation.push_response(ANALYSIS_JSON);

    let summary = fx.handler.handle_event(&upload_event(key)).await;
    assert_eq!(
        summary,
        HandlerSummary {
            processed: 1,
            skipped: 0,
            errors: 0
        }
    );

    let list = fx.evidence.list_by_case("c1").await.unwrap();
    assert_eq!(list.len(), 1);
    let rec = &list[0];
    assert_eq!(rec.status, EvidenceStatus::Completed);
    assert_eq!(rec.content.as_deref(), Some(KAKAO_CHAT));
    assert_eq!(rec.ai_summary.as_deref(), Some("늦은 밤 반복된 추궁 대화"));
    // Conversation marker from the parser, content label from the model
    assert!(rec.labels.contains(&"대화기록".to_string()));
    assert!(rec.labels.contains(&"폭언".to_string()));
    assert_eq!(rec.speaker.as_deref(), Some("남편"));
    assert_eq!(rec.vector_id.as_deref(), Some("vec_ev_0123456789ab"));
    assert!(rec.result_hash.is_some());

    // Vector document exists and the case now points at its index
    assert_eq!(fx.index.document_count("c1").await, 1);
    let case = fx.cases.get("c1").await.unwrap().unwrap();
    assert_eq!(case.search_index_ref.as_deref(), Some("case_c1"));
}

/// Redelivered events re-run analysis but the identical result is a
/// committed no-op: still one record, one vector document, same hash.
#[tokio::test]
async fn test_redelivery_is_idempotent() {
    let fx = fixture();
    fx.cases.create(&active_case("c1", "u1")).await.unwrap();

    let key = "cases/c1/raw/ev_0123456789ab_chat.txt";
    fx.evidence
        .insert(&EvidenceRecord::placeholder(
            "c1",
            "ev_0123456789ab",
            MediaType::Text,
            key,
        ))
        .await
        .unwrap();
    fx.blobs.put(key, KAKAO_CHAT.as_bytes()).await.unwrap();

    fx.generation.push_response(ANALYSIS_JSON);
    fx.handler.handle_event(&upload_event(key)).await;
    let first = fx.evidence.get("c1", "ev_0123456789ab").await.unwrap().unwrap();

    // Same analysis on redelivery
    fx.generation.push_response(ANALYSIS_JSON);
    let summary = fx.handler.handle_event(&upload_event(key)).await;
    assert_eq!(summary.processed, 1);
    assert_eq!(summary.errors, 0);

    let second = fx.evidence.get("c1", "ev_0123456789ab").await.unwrap().unwrap();
    assert_eq!(second.result_hash, first.result_hash);
    assert_eq!(second.status, EvidenceStatus::Completed);
    assert_eq!(fx.evidence.len().await, 1);
    assert_eq!(fx.index.document_count("c1").await, 1);
}

/// Legacy key shape (no embedded evidence id): the writer falls back to
/// creating a record, and exactly one record exists afterward.
#[tokio::test]
async fn test_legacy_key_creates_exactly_one_record() {
    let fx = fixture();
    fx.cases.create(&active_case("c1", "u1")).await.unwrap();

    let key = "cases/c1/raw/recording.mp3";
    fx.blobs.put(key, b"ID3 fake audio").await.unwrap();
    fx.generation.push_response(ANALYSIS_JSON);

    let summary = fx.handler.handle_event(&upload_event(key)).await;
    assert_eq!(summary.processed, 1);

    let list = fx.evidence.list_by_case("c1").await.unwrap();
    assert_eq!(list.len(), 1, "fallback must create one record, not two");
    let rec = &list[0];
    assert_eq!(rec.media_type, MediaType::Audio);
    assert_eq!(rec.status, EvidenceStatus::Completed);
    assert!(rec.evidence_id.starts_with("ev_"));
    assert_eq!(rec.storage_key, key);
}

/// Analysis failure marks the record failed with a reason; an operator
/// re-queue followed by a successful run completes it and clears the
/// reason.
#[tokio::test]
async fn test_failed_retry_round_trip() {
    let fx = fixture();
    fx.cases.create(&active_case("c1", "u1")).await.unwrap();

    let key = "cases/c1/raw/ev_0123456789ab_memo.txt";
    fx.evidence
        .insert(&EvidenceRecord::placeholder(
            "c1",
            "ev_0123456789ab",
            MediaType::Text,
            key,
        ))
        .await
        .unwrap();
    fx.blobs.put(key, "짧은 메모".as_bytes()).await.unwrap();

    // Model returns non-JSON prose; analysis fails
    fx.generation.push_response("분석이 불가능합니다.");
    fx.handler.handle_event(&upload_event(key)).await;

    let failed = fx.evidence.get("c1", "ev_0123456789ab").await.unwrap().unwrap();
    assert_eq!(failed.status, EvidenceStatus::Failed);
    assert!(failed.failure_reason.as_deref().unwrap().contains("analysis"));

    // Operator retry: failed -> queued is the one legal backward edge
    fx.evidence
        .set_status("c1", "ev_0123456789ab", EvidenceStatus::Queued, None)
        .await
        .unwrap();

    fx.generation.push_response(ANALYSIS_JSON);
    fx.handler.handle_event(&upload_event(key)).await;

    let completed = fx.evidence.get("c1", "ev_0123456789ab").await.unwrap().unwrap();
    assert_eq!(completed.status, EvidenceStatus::Completed);
    assert!(completed.failure_reason.is_none());
}

/// Unsupported extension on a canonical key fails the placeholder with a
/// reason instead of guessing a parser.
#[tokio::test]
async fn test_unsupported_extension_fails_placeholder() {
    let fx = fixture();
    fx.cases.create(&active_case("c1", "u1")).await.unwrap();

    let key = "cases/c1/raw/ev_0123456789ab_report.docx";
    fx.evidence
        .insert(&EvidenceRecord::placeholder(
            "c1",
            "ev_0123456789ab",
            MediaType::Text,
            key,
        ))
        .await
        .unwrap();

    let summary = fx.handler.handle_event(&upload_event(key)).await;
    assert_eq!(summary.processed, 1);

    let rec = fx.evidence.get("c1", "ev_0123456789ab").await.unwrap().unwrap();
    assert_eq!(rec.status, EvidenceStatus::Failed);
    assert!(rec
        .failure_reason
        .as_deref()
        .unwrap()
        .contains("unsupported media type"));
}

/// A legacy key with an unsupported extension has no record to fail; it is
/// skipped, and nothing is created.
#[tokio::test]
async fn test_legacy_unsupported_extension_skipped() {
    let fx = fixture();
    fx.cases.create(&active_case("c1", "u1")).await.unwrap();

    let summary = fx
        .handler
        .handle_event(&upload_event("cases/c1/raw/archive.zip"))
        .await;
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.processed, 0);
    assert!(fx.evidence.is_empty().await);
}

/// Keys outside the evidence grammar and non-storage events are ignored
/// without touching any state.
#[tokio::test]
async fn test_foreign_keys_and_events_ignored() {
    let fx = fixture();

    let summary = fx
        .handler
        .handle_event(&upload_event("uploads/random.txt"))
        .await;
    assert_eq!(summary.skipped, 1);

    let summary = fx.handler.handle_event(&json!({"ping": true})).await;
    assert_eq!(summary, HandlerSummary::default());
    assert!(fx.evidence.is_empty().await);
}

/// A missing blob is an infrastructure error, not an analysis failure: the
/// invocation counts it and the record stays `processing` for redelivery.
#[tokio::test]
async fn test_missing_blob_is_an_error() {
    let fx = fixture();
    fx.cases.create(&active_case("c1", "u1")).await.unwrap();

    let key = "cases/c1/raw/ev_0123456789ab_chat.txt";
    fx.evidence
        .insert(&EvidenceRecord::placeholder(
            "c1",
            "ev_0123456789ab",
            MediaType::Text,
            key,
        ))
        .await
        .unwrap();
    // No blob put

    let summary = fx.handler.handle_event(&upload_event(key)).await;
    assert_eq!(summary.errors, 1);
    assert_eq!(summary.processed, 0);

    let rec = fx.evidence.get("c1", "ev_0123456789ab").await.unwrap().unwrap();
    assert_eq!(rec.status, EvidenceStatus::Processing);
}

/// An invocation that dies mid-processing leaves the record `processing`
/// forever; nothing detects or repairs this automatically. Asserted here
/// as the known behavior, not the desired one.
#[tokio::test]
async fn test_interrupted_processing_stays_processing() {
    let fx = fixture();
    fx.cases.create(&active_case("c1", "u1")).await.unwrap();

    let key = "cases/c1/raw/ev_0123456789ab_clip.mp4";
    fx.evidence
        .insert(&EvidenceRecord::placeholder(
            "c1",
            "ev_0123456789ab",
            MediaType::Video,
            key,
        ))
        .await
        .unwrap();
    fx.evidence
        .set_status("c1", "ev_0123456789ab", EvidenceStatus::Processing, None)
        .await
        .unwrap();

    // The worker invocation was killed here; no commit ever arrives.
    let rec = fx.evidence.get("c1", "ev_0123456789ab").await.unwrap().unwrap();
    assert_eq!(rec.status, EvidenceStatus::Processing);
    assert!(!rec.status.is_terminal(), "pollers will wait on this forever");
}

/// One malformed record in a batch does not block the others.
#[tokio::test]
async fn test_mixed_batch_partial_success() {
    let fx = fixture();
    fx.cases.create(&active_case("c1", "u1")).await.unwrap();

    let good_key = "cases/c1/raw/ev_0123456789ab_chat.txt";
    fx.evidence
        .insert(&EvidenceRecord::placeholder(
            "c1",
            "ev_0123456789ab",
            MediaType::Text,
            good_key,
        ))
        .await
        .unwrap();
    fx.blobs.put(good_key, KAKAO_CHAT.as_bytes()).await.unwrap();
    fx.generation.push_response(ANALYSIS_JSON);

    let event = json!({
        "Records": [
            {"s3": {"bucket": {}}},
            {"s3": {"bucket": {"name": "b"}, "object": {"key": good_key}}}
        ]
    });
    let summary = fx.handler.handle_event(&event).await;
    assert_eq!(summary.processed, 1);
    assert_eq!(summary.skipped, 1);

    let rec = fx.evidence.get("c1", "ev_0123456789ab").await.unwrap().unwrap();
    assert_eq!(rec.status, EvidenceStatus::Completed);
}
