//! Draft composer: retrieval-augmented drafting of legal document sections.
//!
//! Per requested section, semantically queries the case's vector index,
//! builds a bounded evidence context, and asks the generation model for a
//! draft. Citations pair each used evidence id with a quoted snippet. The
//! result is ephemeral; nothing here is persisted or filed anywhere.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use chagok_core::defaults::{
    CITATION_QUOTE_MAX_CHARS, DRAFT_EXCERPT_MAX_CHARS, DRAFT_TOP_K_FOCUSED, DRAFT_TOP_K_GENERAL,
    SECTION_FAULT_CAUSE,
};
use chagok_core::{
    DraftCitation, DraftPreview, EvidenceRepository, EvidenceStatus, Result, VectorSearchHit,
};
use chagok_index::CaseVectorIndex;
use chagok_inference::{ChatMessage, EmbeddingBackend, GenerationBackend};

/// Targeted retrieval query for the fault-cause section.
const FAULT_CAUSE_QUERY: &str = "배우자의 유책 사유: 폭언, 폭행, 협박, 외도, 유기, 경제적 통제";

const DRAFT_SYSTEM_PROMPT: &str = "당신은 이혼 소송 서면 작성을 돕는 법률 문서 초안 작성자입니다. \
제공된 증거 발췌만 근거로 요청된 항목의 초안을 작성하세요. 증거를 인용할 때는 증거 번호를 \
명시하세요. 증거에 없는 사실을 만들어내지 마세요. 이 초안은 변호사 검토용입니다.";

/// Returned when a case has no analyzed evidence to draw on.
const EMPTY_EVIDENCE_DRAFT: &str = "분석 완료된 증거가 없어 증거 인용 없이 초안을 작성할 수 \
없습니다. 증거를 업로드하고 분석이 완료된 뒤 다시 시도하세요.";

pub struct DraftComposer {
    evidence: Arc<dyn EvidenceRepository>,
    index: Arc<dyn CaseVectorIndex>,
    embedding: Arc<dyn EmbeddingBackend>,
    generation: Arc<dyn GenerationBackend>,
}

impl DraftComposer {
    pub fn new(
        evidence: Arc<dyn EvidenceRepository>,
        index: Arc<dyn CaseVectorIndex>,
        embedding: Arc<dyn EmbeddingBackend>,
        generation: Arc<dyn GenerationBackend>,
    ) -> Self {
        Self {
            evidence,
            index,
            embedding,
            generation,
        }
    }

    /// Compose a draft preview for the requested sections.
    ///
    /// A case with no completed evidence yields an explicit empty-evidence
    /// draft with zero citations, not an error. Downstream model failures
    /// propagate as retryable errors.
    pub async fn compose(&self, case_id: &str, sections: &[String]) -> Result<DraftPreview> {
        let records = self.evidence.list_by_case(case_id).await?;
        let has_completed = records
            .iter()
            .any(|r| r.status == EvidenceStatus::Completed);

        if !has_completed {
            info!(
                subsystem = "api",
                component = "draft",
                case_id = %case_id,
                "No completed evidence; returning citation-free draft"
            );
            return Ok(DraftPreview {
                case_id: case_id.to_string(),
                draft_text: EMPTY_EVIDENCE_DRAFT.to_string(),
                citations: Vec::new(),
                generated_at: Utc::now(),
            });
        }

        let hits = self.retrieve(case_id, sections).await?;
        let context = format_context(&hits);
        let citations = build_citations(&hits);

        let user_prompt = format!(
            "작성할 항목: {}\n\n증거 발췌:\n{}",
            sections.join(", "),
            context
        );
        let messages = [
            ChatMessage::system(DRAFT_SYSTEM_PROMPT),
            ChatMessage::user(user_prompt),
        ];
        let draft_text = self.generation.complete(&messages).await?;

        info!(
            subsystem = "api",
            component = "draft",
            case_id = %case_id,
            result_count = citations.len(),
            model = self.generation.model_name(),
            "Draft composed"
        );

        Ok(DraftPreview {
            case_id: case_id.to_string(),
            draft_text,
            citations,
            generated_at: Utc::now(),
        })
    }

    /// Run one semantic query per section and merge the hits, best score
    /// first, deduplicated by evidence id.
    async fn retrieve(&self, case_id: &str, sections: &[String]) -> Result<Vec<VectorSearchHit>> {
        let mut merged: Vec<VectorSearchHit> = Vec::new();

        for section in sections {
            let (query, top_k) = if section == SECTION_FAULT_CAUSE {
                (FAULT_CAUSE_QUERY.to_string(), DRAFT_TOP_K_FOCUSED)
            } else {
                (sections.join(" "), DRAFT_TOP_K_GENERAL)
            };

            let embedding = self.embedding.embed(&query).await?;
            let hits = self.index.search(case_id, &embedding, top_k).await?;
            if hits.is_empty() {
                warn!(
                    subsystem = "api",
                    component = "draft",
                    case_id = %case_id,
                    section = %section,
                    "Section query returned no hits"
                );
            }
            merged.extend(hits);
        }

        merged.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        let mut seen = std::collections::HashSet::new();
        merged.retain(|hit| seen.insert(hit.document.evidence_id.clone()));
        Ok(merged)
    }
}

/// Numbered evidence excerpts for the prompt, content bounded per excerpt.
fn format_context(hits: &[VectorSearchHit]) -> String {
    hits.iter()
        .enumerate()
        .map(|(i, hit)| {
            let doc = &hit.document;
            format!(
                "[증거 {}] id={} 유형={} 발화자={} 일시={}\n{}",
                i + 1,
                doc.evidence_id,
                doc.labels.join(","),
                doc.speaker.as_deref().unwrap_or("불명"),
                doc.timestamp.format("%Y-%m-%d %H:%M"),
                truncate_chars(&doc.content, DRAFT_EXCERPT_MAX_CHARS),
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn build_citations(hits: &[VectorSearchHit]) -> Vec<DraftCitation> {
    hits.iter()
        .map(|hit| DraftCitation {
            evidence_id: hit.document.evidence_id.clone(),
            quote: truncate_chars(&hit.document.content, CITATION_QUOTE_MAX_CHARS).to_string(),
            labels: hit.document.labels.clone(),
        })
        .collect()
}

fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chagok_core::{EvidenceRecord, MediaType, VectorDocument};
    use chagok_db::InMemoryEvidenceRepository;
    use chagok_index::InMemoryVectorIndex;
    use chagok_inference::{MockEmbeddingBackend, MockGenerationBackend};

    struct Fixture {
        evidence: Arc<InMemoryEvidenceRepository>,
        index: Arc<InMemoryVectorIndex>,
        generation: Arc<MockGenerationBackend>,
        composer: DraftComposer,
    }

    fn fixture() -> Fixture {
        let evidence = Arc::new(InMemoryEvidenceRepository::new());
        let index = Arc::new(InMemoryVectorIndex::new());
        let generation = Arc::new(MockGenerationBackend::new());
        let composer = DraftComposer::new(
            evidence.clone(),
            index.clone(),
            Arc::new(MockEmbeddingBackend::default()),
            generation.clone(),
        );
        Fixture {
            evidence,
            index,
            generation,
            composer,
        }
    }

    async fn seed_completed(fx: &Fixture, case_id: &str, evidence_id: &str, content: &str) {
        let mut rec = EvidenceRecord::placeholder(
            case_id,
            evidence_id,
            MediaType::Text,
            &format!("cases/{}/raw/{}_f.txt", case_id, evidence_id),
        );
        rec.status = EvidenceStatus::Completed;
        rec.content = Some(content.to_string());
        rec.labels = vec!["폭언".to_string()];
        fx.evidence.upsert(&rec).await.unwrap();

        fx.index
            .upsert(
                case_id,
                &VectorDocument {
                    id: format!("vec_{}", evidence_id),
                    case_id: case_id.to_string(),
                    evidence_id: evidence_id.to_string(),
                    content: content.to_string(),
                    labels: vec!["폭언".to_string()],
                    speaker: Some("남편".to_string()),
                    timestamp: Utc::now(),
                    embedding: vec![1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
                },
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_empty_case_returns_citation_free_draft() {
        let fx = fixture();
        let sections = vec![SECTION_FAULT_CAUSE.to_string()];

        let preview = fx.composer.compose("c1", &sections).await.unwrap();
        assert!(preview.citations.is_empty());
        assert!(!preview.draft_text.is_empty());
        // No model call was made
        assert_eq!(fx.generation.call_count(), 0);
    }

    #[tokio::test]
    async fn test_compose_with_evidence_cites_it() {
        let fx = fixture();
        seed_completed(&fx, "c1", "ev_0123456789ab", "어제 밤 폭언이 반복되었다").await;
        fx.generation.push_response("청구원인: 피고는 반복적으로 폭언하였다 [증거 1]");

        let sections = vec![SECTION_FAULT_CAUSE.to_string()];
        let preview = fx.composer.compose("c1", &sections).await.unwrap();

        assert_eq!(preview.citations.len(), 1);
        assert_eq!(preview.citations[0].evidence_id, "ev_0123456789ab");
        assert_eq!(preview.citations[0].quote, "어제 밤 폭언이 반복되었다");
        assert_eq!(preview.citations[0].labels, vec!["폭언".to_string()]);
        assert!(preview.draft_text.contains("청구원인"));
    }

    #[tokio::test]
    async fn test_citations_deduplicated_across_sections() {
        let fx = fixture();
        seed_completed(&fx, "c1", "ev_0123456789ab", "내용").await;
        fx.generation.push_response("초안");

        let sections = vec![SECTION_FAULT_CAUSE.to_string(), "재산분할".to_string()];
        let preview = fx.composer.compose("c1", &sections).await.unwrap();

        // Both section queries hit the same document; cited once
        assert_eq!(preview.citations.len(), 1);
    }

    #[tokio::test]
    async fn test_citation_quote_bounded() {
        let fx = fixture();
        let long_content = "가".repeat(CITATION_QUOTE_MAX_CHARS * 3);
        seed_completed(&fx, "c1", "ev_0123456789ab", &long_content).await;
        fx.generation.push_response("초안");

        let preview = fx
            .composer
            .compose("c1", &[SECTION_FAULT_CAUSE.to_string()])
            .await
            .unwrap();
        assert_eq!(
            preview.citations[0].quote.chars().count(),
            CITATION_QUOTE_MAX_CHARS
        );
    }

    #[tokio::test]
    async fn test_generation_failure_propagates() {
        let evidence = Arc::new(InMemoryEvidenceRepository::new());
        let index = Arc::new(InMemoryVectorIndex::new());
        let composer = DraftComposer::new(
            evidence.clone(),
            index.clone(),
            Arc::new(MockEmbeddingBackend::default()),
            Arc::new(MockGenerationBackend::failing()),
        );
        let fx = Fixture {
            evidence,
            index,
            generation: Arc::new(MockGenerationBackend::new()),
            composer,
        };
        seed_completed(&fx, "c1", "ev_0123456789ab", "내용").await;

        let err = fx
            .composer
            .compose("c1", &[SECTION_FAULT_CAUSE.to_string()])
            .await
            .unwrap_err();
        assert!(err.is_retryable());
    }

    #[test]
    fn test_format_context_numbering_and_bounds() {
        let doc = VectorDocument {
            id: "vec_ev_1".to_string(),
            case_id: "c1".to_string(),
            evidence_id: "ev_1".to_string(),
            content: "나".repeat(DRAFT_EXCERPT_MAX_CHARS * 2),
            labels: vec!["협박".to_string()],
            speaker: None,
            timestamp: Utc::now(),
            embedding: vec![],
        };
        let hits = vec![VectorSearchHit {
            document: doc,
            score: 0.9,
        }];
        let context = format_context(&hits);
        assert!(context.starts_with("[증거 1]"));
        assert!(context.contains("발화자=불명"));
        // Excerpt bounded: header plus at most the excerpt cap of content
        assert!(context.chars().count() < DRAFT_EXCERPT_MAX_CHARS + 120);
    }
}
