//! AI analysis over parsed evidence content.
//!
//! The analyzer turns extracted text into the structured analysis payload:
//! a summary, content labels, insights, and an embedding for the case
//! index. The generation model is asked for strict JSON; fenced or
//! otherwise decorated output is tolerated.

use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, warn};

use chagok_core::{AnalysisSuccess, Error, Result};
use chagok_inference::{ChatMessage, EmbeddingBackend, GenerationBackend};

use crate::adapters::ParsedEvidence;

/// Upper bound on characters sent to the analysis and embedding models.
const ANALYSIS_INPUT_MAX_CHARS: usize = 8000;

const SYSTEM_PROMPT: &str = "당신은 이혼 소송 증거 분석 전문가입니다. 주어진 증거 내용을 분석해 \
반드시 아래 JSON 형식으로만 답하세요:\n\
{\"summary\": \"한두 문장 요약\", \"labels\": [\"폭언\", \"협박\" 등 해당 유형], \
\"insights\": [\"법적으로 의미 있는 관찰\"], \"speaker\": \"주요 발화자 또는 null\"}";

#[derive(Deserialize)]
struct AnalysisJson {
    #[serde(default)]
    summary: String,
    #[serde(default)]
    labels: Vec<String>,
    #[serde(default)]
    insights: Vec<String>,
    #[serde(default)]
    speaker: Option<String>,
}

/// Runs the generation + embedding step of the pipeline.
pub struct EvidenceAnalyzer {
    generation: Arc<dyn GenerationBackend>,
    embedding: Arc<dyn EmbeddingBackend>,
}

impl EvidenceAnalyzer {
    pub fn new(
        generation: Arc<dyn GenerationBackend>,
        embedding: Arc<dyn EmbeddingBackend>,
    ) -> Self {
        Self {
            generation,
            embedding,
        }
    }

    /// Analyze parsed evidence into the full success payload.
    pub async fn analyze(&self, parsed: &ParsedEvidence) -> Result<AnalysisSuccess> {
        let content = truncate_chars(&parsed.text, ANALYSIS_INPUT_MAX_CHARS);

        let messages = [
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(content.to_string()),
        ];
        let raw = self.generation.complete(&messages).await?;
        let analysis = parse_analysis_json(&raw)?;

        let embedding = self.embedding.embed(content).await?;

        // Format-derived labels (conversation marker etc.) come first, then
        // the model's content labels, deduplicated
        let mut labels = parsed.labels.clone();
        for label in analysis.labels {
            if !labels.contains(&label) {
                labels.push(label);
            }
        }

        // A speaker attributed by the parser outranks the model's guess
        let speaker = parsed.speaker.clone().or(analysis.speaker);

        debug!(
            subsystem = "worker",
            component = "analyzer",
            model = self.generation.model_name(),
            result_count = labels.len(),
            "Evidence analyzed"
        );

        Ok(AnalysisSuccess {
            content: parsed.text.clone(),
            summary: analysis.summary,
            labels,
            insights: analysis.insights,
            speaker,
            embedding,
        })
    }
}

/// Parse the model's analysis response, stripping markdown fences when the
/// model wraps its JSON despite instructions.
fn parse_analysis_json(raw: &str) -> Result<AnalysisJson> {
    let trimmed = raw.trim();
    let candidate = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .map(|s| s.trim_end_matches("```").trim())
        .unwrap_or(trimmed);

    serde_json::from_str(candidate).map_err(|e| {
        warn!(
            subsystem = "worker",
            component = "analyzer",
            error_msg = %e,
            "Analysis response was not valid JSON"
        );
        Error::Inference(format!("unparseable analysis response: {}", e))
    })
}

/// Truncate at a char boundary without splitting a multi-byte character.
fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
