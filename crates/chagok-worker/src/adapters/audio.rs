//! Audio evidence parser backed by a transcription model.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use chagok_core::{MediaType, Result};
use chagok_inference::TranscriptionBackend;

use super::{EvidenceParser, ParsedEvidence};

/// Parser for call recordings and voice memos.
pub struct AudioParser {
    transcription: Arc<dyn TranscriptionBackend>,
}

impl AudioParser {
    pub fn new(transcription: Arc<dyn TranscriptionBackend>) -> Self {
        Self { transcription }
    }
}

#[async_trait]
impl EvidenceParser for AudioParser {
    fn media_type(&self) -> MediaType {
        MediaType::Audio
    }

    async fn parse(&self, data: &[u8], filename: &str) -> Result<ParsedEvidence> {
        let result = self.transcription.transcribe(data, filename).await?;
        debug!(
            subsystem = "worker",
            component = "audio_parser",
            duration_secs = result.duration_secs,
            "Audio transcribed"
        );
        Ok(ParsedEvidence {
            text: result.text,
            speaker: None,
            labels: Vec::new(),
        })
    }

    async fn health_check(&self) -> Result<bool> {
        self.transcription.health_check().await
    }

    fn name(&self) -> &str {
        "audio"
    }
}
