//! Video evidence parser.
//!
//! Videos are treated as their audio track: the transcription endpoint
//! accepts mp4/mov containers directly, so no local demuxing is done.

use std::sync::Arc;

use async_trait::async_trait;

use chagok_core::{MediaType, Result};
use chagok_inference::TranscriptionBackend;

use super::{EvidenceParser, ParsedEvidence};

pub struct VideoParser {
    transcription: Arc<dyn TranscriptionBackend>,
}

impl VideoParser {
    pub fn new(transcription: Arc<dyn TranscriptionBackend>) -> Self {
        Self { transcription }
    }
}

#[async_trait]
impl EvidenceParser for VideoParser {
    fn media_type(&self) -> MediaType {
        MediaType::Video
    }

    async fn parse(&self, data: &[u8], filename: &str) -> Result<ParsedEvidence> {
        let result = self.transcription.transcribe(data, filename).await?;
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
        "video"
    }
}
