//! Parser adapter implementations, one per media type.

pub mod audio;
pub mod image;
pub mod pdf;
pub mod text;
pub mod video;

pub use audio::AudioParser;
pub use image::ImageParser;
pub use pdf::PdfParser;
pub use text::TextParser;
pub use video::VideoParser;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use chagok_core::{MediaType, Result};
use chagok_inference::{TranscriptionBackend, VisionBackend};

/// Raw content pulled out of an evidence file, before AI analysis.
#[derive(Debug, Clone, Default)]
pub struct ParsedEvidence {
    /// Extracted or transcribed text content.
    pub text: String,
    /// Dominant speaker, when the format attributes one.
    pub speaker: Option<String>,
    /// Format-derived labels (e.g. a conversation-log marker), merged with
    /// the analyzer's content labels downstream.
    pub labels: Vec<String>,
}

/// A parser for one media type.
#[async_trait]
pub trait EvidenceParser: Send + Sync {
    /// The media type this parser handles.
    fn media_type(&self) -> MediaType;

    /// Extract text content from raw file bytes.
    async fn parse(&self, data: &[u8], filename: &str) -> Result<ParsedEvidence>;

    /// Check that any backing service is reachable.
    async fn health_check(&self) -> Result<bool>;

    fn name(&self) -> &str;
}

/// Registry mapping media types to their parser adapters.
pub struct ParserRegistry {
    parsers: HashMap<MediaType, Arc<dyn EvidenceParser>>,
}

impl ParserRegistry {
    pub fn new() -> Self {
        Self {
            parsers: HashMap::new(),
        }
    }

    /// Build a registry with all five adapters wired to the given backends.
    pub fn with_backends(
        transcription: Arc<dyn TranscriptionBackend>,
        vision: Arc<dyn VisionBackend>,
    ) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(TextParser::new()));
        registry.register(Arc::new(ImageParser::new(vision.clone())));
        registry.register(Arc::new(AudioParser::new(transcription.clone())));
        registry.register(Arc::new(VideoParser::new(transcription)));
        registry.register(Arc::new(PdfParser::new()));
        registry
    }

    pub fn register(&mut self, parser: Arc<dyn EvidenceParser>) {
        self.parsers.insert(parser.media_type(), parser);
    }

    pub fn get(&self, media_type: MediaType) -> Option<Arc<dyn EvidenceParser>> {
        self.parsers.get(&media_type).cloned()
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chagok_inference::{MockTranscriptionBackend, MockVisionBackend};

    #[test]
    fn test_registry_with_backends_covers_all_media_types() {
        let registry = ParserRegistry::with_backends(
            Arc::new(MockTranscriptionBackend::default()),
            Arc::new(MockVisionBackend::default()),
        );
        for mt in [
            MediaType::Text,
            MediaType::Image,
            MediaType::Audio,
            MediaType::Video,
            MediaType::Pdf,
        ] {
            assert!(registry.get(mt).is_some(), "missing parser for {}", mt);
        }
    }

    #[test]
    fn test_empty_registry_has_no_parsers() {
        let registry = ParserRegistry::new();
        assert!(registry.get(MediaType::Text).is_none());
    }
}
