//! Image evidence parser backed by a vision model.

use std::sync::Arc;

use async_trait::async_trait;

use chagok_core::{file_extension, MediaType, Result};
use chagok_inference::VisionBackend;

use super::{EvidenceParser, ParsedEvidence};

/// Parser for photos and screenshots. The vision backend describes the
/// image and transcribes any visible text (messenger captures included).
pub struct ImageParser {
    vision: Arc<dyn VisionBackend>,
}

impl ImageParser {
    pub fn new(vision: Arc<dyn VisionBackend>) -> Self {
        Self { vision }
    }

    fn mime_for_filename(filename: &str) -> &'static str {
        match file_extension(filename).as_deref() {
            Some("png") => "image/png",
            _ => "image/jpeg",
        }
    }
}

#[async_trait]
impl EvidenceParser for ImageParser {
    fn media_type(&self) -> MediaType {
        MediaType::Image
    }

    async fn parse(&self, data: &[u8], filename: &str) -> Result<ParsedEvidence> {
        let mime = Self::mime_for_filename(filename);
        let description = self.vision.describe_image(data, mime, None).await?;
        Ok(ParsedEvidence {
            text: description,
            speaker: None,
            labels: Vec::new(),
        })
    }

    async fn health_check(&self) -> Result<bool> {
        self.vision.health_check().await
    }

    fn name(&self) -> &str {
        "image"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chagok_inference::MockVisionBackend;

    #[tokio::test]
    async fn test_image_parse_uses_vision() {
        let vision = Arc::new(MockVisionBackend::new("문자 캡처: 협박성 발언"));
        let parser = ImageParser::new(vision.clone());

        let parsed = parser.parse(b"\x89PNG...", "capture.png").await.unwrap();
        assert_eq!(parsed.text, "문자 캡처: 협박성 발언");
        assert!(parsed.speaker.is_none());
        assert_eq!(vision.call_count(), 1);
    }

    #[tokio::test]
    async fn test_image_parse_backend_failure_propagates() {
        let parser = ImageParser::new(Arc::new(MockVisionBackend::failing()));
        assert!(parser.parse(b"", "a.jpg").await.is_err());
    }

    #[test]
    fn test_mime_for_filename() {
        assert_eq!(ImageParser::mime_for_filename("a.png"), "image/png");
        assert_eq!(ImageParser::mime_for_filename("a.jpg"), "image/jpeg");
        assert_eq!(ImageParser::mime_for_filename("a.jpeg"), "image/jpeg");
    }
}
