//! Text evidence parser with messenger-export conversation detection.

use std::collections::HashMap;

use async_trait::async_trait;
use regex::Regex;

use chagok_core::{MediaType, Result};

use super::{EvidenceParser, ParsedEvidence};

/// Label attached when a text file turns out to be a conversation export.
pub const LABEL_CONVERSATION: &str = "대화기록";

/// Minimum number of lines matching the message pattern before the file is
/// treated as a conversation export.
const CONVERSATION_MIN_MATCHES: usize = 2;

/// One attributed message in a conversation export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationLine {
    pub speaker: String,
    pub message: String,
}

/// Parser for plain text files.
///
/// Messenger exports (KakaoTalk-style `[speaker] [time] message` lines) are
/// detected so the dominant speaker can be attributed; everything else
/// passes through as free text.
pub struct TextParser {
    message_line: Regex,
}

impl TextParser {
    pub fn new() -> Self {
        Self {
            // [홍길동] [오후 3:12] 메시지 내용
            message_line: Regex::new(r"^\[([^\[\]]+)\]\s*\[([^\[\]]+)\]\s*(.+)$")
                .unwrap_or_else(|_| unreachable!("static pattern")),
        }
    }

    /// Extract conversation lines when enough of the file matches the
    /// messenger-export pattern.
    pub fn detect_conversation(&self, text: &str) -> Option<Vec<ConversationLine>> {
        let lines: Vec<ConversationLine> = text
            .lines()
            .filter_map(|line| {
                self.message_line.captures(line.trim()).map(|caps| ConversationLine {
                    speaker: caps[1].trim().to_string(),
                    message: caps[3].trim().to_string(),
                })
            })
            .collect();

        if lines.len() >= CONVERSATION_MIN_MATCHES {
            Some(lines)
        } else {
            None
        }
    }

    fn dominant_speaker(lines: &[ConversationLine]) -> Option<String> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for line in lines {
            *counts.entry(line.speaker.as_str()).or_default() += 1;
        }
        counts
            .into_iter()
            .max_by_key(|(_, count)| *count)
            .map(|(speaker, _)| speaker.to_string())
    }
}

impl Default for TextParser {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EvidenceParser for TextParser {
    fn media_type(&self) -> MediaType {
        MediaType::Text
    }

    async fn parse(&self, data: &[u8], _filename: &str) -> Result<ParsedEvidence> {
        let text = String::from_utf8_lossy(data).into_owned();

        if let Some(lines) = self.detect_conversation(&text) {
            let speaker = Self::dominant_speaker(&lines);
            return Ok(ParsedEvidence {
                text,
                speaker,
                labels: vec![LABEL_CONVERSATION.to_string()],
            });
        }

        Ok(ParsedEvidence {
            text,
            speaker: None,
            labels: Vec::new(),
        })
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true) // No external dependencies
    }

    fn name(&self) -> &str {
        "text"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KAKAO_EXPORT: &str = "\
[남편] [오후 9:12] 어디야
[남편] [오후 9:13] 왜 전화 안 받아
[아내] [오후 9:40] 회사야
[남편] [오후 9:41] 거짓말하지 마";

    #[tokio::test]
    async fn test_plain_text_passthrough() {
        let parser = TextParser::new();
        let parsed = parser.parse("그냥 메모입니다.".as_bytes(), "memo.txt").await.unwrap();
        assert_eq!(parsed.text, "그냥 메모입니다.");
        assert!(parsed.speaker.is_none());
        assert!(parsed.labels.is_empty());
    }

    #[tokio::test]
    async fn test_conversation_detection() {
        let parser = TextParser::new();
        let parsed = parser.parse(KAKAO_EXPORT.as_bytes(), "chat.txt").await.unwrap();
        assert_eq!(parsed.labels, vec![LABEL_CONVERSATION.to_string()]);
        // 남편 has 3 messages, 아내 has 1
        assert_eq!(parsed.speaker.as_deref(), Some("남편"));
    }

    #[test]
    fn test_detect_conversation_lines() {
        let parser = TextParser::new();
        let lines = parser.detect_conversation(KAKAO_EXPORT).unwrap();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0].speaker, "남편");
        assert_eq!(lines[0].message, "어디야");
        assert_eq!(lines[2].speaker, "아내");
    }

    #[test]
    fn test_single_matching_line_is_not_conversation() {
        let parser = TextParser::new();
        let text = "메모\n[남편] [오후 9:12] 한 줄\n그 외 내용";
        assert!(parser.detect_conversation(text).is_none());
    }

    #[test]
    fn test_bracketed_prose_is_not_conversation() {
        let parser = TextParser::new();
        // Single bracket pairs without the second time bracket do not match
        let text = "[공지] 오늘 회의\n[안내] 내일 휴무";
        assert!(parser.detect_conversation(text).is_none());
    }

    #[tokio::test]
    async fn test_invalid_utf8_lossy() {
        let parser = TextParser::new();
        let data: &[u8] = &[0xFF, b'h', b'i'];
        let parsed = parser.parse(data, "bin.txt").await.unwrap();
        assert!(parsed.text.contains("hi"));
        assert!(parsed.text.contains('\u{FFFD}'));
    }

    #[tokio::test]
    async fn test_health_check() {
        assert!(TextParser::new().health_check().await.unwrap());
    }
}
