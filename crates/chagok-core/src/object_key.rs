//! Blob object-key grammar for evidence uploads.
//!
//! Canonical shape: `cases/{case_id}/raw/{evidence_id}_{filename}` where the
//! evidence id carries the fixed `ev_` tag followed by 12 hex characters.
//! A legacy shape without an embedded evidence id also exists:
//! `cases/{case_id}/raw/{filename}`. The worker must accept both; a legacy
//! key has no placeholder record to update and triggers fallback creation.

use uuid::Uuid;

use crate::error::{Error, Result};

/// Fixed tag prefixing every generated evidence id.
pub const EVIDENCE_ID_TAG: &str = "ev_";

/// Hex digits following the tag in a generated evidence id.
const EVIDENCE_ID_HEX_LEN: usize = 12;

/// Generate a new evidence id: `ev_` + 12 hex chars of a fresh UUIDv4.
pub fn new_evidence_id() -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("{}{}", EVIDENCE_ID_TAG, &hex[..EVIDENCE_ID_HEX_LEN])
}

/// Sanitize a client-supplied filename before embedding it in an object key.
///
/// Path separators and control characters are replaced with underscores and
/// leading dots stripped, so a filename can never escape the case's `raw/`
/// prefix or smuggle key-structure characters.
pub fn sanitize_filename(filename: &str) -> String {
    let cleaned: String = filename
        .chars()
        .map(|c| match c {
            '/' | '\\' | '\0'..='\x1f' => '_',
            _ => c,
        })
        .collect();
    let trimmed = cleaned.trim_start_matches('.').trim();
    if trimmed.is_empty() {
        "unnamed".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Build the canonical object key for an evidence upload.
pub fn build_object_key(case_id: &str, evidence_id: &str, filename: &str) -> String {
    format!(
        "cases/{}/raw/{}_{}",
        case_id,
        evidence_id,
        sanitize_filename(filename)
    )
}

/// A parsed evidence object key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedObjectKey {
    /// Canonical shape with an embedded evidence id.
    Canonical {
        case_id: String,
        evidence_id: String,
        filename: String,
    },
    /// Legacy shape with no embedded evidence id. The worker creates a new
    /// record rather than updating a placeholder.
    Legacy { case_id: String, filename: String },
}

impl ParsedObjectKey {
    pub fn case_id(&self) -> &str {
        match self {
            Self::Canonical { case_id, .. } | Self::Legacy { case_id, .. } => case_id,
        }
    }

    pub fn filename(&self) -> &str {
        match self {
            Self::Canonical { filename, .. } | Self::Legacy { filename, .. } => filename,
        }
    }
}

/// Parse an object key into one of the two supported shapes.
///
/// Keys outside the `cases/{case_id}/raw/` prefix are rejected; the upload
/// trigger only fires for that prefix, so anything else reaching the worker
/// is a misconfiguration.
pub fn parse_object_key(key: &str) -> Result<ParsedObjectKey> {
    let mut parts = key.splitn(4, '/');
    let (root, case_id, marker, rest) = (
        parts.next().unwrap_or(""),
        parts.next().unwrap_or(""),
        parts.next().unwrap_or(""),
        parts.next().unwrap_or(""),
    );

    if root != "cases" || marker != "raw" || case_id.is_empty() || rest.is_empty() {
        return Err(Error::InvalidObjectKey(key.to_string()));
    }
    // Nested paths under raw/ are not part of either shape
    if rest.contains('/') {
        return Err(Error::InvalidObjectKey(key.to_string()));
    }

    if let Some(stripped) = rest.strip_prefix(EVIDENCE_ID_TAG) {
        // Canonical only if the tag is followed by the full hex run and a
        // separator; otherwise a legacy filename merely starting with "ev_".
        // Checked byte-wise: filenames are user-supplied and often
        // multibyte, so byte offset 12 need not be a char boundary.
        let bytes = stripped.as_bytes();
        let hex_ok = bytes.len() > EVIDENCE_ID_HEX_LEN
            && bytes[..EVIDENCE_ID_HEX_LEN]
                .iter()
                .all(u8::is_ascii_hexdigit)
            && bytes[EVIDENCE_ID_HEX_LEN] == b'_';
        if hex_ok {
            let evidence_id = format!("{}{}", EVIDENCE_ID_TAG, &stripped[..EVIDENCE_ID_HEX_LEN]);
            let filename = stripped[EVIDENCE_ID_HEX_LEN + 1..].to_string();
            if filename.is_empty() {
                return Err(Error::InvalidObjectKey(key.to_string()));
            }
            return Ok(ParsedObjectKey::Canonical {
                case_id: case_id.to_string(),
                evidence_id,
                filename,
            });
        }
    }

    Ok(ParsedObjectKey::Legacy {
        case_id: case_id.to_string(),
        filename: rest.to_string(),
    })
}

/// Extract the lowercase file extension (without the dot) from a filename.
pub fn file_extension(filename: &str) -> Option<String> {
    let idx = filename.rfind('.')?;
    let ext = &filename[idx + 1..];
    if ext.is_empty() {
        None
    } else {
        Some(ext.to_ascii_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_evidence_id_shape() {
        let id = new_evidence_id();
        assert!(id.starts_with("ev_"));
        assert_eq!(id.len(), 3 + 12);
        assert!(id[3..].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_new_evidence_id_unique() {
        let a = new_evidence_id();
        let b = new_evidence_id();
        assert_ne!(a, b);
    }

    #[test]
    fn test_sanitize_filename_passthrough() {
        assert_eq!(sanitize_filename("chat.txt"), "chat.txt");
        assert_eq!(sanitize_filename("녹음 파일.mp3"), "녹음 파일.mp3");
    }

    #[test]
    fn test_sanitize_filename_path_separators() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "_.._etc_passwd");
        assert_eq!(sanitize_filename("a\\b.txt"), "a_b.txt");
    }

    #[test]
    fn test_sanitize_filename_control_chars() {
        assert_eq!(sanitize_filename("a\x00b\nc.txt"), "a_b_c.txt");
    }

    #[test]
    fn test_sanitize_filename_empty() {
        assert_eq!(sanitize_filename(""), "unnamed");
        assert_eq!(sanitize_filename("..."), "unnamed");
    }

    #[test]
    fn test_build_object_key_canonical() {
        let key = build_object_key("case_1", "ev_0123456789ab", "chat.txt");
        assert_eq!(key, "cases/case_1/raw/ev_0123456789ab_chat.txt");
    }

    #[test]
    fn test_parse_canonical_key() {
        let parsed = parse_object_key("cases/c1/raw/ev_0123456789ab_chat.txt").unwrap();
        assert_eq!(
            parsed,
            ParsedObjectKey::Canonical {
                case_id: "c1".to_string(),
                evidence_id: "ev_0123456789ab".to_string(),
                filename: "chat.txt".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_legacy_key() {
        let parsed = parse_object_key("cases/c1/raw/recording.mp3").unwrap();
        assert_eq!(
            parsed,
            ParsedObjectKey::Legacy {
                case_id: "c1".to_string(),
                filename: "recording.mp3".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_legacy_key_with_ev_prefix_filename() {
        // A filename that merely starts with ev_ but lacks the 12-hex id
        // run is legacy, not canonical
        let parsed = parse_object_key("cases/c1/raw/ev_notes.txt").unwrap();
        assert!(matches!(parsed, ParsedObjectKey::Legacy { .. }));
    }

    #[test]
    fn test_parse_legacy_ev_prefix_multibyte_filename() {
        // 11 ASCII chars after ev_, then a Korean char spanning byte 12:
        // must parse as legacy, never panic on a mid-character slice
        let parsed = parse_object_key("cases/c1/raw/ev_aaaaaaaaaaa녹음.txt").unwrap();
        assert_eq!(
            parsed,
            ParsedObjectKey::Legacy {
                case_id: "c1".to_string(),
                filename: "ev_aaaaaaaaaaa녹음.txt".to_string(),
            }
        );

        // Hex run present but the separator position lands inside a
        // multibyte char
        let parsed = parse_object_key("cases/c1/raw/ev_0123456789a가.txt").unwrap();
        assert!(matches!(parsed, ParsedObjectKey::Legacy { .. }));
    }

    #[test]
    fn test_parse_key_filename_with_underscores() {
        let parsed = parse_object_key("cases/c1/raw/ev_0123456789ab_my_chat_log.txt").unwrap();
        match parsed {
            ParsedObjectKey::Canonical {
                evidence_id,
                filename,
                ..
            } => {
                assert_eq!(evidence_id, "ev_0123456789ab");
                assert_eq!(filename, "my_chat_log.txt");
            }
            other => panic!("expected canonical, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_key_outside_raw_prefix() {
        assert!(parse_object_key("cases/c1/processed/chat.txt").is_err());
        assert!(parse_object_key("uploads/chat.txt").is_err());
        assert!(parse_object_key("cases//raw/chat.txt").is_err());
        assert!(parse_object_key("cases/c1/raw/").is_err());
    }

    #[test]
    fn test_parse_key_nested_path_rejected() {
        assert!(parse_object_key("cases/c1/raw/sub/chat.txt").is_err());
    }

    #[test]
    fn test_round_trip_build_then_parse() {
        let evidence_id = new_evidence_id();
        let key = build_object_key("case_9", &evidence_id, "녹취록.pdf");
        match parse_object_key(&key).unwrap() {
            ParsedObjectKey::Canonical {
                case_id,
                evidence_id: parsed_id,
                filename,
            } => {
                assert_eq!(case_id, "case_9");
                assert_eq!(parsed_id, evidence_id);
                assert_eq!(filename, "녹취록.pdf");
            }
            other => panic!("expected canonical, got {:?}", other),
        }
    }

    #[test]
    fn test_file_extension() {
        assert_eq!(file_extension("chat.txt").as_deref(), Some("txt"));
        assert_eq!(file_extension("CLIP.MP4").as_deref(), Some("mp4"));
        assert_eq!(file_extension("archive.tar.gz").as_deref(), Some("gz"));
        assert_eq!(file_extension("noext"), None);
        assert_eq!(file_extension("trailing."), None);
    }
}
