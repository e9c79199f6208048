//! Parsing of storage object-created event notifications.
//!
//! The blob store delivers a JSON event per upload batch, carrying one
//! record per created object with the bucket name and the URL-encoded
//! object key (and nothing else — no payload). Delivery is at-least-once,
//! so downstream processing must be idempotent per key.

use serde_json::Value as JsonValue;

/// One object-created record, with the key already URL-decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectCreated {
    pub bucket: String,
    pub key: String,
}

/// A parsed upload event.
#[derive(Debug)]
pub enum UploadEvent {
    /// Event carried object-created records (possibly some malformed; those
    /// are reported alongside so the caller can log and continue).
    Records {
        records: Vec<ObjectCreated>,
        malformed: usize,
    },
    /// Not a storage notification at all; ignore without error so the
    /// platform never retries.
    Ignored { reason: String },
}

/// Decode an object key as delivered in event notifications.
///
/// Spaces arrive either as `+` or `%20`; `+` is translated first, then
/// percent-sequences are decoded.
fn decode_key(raw: &str) -> String {
    let plus_decoded = raw.replace('+', " ");
    urlencoding::decode(&plus_decoded)
        .map(|s| s.into_owned())
        .unwrap_or(plus_decoded)
}

/// Parse a raw event document into object-created records.
pub fn parse_upload_event(event: &JsonValue) -> UploadEvent {
    let Some(records) = event.get("Records").and_then(|r| r.as_array()) else {
        return UploadEvent::Ignored {
            reason: "No storage records found".to_string(),
        };
    };

    let mut parsed = Vec::with_capacity(records.len());
    let mut malformed = 0;

    for record in records {
        let bucket = record
            .pointer("/s3/bucket/name")
            .and_then(|v| v.as_str());
        let key = record.pointer("/s3/object/key").and_then(|v| v.as_str());
        match (bucket, key) {
            (Some(bucket), Some(key)) if !key.is_empty() => parsed.push(ObjectCreated {
                bucket: bucket.to_string(),
                key: decode_key(key),
            }),
            _ => malformed += 1,
        }
    }

    UploadEvent::Records {
        records: parsed,
        malformed,
    }
}
