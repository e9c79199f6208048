//! Presigned URL issuance for direct client uploads.
//!
//! A presigned URL grants one HTTP method on one object key for a bounded
//! window, so clients upload straight to blob storage without proxying file
//! bytes through the backend. Validity is hard-capped at five minutes;
//! callers asking for more are clamped, never rejected. PUT credentials
//! additionally carry the signed upload size cap for the gateway to
//! enforce.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tracing::debug;

use chagok_core::defaults::{PRESIGN_MAX_EXPIRY_SECS, UPLOAD_MAX_BYTES};
use chagok_core::{Error, Result};

type HmacSha256 = Hmac<Sha256>;

/// Configuration for the presigner.
#[derive(Debug, Clone)]
pub struct PresignConfig {
    /// Public base URL of the blob storage endpoint.
    pub base_url: String,
    /// Signing secret shared with the storage gateway.
    pub secret: String,
}

impl PresignConfig {
    pub fn new(base_url: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            secret: secret.into(),
        }
    }

    /// Read configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var(chagok_core::defaults::ENV_STORAGE_BASE_URL)
            .map_err(|_| Error::Config("CHAGOK_STORAGE_BASE_URL is not set".to_string()))?;
        let secret = std::env::var(chagok_core::defaults::ENV_STORAGE_SECRET)
            .map_err(|_| Error::Config("CHAGOK_STORAGE_SECRET is not set".to_string()))?;
        Ok(Self { base_url, secret })
    }
}

/// A time-limited credential scoped to a single method and object key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresignedUrl {
    pub url: String,
    pub key: String,
    pub method: String,
    pub expires_at: DateTime<Utc>,
}

/// Issues and verifies presigned URLs.
pub struct Presigner {
    config: PresignConfig,
}

impl Presigner {
    pub fn new(config: PresignConfig) -> Self {
        Self { config }
    }

    /// Presign a single PUT for `key`, valid for `expires_in_secs` (clamped
    /// to the 300-second cap). The credential also carries the upload size
    /// cap, signed, so the storage gateway rejects oversized bodies.
    pub fn presign_put(&self, key: &str, expires_in_secs: u64) -> Result<PresignedUrl> {
        self.presign(key, "PUT", expires_in_secs, Some(UPLOAD_MAX_BYTES))
    }

    /// Presign a single GET for `key` (evidence download), same cap.
    pub fn presign_get(&self, key: &str, expires_in_secs: u64) -> Result<PresignedUrl> {
        self.presign(key, "GET", expires_in_secs, None)
    }

    fn presign(
        &self,
        key: &str,
        method: &str,
        expires_in_secs: u64,
        max_bytes: Option<u64>,
    ) -> Result<PresignedUrl> {
        if key.is_empty() {
            return Err(Error::InvalidInput("object key must not be empty".into()));
        }
        let expires_in = expires_in_secs.min(PRESIGN_MAX_EXPIRY_SECS);
        let expires_at = Utc::now() + chrono::Duration::seconds(expires_in as i64);
        let expiry_ts = expires_at.timestamp();

        let signature = self.sign(method, key, expiry_ts, max_bytes)?;
        let mut url = format!(
            "{}/{}?method={}&expires={}&signature={}",
            self.config.base_url.trim_end_matches('/'),
            key,
            method,
            expiry_ts,
            signature
        );
        if let Some(cap) = max_bytes {
            url.push_str(&format!("&max_bytes={}", cap));
        }

        debug!(
            subsystem = "storage",
            component = "presign",
            op = "presign",
            object_key = %key,
            method = %method,
            expires_in_secs = expires_in,
            "Issued presigned URL"
        );

        Ok(PresignedUrl {
            url,
            key: key.to_string(),
            method: method.to_string(),
            expires_at,
        })
    }

    /// Verify a signature produced by [`Presigner::presign_put`] /
    /// [`presign_get`](Presigner::presign_get). Used by the storage gateway
    /// and by tests; rejects expired or tampered credentials. `max_bytes`
    /// must match what was signed (PUT carries the upload cap, GET none).
    pub fn verify(
        &self,
        method: &str,
        key: &str,
        expiry_ts: i64,
        max_bytes: Option<u64>,
        signature: &str,
    ) -> Result<()> {
        if expiry_ts < Utc::now().timestamp() {
            return Err(Error::Unauthorized("presigned URL has expired".into()));
        }
        let expected = self.sign(method, key, expiry_ts, max_bytes)?;
        if expected != signature {
            return Err(Error::Unauthorized("presigned URL signature mismatch".into()));
        }
        Ok(())
    }

    fn sign(
        &self,
        method: &str,
        key: &str,
        expiry_ts: i64,
        max_bytes: Option<u64>,
    ) -> Result<String> {
        let mut mac = HmacSha256::new_from_slice(self.config.secret.as_bytes())
            .map_err(|e| Error::Internal(format!("HMAC init failed: {}", e)))?;
        mac.update(method.as_bytes());
        mac.update(b"\n");
        mac.update(key.as_bytes());
        mac.update(b"\n");
        mac.update(expiry_ts.to_string().as_bytes());
        if let Some(cap) = max_bytes {
            mac.update(b"\n");
            mac.update(cap.to_string().as_bytes());
        }
        Ok(hex::encode(mac.finalize().into_bytes()))
    }
}
