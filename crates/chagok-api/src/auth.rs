//! Bearer-token authentication.
//!
//! Tokens are HMAC-SHA256 signed, carry the user id and an optional
//! case-access scope, and expire after 24 hours. Membership roles are
//! always resolved against the database; the token scope is a coarse
//! pre-filter, not the source of truth.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use base64::Engine;
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use chagok_core::defaults::{ENV_AUTH_SECRET, TOKEN_TTL_SECS};
use chagok_core::{CaseRole, Error, Result};

use crate::error::ApiError;
use crate::AppState;

type HmacSha256 = Hmac<Sha256>;

const B64: base64::engine::general_purpose::GeneralPurpose =
    base64::engine::general_purpose::URL_SAFE_NO_PAD;

/// Signed token payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthClaims {
    pub user_id: String,
    /// Case ids this token is scoped to. Empty means unscoped (any case the
    /// user is actually a member of).
    #[serde(default)]
    pub cases: Vec<String>,
    /// Expiry as a Unix timestamp.
    pub exp: i64,
}

impl AuthClaims {
    /// Whether the token scope admits the case. Database membership is
    /// checked separately.
    pub fn admits_case(&self, case_id: &str) -> bool {
        self.cases.is_empty() || self.cases.iter().any(|c| c == case_id)
    }
}

/// Token issuing and verification.
#[derive(Clone)]
pub struct AuthConfig {
    secret: Vec<u8>,
}

impl AuthConfig {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            secret: secret.as_ref().to_vec(),
        }
    }

    pub fn from_env() -> Result<Self> {
        let secret = std::env::var(ENV_AUTH_SECRET)
            .map_err(|_| Error::Config(format!("{} is not set", ENV_AUTH_SECRET)))?;
        if secret.len() < 16 {
            return Err(Error::Config(format!("{} is too short", ENV_AUTH_SECRET)));
        }
        Ok(Self::new(secret))
    }

    fn sign(&self, payload: &[u8]) -> Result<Vec<u8>> {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| Error::Internal(format!("hmac init: {}", e)))?;
        mac.update(payload);
        Ok(mac.finalize().into_bytes().to_vec())
    }

    /// Issue a token for a user, valid for 24 hours.
    pub fn issue(&self, user_id: &str, cases: Vec<String>) -> Result<String> {
        let claims = AuthClaims {
            user_id: user_id.to_string(),
            cases,
            exp: Utc::now().timestamp() + TOKEN_TTL_SECS,
        };
        let payload = serde_json::to_vec(&claims)?;
        let signature = self.sign(&payload)?;
        Ok(format!(
            "{}.{}",
            B64.encode(&payload),
            B64.encode(signature)
        ))
    }

    /// Verify a token's signature and expiry.
    pub fn verify(&self, token: &str) -> Result<AuthClaims> {
        let (payload_b64, signature_b64) = token
            .split_once('.')
            .ok_or_else(|| Error::Unauthorized("malformed token".to_string()))?;

        let payload = B64
            .decode(payload_b64)
            .map_err(|_| Error::Unauthorized("malformed token".to_string()))?;
        let signature = B64
            .decode(signature_b64)
            .map_err(|_| Error::Unauthorized("malformed token".to_string()))?;

        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| Error::Internal(format!("hmac init: {}", e)))?;
        mac.update(&payload);
        mac.verify_slice(&signature)
            .map_err(|_| Error::Unauthorized("invalid token signature".to_string()))?;

        let claims: AuthClaims = serde_json::from_slice(&payload)
            .map_err(|_| Error::Unauthorized("malformed token payload".to_string()))?;

        if claims.exp < Utc::now().timestamp() {
            return Err(Error::Unauthorized("token expired".to_string()));
        }
        Ok(claims)
    }
}

/// Authenticated request principal, extracted from the `Authorization`
/// header.
pub struct AuthUser(pub AuthClaims);

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> std::result::Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("missing Authorization header".to_string()))?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiError::Unauthorized("expected Bearer token".to_string()))?;

        let claims = state.auth.verify(token)?;
        Ok(AuthUser(claims))
    }
}

/// Resolve the caller's role in a case, requiring at least `min_role`.
///
/// Order matters for the error class: an unknown case is 404 before the
/// membership check is 403.
pub async fn require_role(
    state: &AppState,
    claims: &AuthClaims,
    case_id: &str,
    min_role: CaseRole,
) -> std::result::Result<CaseRole, ApiError> {
    if state.cases.get(case_id).await?.is_none() {
        return Err(ApiError::NotFound(format!("case {}", case_id)));
    }
    if !claims.admits_case(case_id) {
        return Err(ApiError::Forbidden("token not scoped to case".to_string()));
    }
    let role = state
        .cases
        .role_of(case_id, &claims.user_id)
        .await?
        .ok_or_else(|| ApiError::Forbidden("not a case member".to_string()))?;
    if role < min_role {
        return Err(ApiError::Forbidden(format!(
            "requires role {} or higher",
            min_role.as_str()
        )));
    }
    Ok(role)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AuthConfig {
        AuthConfig::new("test-secret-of-reasonable-length")
    }

    #[test]
    fn test_issue_verify_round_trip() {
        let auth = config();
        let token = auth.issue("u1", vec!["c1".to_string()]).unwrap();

        let claims = auth.verify(&token).unwrap();
        assert_eq!(claims.user_id, "u1");
        assert_eq!(claims.cases, vec!["c1".to_string()]);
        assert!(claims.exp > Utc::now().timestamp());
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let auth = config();
        let token = auth.issue("u1", vec![]).unwrap();
        let (_, signature) = token.split_once('.').unwrap();

        let forged_payload = B64.encode(
            serde_json::to_vec(&AuthClaims {
                user_id: "u2".to_string(),
                cases: vec![],
                exp: Utc::now().timestamp() + 1000,
            })
            .unwrap(),
        );
        let forged = format!("{}.{}", forged_payload, signature);

        assert!(matches!(
            auth.verify(&forged).unwrap_err(),
            Error::Unauthorized(_)
        ));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = config().issue("u1", vec![]).unwrap();
        let other = AuthConfig::new("a-completely-different-secret!");
        assert!(other.verify(&token).is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let auth = config();
        let claims = AuthClaims {
            user_id: "u1".to_string(),
            cases: vec![],
            exp: Utc::now().timestamp() - 10,
        };
        let payload = serde_json::to_vec(&claims).unwrap();
        let signature = auth.sign(&payload).unwrap();
        let token = format!("{}.{}", B64.encode(&payload), B64.encode(signature));

        let err = auth.verify(&token).unwrap_err();
        assert!(matches!(err, Error::Unauthorized(msg) if msg.contains("expired")));
    }

    #[test]
    fn test_malformed_tokens_rejected() {
        let auth = config();
        assert!(auth.verify("").is_err());
        assert!(auth.verify("no-dot-here").is_err());
        assert!(auth.verify("!!!.###").is_err());
    }

    #[test]
    fn test_scope_admits_case() {
        let unscoped = AuthClaims {
            user_id: "u1".to_string(),
            cases: vec![],
            exp: 0,
        };
        assert!(unscoped.admits_case("anything"));

        let scoped = AuthClaims {
            user_id: "u1".to_string(),
            cases: vec!["c1".to_string()],
            exp: 0,
        };
        assert!(scoped.admits_case("c1"));
        assert!(!scoped.admits_case("c2"));
    }
}
