//! Bearer-token identity: HMAC-SHA256 signed `{sub, exp}` claims.
//!
//! Token shape: `base64url(claims_json).hex(hmac_sha256(secret, base64url(claims_json)))`.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

use prepai_types::InterviewError;

type HmacSha256 = Hmac<Sha256>;

/// Authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
    /// Unix seconds.
    pub expires_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    #[error("token is malformed")]
    Malformed,
    #[error("token signature is invalid")]
    BadSignature,
    #[error("token has expired")]
    Expired,
    #[error("token subject is empty")]
    EmptySubject,
}

impl From<IdentityError> for InterviewError {
    fn from(error: IdentityError) -> Self {
        InterviewError::Unauthorized(error.to_string())
    }
}

pub trait IdentityProvider: Send + Sync {
    fn issue(&self, user_id: &str) -> Result<String, IdentityError>;
    fn verify(&self, token: &str) -> Result<Identity, IdentityError>;
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    exp: i64,
}

pub struct HmacIdentityProvider {
    mac: HmacSha256,
    token_ttl_secs: u64,
}

impl HmacIdentityProvider {
    pub fn new(secret: impl AsRef<[u8]>, token_ttl_secs: u64) -> anyhow::Result<Self> {
        let secret = secret.as_ref();
        if secret.is_empty() {
            anyhow::bail!("auth secret key must be non-empty");
        }
        let mac = HmacSha256::new_from_slice(secret)
            .map_err(|error| anyhow::anyhow!("invalid auth secret key: {error}"))?;
        Ok(Self {
            mac,
            token_ttl_secs,
        })
    }

    fn mac(&self) -> HmacSha256 {
        self.mac.clone()
    }

    /// Sign an explicit expiry; `issue` uses now + ttl.
    pub fn issue_with_expiry(&self, user_id: &str, expires_at: i64) -> Result<String, IdentityError> {
        let sub = user_id.trim();
        if sub.is_empty() {
            return Err(IdentityError::EmptySubject);
        }
        let claims = Claims {
            sub: sub.to_string(),
            exp: expires_at,
        };
        let json = serde_json::to_vec(&claims).map_err(|_| IdentityError::Malformed)?;
        let payload = URL_SAFE_NO_PAD.encode(json);
        let mut mac = self.mac();
        mac.update(payload.as_bytes());
        let signature = hex::encode(mac.finalize().into_bytes());
        Ok(format!("{payload}.{signature}"))
    }
}

impl IdentityProvider for HmacIdentityProvider {
    fn issue(&self, user_id: &str) -> Result<String, IdentityError> {
        let ttl = i64::try_from(self.token_ttl_secs).unwrap_or(i64::MAX);
        let expires_at = Utc::now().timestamp().saturating_add(ttl);
        self.issue_with_expiry(user_id, expires_at)
    }

    fn verify(&self, token: &str) -> Result<Identity, IdentityError> {
        let (payload, signature) = token
            .trim()
            .split_once('.')
            .ok_or(IdentityError::Malformed)?;
        let signature = hex::decode(signature).map_err(|_| IdentityError::Malformed)?;
        let mut mac = self.mac();
        mac.update(payload.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| IdentityError::BadSignature)?;

        let json = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| IdentityError::Malformed)?;
        let claims: Claims = serde_json::from_slice(&json).map_err(|_| IdentityError::Malformed)?;
        if claims.sub.trim().is_empty() {
            return Err(IdentityError::EmptySubject);
        }
        if claims.exp <= Utc::now().timestamp() {
            return Err(IdentityError::Expired);
        }
        Ok(Identity {
            user_id: claims.sub,
            expires_at: claims.exp,
        })
    }
}
