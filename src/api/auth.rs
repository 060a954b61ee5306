//! JWT session tokens and the auth provider seam
//!
//! The REST client owns the session token; the WebSocket client asks it for a
//! fresh one whenever it (re)connects.

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::config::constants::{JWT_LIFETIME_MS, JWT_REFRESH_BUFFER_MS};
use crate::config::logging::sanitize_jwt;
use crate::error::ParadexResult;
use crate::utils::current_time_ms;

/// Bearer token with its expiry (ms since epoch)
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken {
    jwt: String,
    expires_at_ms: u64,
}

impl SessionToken {
    /// Expiry comes from the `exp` claim, else issue time plus the default lifetime.
    pub fn new(jwt: impl Into<String>) -> Self {
        let jwt = jwt.into();
        let expires_at_ms =
            jwt_expiry_ms(&jwt).unwrap_or_else(|| current_time_ms() + JWT_LIFETIME_MS);
        Self { jwt, expires_at_ms }
    }

    pub fn with_expiry(jwt: impl Into<String>, expires_at_ms: u64) -> Self {
        Self {
            jwt: jwt.into(),
            expires_at_ms,
        }
    }

    pub fn jwt(&self) -> &str {
        &self.jwt
    }

    pub fn expires_at_ms(&self) -> u64 {
        self.expires_at_ms
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(i64::try_from(self.expires_at_ms).ok()?)
    }

    /// True once inside the refresh buffer before expiry
    pub fn needs_refresh_at(&self, now_ms: u64) -> bool {
        now_ms > self.expires_at_ms.saturating_sub(JWT_REFRESH_BUFFER_MS)
    }

    pub fn needs_refresh(&self) -> bool {
        self.needs_refresh_at(current_time_ms())
    }
}

impl std::fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionToken")
            .field("jwt", &sanitize_jwt(&self.jwt))
            .field("expires_at_ms", &self.expires_at_ms)
            .finish()
    }
}

/// `exp` claim of a JWT, in milliseconds
fn jwt_expiry_ms(jwt: &str) -> Option<u64> {
    let payload = jwt.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    let claims: Value = serde_json::from_slice(&bytes).ok()?;
    claims.get("exp")?.as_u64()?.checked_mul(1000)
}

/// Source of bearer tokens for authenticated connections
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Current token, refreshed if close to expiry; `None` when unauthenticated
    async fn bearer_token(&self) -> ParadexResult<Option<String>>;
}

/// Fixed token, for callers that manage authentication themselves
pub struct StaticToken(pub String);

#[async_trait]
impl AuthProvider for StaticToken {
    async fn bearer_token(&self) -> ParadexResult<Option<String>> {
        Ok(Some(self.0.clone()))
    }
}

#[cfg(test)]
pub(crate) fn make_jwt(exp_secs: u64) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
    let claims = URL_SAFE_NO_PAD.encode(format!(r#"{{"sub":"0x1","exp":{}}}"#, exp_secs));
    format!("{}.{}.sig", header, claims)
}
