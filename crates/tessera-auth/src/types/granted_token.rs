//! Granted token domain type.
//!
//! A granted token is the issuance record persisted by the token store. It
//! keeps the payload snapshots used to build the ID token and user info so
//! refresh exchanges and reuse checks do not recompute claims.

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use time::OffsetDateTime;

use crate::jwt::payload::JwtPayload;

/// Token type returned for every token minted by this server.
pub const BEARER_TOKEN_TYPE: &str = "bearer";

/// Issuance record of an access token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrantedToken {
    /// Record identifier.
    pub id: String,

    /// Opaque access token.
    pub access_token: String,

    /// Opaque refresh token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// Serialized ID token (JWS or JWE).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,

    /// Granted scopes (space-separated).
    pub scope: String,

    /// Lifetime in seconds.
    pub expires_in: u64,

    /// When the token was issued.
    #[serde(with = "time::serde::rfc3339")]
    pub create_date_time: OffsetDateTime,

    /// Client the token was issued to.
    pub client_id: String,

    /// Token this one was refreshed from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_token_id: Option<String>,

    /// Always [`BEARER_TOKEN_TYPE`].
    pub token_type: String,

    /// User info payload snapshot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_info_payload: Option<JwtPayload>,

    /// ID token payload snapshot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_token_payload: Option<JwtPayload>,
}

impl GrantedToken {
    /// Returns the instant after which the access token is no longer valid.
    #[must_use]
    pub fn expires_at(&self) -> OffsetDateTime {
        self.create_date_time + Duration::from_secs(self.expires_in)
    }

    /// Returns `true` if the access token has expired at `now`.
    #[must_use]
    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        now >= self.expires_at()
    }

    /// Returns the granted scopes.
    pub fn scopes(&self) -> impl Iterator<Item = &str> {
        self.scope.split_whitespace()
    }

    /// Returns the subject the token was issued for, if any.
    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        self.user_info_payload
            .as_ref()
            .and_then(JwtPayload::subject)
            .or_else(|| self.id_token_payload.as_ref().and_then(JwtPayload::subject))
    }
}

/// Generates a cryptographically secure opaque token.
///
/// 32 random bytes, base64url without padding.
#[must_use]
pub fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::Rng::fill(&mut rand::thread_rng(), &mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Hashes a token with SHA-256 and returns it hex-encoded.
///
/// Used wherever a token value must be logged or correlated without
/// revealing it.
#[must_use]
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn make_token(create: OffsetDateTime) -> GrantedToken {
        GrantedToken {
            id: "id-1".to_string(),
            access_token: generate_token(),
            refresh_token: None,
            id_token: None,
            scope: "openid api1".to_string(),
            expires_in: 3600,
            create_date_time: create,
            client_id: "client".to_string(),
            parent_token_id: None,
            token_type: BEARER_TOKEN_TYPE.to_string(),
            user_info_payload: None,
            id_token_payload: None,
        }
    }

    #[test]
    fn test_expiry() {
        let now = OffsetDateTime::now_utc();
        let token = make_token(now);
        assert!(!token.is_expired(now));
        assert!(!token.is_expired(now + Duration::from_secs(3599)));
        assert!(token.is_expired(now + Duration::from_secs(3600)));
    }

    #[test]
    fn test_scopes() {
        let token = make_token(OffsetDateTime::now_utc());
        assert_eq!(token.scopes().collect::<Vec<_>>(), vec!["openid", "api1"]);
    }

    #[test]
    fn test_subject_from_payloads() {
        let mut token = make_token(OffsetDateTime::now_utc());
        assert_eq!(token.subject(), None);

        let mut payload = JwtPayload::new();
        payload.insert("sub", json!("alice"));
        token.id_token_payload = Some(payload);
        assert_eq!(token.subject(), Some("alice"));
    }

    #[test]
    fn test_hash_token_deterministic() {
        let hash = hash_token("abc");
        assert_eq!(hash.len(), 64);
        assert_eq!(hash, hash_token("abc"));
        assert_ne!(hash, hash_token("abd"));
    }
}
