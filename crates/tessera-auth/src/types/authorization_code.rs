//! Authorization code domain type.
//!
//! An authorization code binds a client, the granted scopes, the redirect URI,
//! an optional PKCE challenge and the ID-token/user-info payloads computed
//! while the end user was present. Codes are consumed exactly once.

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::jwt::claims::ClaimsParameter;
use crate::jwt::payload::JwtPayload;
use crate::oauth::pkce::PkceChallengeMethod;

/// Authorization code issued by the authorization endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizationCode {
    /// The code value (256-bit random, base64url-encoded).
    pub code: String,

    /// Client the code was issued to.
    pub client_id: String,

    /// Redirect URI of the authorization request.
    pub redirect_uri: String,

    /// When the code was created.
    #[serde(with = "time::serde::rfc3339")]
    pub create_time: OffsetDateTime,

    /// Granted scopes.
    pub scopes: Vec<String>,

    /// PKCE code challenge.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_challenge: Option<String>,

    /// PKCE challenge method.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_challenge_method: Option<PkceChallengeMethod>,

    /// OpenID Connect nonce.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,

    /// `state` of the authorization request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    /// Pre-computed ID token payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_token_payload: Option<JwtPayload>,

    /// Pre-computed user info payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_info_payload: Option<JwtPayload>,

    /// Requested `claims` parameter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claims: Option<ClaimsParameter>,
}

impl AuthorizationCode {
    /// Generates a new cryptographically secure authorization code value.
    ///
    /// 32 random bytes, base64url without padding (43 characters).
    #[must_use]
    pub fn generate_code() -> String {
        let mut bytes = [0u8; 32];
        rand::Rng::fill(&mut rand::thread_rng(), &mut bytes);
        URL_SAFE_NO_PAD.encode(bytes)
    }

    /// Returns `true` once `now` is past `create_time + validity`.
    #[must_use]
    pub fn is_expired(&self, validity: Duration, now: OffsetDateTime) -> bool {
        now > self.create_time + validity
    }

    /// Returns the granted scopes as a space-delimited string.
    #[must_use]
    pub fn scope_string(&self) -> String {
        self.scopes.join(" ")
    }
}
