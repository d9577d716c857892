//! JWT client assertions (RFC 7523).
//!
//! Used by the `client_secret_jwt` and `private_key_jwt` authentication
//! methods. The assertion must contain:
//!
//! - `iss` and `sub`: both equal to the client_id
//! - `aud`: must contain the issuer of this server
//! - `exp`: must be in the future
//! - `jti`: a unique identifier
//!
//! Signature verification is done by [`JwtParser`](crate::jwt::JwtParser);
//! this module only checks the claims.

use time::OffsetDateTime;

use crate::AuthResult;
use crate::error::AuthError;
use crate::jwt::jws;
use crate::jwt::payload::{JwtPayload, claim_names};

/// The only `client_assertion_type` accepted.
pub const CLIENT_ASSERTION_TYPE_JWT_BEARER: &str =
    "urn:ietf:params:oauth:client-assertion-type:jwt-bearer";

/// Validated claims of a client assertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientAssertionClaims {
    pub iss: String,
    pub sub: String,
    pub aud: Vec<String>,
    pub exp: i64,
    pub jti: String,
}

/// Reads the client_id from an assertion without verifying it.
///
/// The result is only used to look up the client whose keys then verify the
/// assertion.
///
/// # Errors
///
/// Returns `InvalidClient` if the assertion cannot be decoded or names no
/// client.
pub fn extract_client_id_unverified(assertion: &str) -> AuthResult<String> {
    let payload = jws::decode_payload_unverified(assertion)
        .map_err(|e| AuthError::invalid_client(format!("Invalid client assertion: {}", e)))?;
    payload
        .issuer()
        .or_else(|| payload.subject())
        .map(str::to_string)
        .ok_or_else(|| AuthError::invalid_client("Client assertion has no issuer"))
}

/// Checks the claims of a verified assertion.
///
/// # Errors
///
/// Returns `InvalidClient` describing the first failed check.
pub fn validate_assertion_claims(
    payload: &JwtPayload,
    client_id: &str,
    issuer: &str,
    now: OffsetDateTime,
) -> AuthResult<ClientAssertionClaims> {
    let iss = payload.issuer().unwrap_or_default();
    if iss != client_id {
        return Err(AuthError::invalid_client(
            "Assertion issuer must equal client_id",
        ));
    }

    let sub = payload.subject().unwrap_or_default();
    if sub != client_id {
        return Err(AuthError::invalid_client(
            "Assertion subject must equal client_id",
        ));
    }

    let aud = payload.audiences();
    if !aud.iter().any(|a| a == issuer) {
        return Err(AuthError::invalid_client(
            "Assertion audience must contain the issuer",
        ));
    }

    let exp = payload
        .expiration()
        .ok_or_else(|| AuthError::invalid_client("Assertion has no exp"))?;
    if exp <= now.unix_timestamp() {
        return Err(AuthError::invalid_client("Assertion has expired"));
    }

    let jti = payload
        .get_str(claim_names::JWT_ID)
        .filter(|j| !j.is_empty())
        .ok_or_else(|| AuthError::invalid_client("Assertion has no jti"))?;

    Ok(ClientAssertionClaims {
        iss: iss.to_string(),
        sub: sub.to_string(),
        aud,
        exp,
        jti: jti.to_string(),
    })
}
