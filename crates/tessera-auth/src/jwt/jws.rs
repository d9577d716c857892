//! JWS compact serialization.
//!
//! Asymmetric and HMAC signatures go through `jsonwebtoken`. The unsecured
//! `none` form (`header.payload.`) and header inspection are handled here
//! because `jsonwebtoken` only models signing algorithms it can verify.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::jwt::error::JwtError;
use crate::jwt::keys::{SigningAlgorithm, SigningKeyPair};
use crate::jwt::payload::JwtPayload;

/// Media type of a signed JWT.
pub const JWT_TYPE: &str = "JWT";

/// JOSE header of a JWS or JWE.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoseHeader {
    /// Signing or key management algorithm.
    pub alg: String,

    /// Content encryption algorithm (JWE only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enc: Option<String>,

    /// Key ID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,

    /// Media type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typ: Option<String>,

    /// Content type; `JWT` for nested tokens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cty: Option<String>,
}

/// Signs `payload` with a server key.
///
/// # Errors
/// Returns an error if the key cannot produce a signature.
pub fn sign_with_key(payload: &JwtPayload, key: &SigningKeyPair) -> Result<String, JwtError> {
    let alg = key
        .algorithm
        .to_jwt_algorithm()
        .ok_or_else(|| JwtError::unsupported_algorithm(key.algorithm.as_str()))?;
    let mut header = Header::new(alg);
    header.kid = Some(key.kid.clone());
    header.typ = Some(JWT_TYPE.to_string());
    encode(&header, payload, key.encoding_key()).map_err(|e| JwtError::encoding_error(e.to_string()))
}

/// Signs `payload` with an HMAC algorithm keyed by a client secret.
///
/// # Errors
/// Returns an error if `alg` is not an HMAC algorithm.
pub fn sign_with_secret(
    payload: &JwtPayload,
    alg: SigningAlgorithm,
    secret: &[u8],
) -> Result<String, JwtError> {
    if !alg.is_symmetric() {
        return Err(JwtError::unsupported_algorithm(alg.as_str()));
    }
    let jwt_alg = alg
        .to_jwt_algorithm()
        .ok_or_else(|| JwtError::unsupported_algorithm(alg.as_str()))?;
    let mut header = Header::new(jwt_alg);
    header.typ = Some(JWT_TYPE.to_string());
    encode(&header, payload, &EncodingKey::from_secret(secret))
        .map_err(|e| JwtError::encoding_error(e.to_string()))
}

/// Produces an unsecured JWS (`alg` = `none`) with an empty signature.
///
/// # Errors
/// Returns an error if the payload cannot be serialized.
pub fn sign_unsecured(payload: &JwtPayload) -> Result<String, JwtError> {
    let header = JoseHeader {
        alg: SigningAlgorithm::None.as_str().to_string(),
        typ: Some(JWT_TYPE.to_string()),
        ..JoseHeader::default()
    };
    let header = serde_json::to_vec(&header).map_err(|e| JwtError::encoding_error(e.to_string()))?;
    let body = serde_json::to_vec(payload).map_err(|e| JwtError::encoding_error(e.to_string()))?;
    Ok(format!(
        "{}.{}.",
        URL_SAFE_NO_PAD.encode(header),
        URL_SAFE_NO_PAD.encode(body)
    ))
}

/// Decodes the JOSE header of a compact JWS or JWE without verifying it.
///
/// # Errors
/// Returns a decoding error for malformed input.
pub fn decode_header(token: &str) -> Result<JoseHeader, JwtError> {
    let encoded = token
        .split('.')
        .next()
        .filter(|part| !part.is_empty())
        .ok_or_else(|| JwtError::decoding_error("missing header"))?;
    let bytes = URL_SAFE_NO_PAD
        .decode(encoded)
        .map_err(|e| JwtError::decoding_error(format!("header is not base64url: {}", e)))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| JwtError::decoding_error(format!("header is not valid JSON: {}", e)))
}

/// Decodes the payload of a compact JWS without verifying the signature.
///
/// # Errors
/// Returns a decoding error for malformed input.
pub fn decode_payload_unverified(token: &str) -> Result<JwtPayload, JwtError> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err(JwtError::decoding_error("a JWS has three parts"));
    }
    let bytes = URL_SAFE_NO_PAD
        .decode(parts[1])
        .map_err(|e| JwtError::decoding_error(format!("payload is not base64url: {}", e)))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| JwtError::decoding_error(format!("payload is not a JSON object: {}", e)))
}

/// Verifies the signature of `token` and returns its payload.
///
/// Only the signature is checked; time and audience rules are applied by
/// the caller, which knows the token profile.
///
/// # Errors
/// Returns `InvalidSignature` on mismatch, `UnsupportedAlgorithm` for `none`.
pub fn verify(token: &str, alg: SigningAlgorithm, key: &DecodingKey) -> Result<JwtPayload, JwtError> {
    let jwt_alg = alg
        .to_jwt_algorithm()
        .ok_or_else(|| JwtError::unsupported_algorithm(alg.as_str()))?;
    let mut validation = Validation::new(jwt_alg);
    validation.required_spec_claims.clear();
    validation.validate_exp = false;
    validation.validate_nbf = false;
    validation.validate_aud = false;
    Ok(decode::<JwtPayload>(token, key, &validation)?.claims)
}

/// Verifies an HMAC-signed token against one shared secret.
///
/// # Errors
/// Same as [`verify`].
pub fn verify_with_secret(
    token: &str,
    alg: SigningAlgorithm,
    secret: &[u8],
) -> Result<JwtPayload, JwtError> {
    if !alg.is_symmetric() {
        return Err(JwtError::unsupported_algorithm(alg.as_str()));
    }
    verify(token, alg, &DecodingKey::from_secret(secret))
}

/// Accepts an unsecured JWS and returns its payload.
///
/// # Errors
/// Returns an error unless the header says `none` and the signature is empty.
pub fn verify_unsecured(token: &str) -> Result<JwtPayload, JwtError> {
    let header = decode_header(token)?;
    if header.alg != SigningAlgorithm::None.as_str() {
        return Err(JwtError::unsupported_algorithm(header.alg));
    }
    if !token.ends_with('.') {
        return Err(JwtError::InvalidSignature);
    }
    decode_payload_unverified(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_payload() -> JwtPayload {
        let mut payload = JwtPayload::new();
        payload.insert("sub", "alice");
        payload.insert("iss", "https://issuer.example.com");
        payload
    }

    #[test]
    fn test_unsecured_round_trip() {
        let token = sign_unsecured(&sample_payload()).unwrap();
        assert!(token.ends_with('.'));
        assert_eq!(decode_header(&token).unwrap().alg, "none");
        assert_eq!(verify_unsecured(&token).unwrap(), sample_payload());
    }

    #[test]
    fn test_hmac_sign_and_verify() {
        let token = sign_with_secret(&sample_payload(), SigningAlgorithm::HS384, b"secret").unwrap();
        let header = decode_header(&token).unwrap();
        assert_eq!(header.alg, "HS384");
        assert_eq!(header.typ.as_deref(), Some("JWT"));

        let payload = verify_with_secret(&token, SigningAlgorithm::HS384, b"secret").unwrap();
        assert_eq!(payload.subject(), Some("alice"));

        let err = verify_with_secret(&token, SigningAlgorithm::HS384, b"other").unwrap_err();
        assert!(matches!(err, JwtError::InvalidSignature));
    }

    #[test]
    fn test_hmac_rejects_asymmetric_algorithm() {
        assert!(sign_with_secret(&sample_payload(), SigningAlgorithm::RS256, b"s").is_err());
    }

    #[test]
    fn test_ec_sign_and_verify() {
        let key = SigningKeyPair::generate_ec().unwrap();
        let token = sign_with_key(&sample_payload(), &key).unwrap();
        assert_eq!(decode_header(&token).unwrap().kid.as_deref(), Some(key.kid.as_str()));

        let payload = verify(&token, SigningAlgorithm::ES384, key.decoding_key()).unwrap();
        assert_eq!(payload, sample_payload());
    }

    #[test]
    fn test_unverified_decoding_rejects_garbage() {
        assert!(decode_header("").is_err());
        assert!(decode_header("!!!.a.b").is_err());
        assert!(decode_payload_unverified("a.b").is_err());
        assert!(verify_unsecured("e30.e30.sig").is_err());
    }
}
