//! Parsing and verification of incoming JWTs.
//!
//! Tokens arrive from two directions: clients send assertions and request
//! objects signed with their own keys, and requesting parties hand back ID
//! tokens this server issued (UMA claim tokens). Both may be wrapped in a JWE
//! addressed to the server.

use std::sync::Arc;

use time::OffsetDateTime;

use crate::AuthResult;
use crate::error::AuthError;
use crate::jwt::error::JwtError;
use crate::jwt::jwe;
use crate::jwt::jwks::ClientKeyResolver;
use crate::jwt::jws::{self, JoseHeader};
use crate::jwt::keys::{KeyManagementAlgorithm, KeyStore, SigningAlgorithm};
use crate::jwt::payload::JwtPayload;
use crate::types::Client;

/// Verifies and decrypts JWTs.
pub struct JwtParser {
    key_store: Arc<dyn KeyStore>,
    key_resolver: Arc<ClientKeyResolver>,
}

impl JwtParser {
    /// Creates a parser.
    #[must_use]
    pub fn new(key_store: Arc<dyn KeyStore>, key_resolver: Arc<ClientKeyResolver>) -> Self {
        Self {
            key_store,
            key_resolver,
        }
    }

    /// Returns `true` for a compact JWS.
    #[must_use]
    pub fn is_jws(token: &str) -> bool {
        token.split('.').count() == 3
    }

    /// Returns `true` for a compact JWE.
    #[must_use]
    pub fn is_jwe(token: &str) -> bool {
        jwe::is_jwe(token)
    }

    /// Reads the header without verifying anything.
    ///
    /// # Errors
    ///
    /// Returns `InvalidToken` for malformed input.
    pub fn header(token: &str) -> AuthResult<JoseHeader> {
        Ok(jws::decode_header(token)?)
    }

    /// Decrypts a JWE addressed to this server and returns the content.
    ///
    /// # Errors
    ///
    /// Returns `InvalidToken` if no server key matches or decryption fails.
    pub async fn decrypt(&self, token: &str) -> AuthResult<String> {
        let header = jws::decode_header(token)?;
        let key = match header.kid.as_deref() {
            Some(kid) => self.key_store.encryption_key_by_kid(kid).await?,
            None => {
                let alg: KeyManagementAlgorithm = header.alg.parse()?;
                self.key_store.encryption_key(alg).await?
            }
        }
        .ok_or_else(|| {
            AuthError::from(JwtError::decryption_error("no matching decryption key"))
        })?;

        let plaintext = jwe::decrypt(token, key.private_key())?;
        String::from_utf8(plaintext)
            .map_err(|_| AuthError::invalid_token("decrypted content is not UTF-8"))
    }

    /// Verifies a JWS signed by `client` and returns its payload.
    ///
    /// HMAC tokens are checked against every shared secret of the client,
    /// other algorithms against the client's registered keys. Unsecured
    /// tokens are refused.
    ///
    /// # Errors
    ///
    /// Returns `InvalidToken` when the signature does not verify, or
    /// `InvalidClient` when the client has no usable key.
    pub async fn unsign_with_client(&self, token: &str, client: &Client) -> AuthResult<JwtPayload> {
        let header = jws::decode_header(token)?;
        let alg: SigningAlgorithm = header.alg.parse()?;

        if alg == SigningAlgorithm::None {
            return Err(JwtError::unsupported_algorithm("none").into());
        }
        if let Some(expected) = client.token_endpoint_auth_signing_alg
            && expected != alg
        {
            return Err(JwtError::unsupported_algorithm(alg.as_str()).into());
        }

        if alg.is_symmetric() {
            for secret in client.shared_secrets() {
                if let Ok(payload) = jws::verify_with_secret(token, alg, secret.as_bytes()) {
                    return Ok(payload);
                }
            }
            return Err(JwtError::InvalidSignature.into());
        }

        let key = self
            .key_resolver
            .verification_key(client, header.kid.as_deref(), alg)
            .await?;
        Ok(jws::verify(token, alg, &key)?)
    }

    /// Verifies a JWS signed with one of the server's keys.
    ///
    /// # Errors
    ///
    /// Returns `InvalidToken` when the key is unknown or the signature does
    /// not verify.
    pub async fn unsign_with_server_keys(&self, token: &str) -> AuthResult<JwtPayload> {
        let header = jws::decode_header(token)?;
        let alg: SigningAlgorithm = header.alg.parse()?;
        if !alg.is_rsa() && !alg.is_ec() {
            return Err(JwtError::unsupported_algorithm(alg.as_str()).into());
        }

        let key = match header.kid.as_deref() {
            Some(kid) => self.key_store.signing_key_by_kid(kid).await?,
            None => self.key_store.signing_key(alg).await?,
        }
        .filter(|key| key.algorithm == alg)
        .ok_or_else(|| {
            AuthError::invalid_token(
                JwtError::key_not_found(header.kid.unwrap_or_else(|| alg.to_string())).to_string(),
            )
        })?;

        Ok(jws::verify(token, alg, key.decoding_key())?)
    }

    /// Validates an ID token issued by this server: decrypts it if needed,
    /// verifies the signature and checks `iss` and `exp`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidToken` on any failure.
    pub async fn validate_id_token(
        &self,
        token: &str,
        issuer: &str,
        now: OffsetDateTime,
    ) -> AuthResult<JwtPayload> {
        let jws = if Self::is_jwe(token) {
            self.decrypt(token).await?
        } else {
            token.to_string()
        };

        let payload = self.unsign_with_server_keys(&jws).await?;

        if payload.issuer() != Some(issuer) {
            tracing::debug!("ID token issued by another issuer");
            return Err(JwtError::invalid_claims("unexpected issuer").into());
        }
        match payload.expiration() {
            Some(exp) if exp > now.unix_timestamp() => Ok(payload),
            Some(_) => Err(JwtError::Expired.into()),
            None => Err(JwtError::invalid_claims("missing exp").into()),
        }
    }
}
