//! PKCE (Proof Key for Code Exchange) implementation
//!
//! Implements RFC 7636 with the `plain` and `S256` methods.
//!
//! # Example
//!
//! ```
//! use tessera_auth::oauth::{PkceVerifier, PkceChallenge, PkceChallengeMethod};
//!
//! // Client generates a verifier and challenge
//! let verifier = PkceVerifier::generate();
//! let challenge = PkceChallenge::from_verifier(&verifier, PkceChallengeMethod::S256);
//!
//! // Server stores the challenge, later verifies with the verifier from the token request
//! assert!(challenge.verify(verifier.as_str(), PkceChallengeMethod::S256).is_ok());
//! ```

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::error::AuthError;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur during PKCE operations.
#[derive(Debug, thiserror::Error)]
pub enum PkceError {
    /// Verifier length is outside the valid range (43-128 characters).
    #[error("Invalid verifier length: must be 43-128 characters, got {0}")]
    InvalidVerifierLength(usize),

    /// Verifier contains invalid characters.
    #[error("Invalid verifier characters: must be URL-safe base64 ([A-Za-z0-9-._~])")]
    InvalidVerifierCharacters,

    /// Unsupported challenge method.
    #[error("Unsupported challenge method: {0}")]
    UnsupportedMethod(String),

    /// The verifier is absent although a challenge was registered.
    #[error("The code verifier is missing")]
    MissingVerifier,

    /// The verifier does not match the challenge.
    #[error("The code verifier is not correct")]
    VerificationFailed,
}

impl PkceError {
    /// Create an `UnsupportedMethod` error.
    #[must_use]
    pub fn unsupported_method(method: impl Into<String>) -> Self {
        Self::UnsupportedMethod(method.into())
    }

    /// Returns `true` if this is a verifier validation error.
    #[must_use]
    pub fn is_verifier_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidVerifierLength(_) | Self::InvalidVerifierCharacters
        )
    }

    /// Returns `true` if the verifier did not prove possession.
    #[must_use]
    pub fn is_verification_error(&self) -> bool {
        matches!(self, Self::MissingVerifier | Self::VerificationFailed)
    }
}

/// Every PKCE failure is a malformed or unproven request.
impl From<PkceError> for AuthError {
    fn from(err: PkceError) -> Self {
        AuthError::invalid_request(err.to_string())
    }
}

// =============================================================================
// PKCE Challenge Method
// =============================================================================

/// PKCE challenge method.
///
/// RFC 7636 makes `plain` the default when no method is sent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PkceChallengeMethod {
    /// The challenge is the verifier itself.
    #[default]
    #[serde(rename = "plain")]
    Plain,
    /// SHA-256 hash.
    S256,
}

impl PkceChallengeMethod {
    /// Parse challenge method from string.
    ///
    /// # Errors
    ///
    /// Returns `PkceError::UnsupportedMethod` for anything but `plain` and `S256`.
    pub fn parse(method: &str) -> Result<Self, PkceError> {
        match method {
            "plain" => Ok(Self::Plain),
            "S256" => Ok(Self::S256),
            other => Err(PkceError::unsupported_method(other)),
        }
    }

    /// Get the method as a string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Plain => "plain",
            Self::S256 => "S256",
        }
    }

    /// Transforms a verifier into the challenge this method expects.
    #[must_use]
    pub fn transform(&self, verifier: &str) -> String {
        match self {
            Self::Plain => verifier.to_string(),
            Self::S256 => URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes())),
        }
    }
}

impl std::fmt::Display for PkceChallengeMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// PKCE Verifier
// =============================================================================

/// PKCE code verifier.
///
/// A high-entropy cryptographic random string using the unreserved characters
/// `[A-Z] / [a-z] / [0-9] / "-" / "." / "_" / "~"`, with a minimum length of
/// 43 characters and a maximum length of 128 characters.
#[derive(Debug, Clone)]
pub struct PkceVerifier(String);

impl PkceVerifier {
    /// Create a new verifier from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Length is not between 43 and 128 characters
    /// - Contains characters other than `[A-Za-z0-9-._~]`
    pub fn new(verifier: String) -> Result<Self, PkceError> {
        let len = verifier.len();

        if !(43..=128).contains(&len) {
            return Err(PkceError::InvalidVerifierLength(len));
        }

        if !verifier
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.' || c == '_' || c == '~')
        {
            return Err(PkceError::InvalidVerifierCharacters);
        }

        Ok(Self(verifier))
    }

    /// Generate a cryptographically random verifier.
    ///
    /// Generates 32 random bytes and encodes them as base64url (43 characters).
    #[must_use]
    pub fn generate() -> Self {
        use rand::Rng;
        let mut rng = rand::thread_rng();
        // `gen` is a reserved keyword in Rust 2024
        let bytes: [u8; 32] = rng.r#gen();
        Self(URL_SAFE_NO_PAD.encode(bytes))
    }

    /// Get the verifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for PkceVerifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// =============================================================================
// PKCE Challenge
// =============================================================================

/// PKCE code challenge registered with an authorization code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PkceChallenge(String);

impl PkceChallenge {
    /// Wraps a challenge received from a client.
    #[must_use]
    pub fn new(challenge: impl Into<String>) -> Self {
        Self(challenge.into())
    }

    /// Derives the challenge for `verifier`.
    #[must_use]
    pub fn from_verifier(verifier: &PkceVerifier, method: PkceChallengeMethod) -> Self {
        Self(method.transform(verifier.as_str()))
    }

    /// Verifies that `verifier` matches this challenge under `method`.
    ///
    /// The comparison is constant-time.
    ///
    /// # Errors
    ///
    /// Returns `PkceError::VerificationFailed` if the verifier doesn't match.
    pub fn verify(&self, verifier: &str, method: PkceChallengeMethod) -> Result<(), PkceError> {
        let expected = method.transform(verifier);
        if bool::from(expected.as_bytes().ct_eq(self.0.as_bytes())) {
            Ok(())
        } else {
            Err(PkceError::VerificationFailed)
        }
    }

    /// Get the challenge as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Checks the `code_verifier` of a token request against the challenge
/// stored with the authorization code.
///
/// No stored challenge means PKCE was not used and nothing is checked.
///
/// # Errors
///
/// Returns `MissingVerifier` or `VerificationFailed`.
pub fn check_code_verifier(
    challenge: Option<&str>,
    method: Option<PkceChallengeMethod>,
    verifier: Option<&str>,
) -> Result<(), PkceError> {
    let Some(challenge) = challenge.filter(|c| !c.is_empty()) else {
        return Ok(());
    };
    let verifier = verifier
        .filter(|v| !v.is_empty())
        .ok_or(PkceError::MissingVerifier)?;
    PkceChallenge::new(challenge).verify(verifier, method.unwrap_or_default())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verifier_generation() {
        let verifier = PkceVerifier::generate();
        assert_eq!(verifier.as_str().len(), 43);
        assert!(PkceVerifier::new(verifier.as_str().to_string()).is_ok());
    }

    #[test]
    fn test_verifier_validation() {
        assert!(matches!(
            PkceVerifier::new("a".repeat(42)),
            Err(PkceError::InvalidVerifierLength(42))
        ));
        assert!(PkceVerifier::new("a".repeat(128)).is_ok());
        assert!(PkceVerifier::new("a".repeat(129)).is_err());
        assert!(matches!(
            PkceVerifier::new(format!("{}!", "a".repeat(43))),
            Err(PkceError::InvalidVerifierCharacters)
        ));
    }

    #[test]
    fn test_s256_rfc_example() {
        // RFC 7636 Appendix B
        let verifier = "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk";
        let challenge = PkceChallengeMethod::S256.transform(verifier);
        assert_eq!(challenge, "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM");
    }

    #[test]
    fn test_challenge_verification() {
        let verifier = PkceVerifier::generate();
        let challenge = PkceChallenge::from_verifier(&verifier, PkceChallengeMethod::S256);
        assert!(challenge.verify(verifier.as_str(), PkceChallengeMethod::S256).is_ok());
        assert!(challenge.verify("wrong", PkceChallengeMethod::S256).is_err());

        let plain = PkceChallenge::new("plain-verifier");
        assert!(plain.verify("plain-verifier", PkceChallengeMethod::Plain).is_ok());
    }

    #[test]
    fn test_check_code_verifier() {
        assert!(check_code_verifier(None, None, None).is_ok());
        assert!(matches!(
            check_code_verifier(Some("abc"), None, None),
            Err(PkceError::MissingVerifier)
        ));
        assert!(check_code_verifier(Some("abc"), None, Some("abc")).is_ok());
        assert!(check_code_verifier(Some("abc"), Some(PkceChallengeMethod::S256), Some("abc")).is_err());
    }

    #[test]
    fn test_challenge_method_parsing() {
        assert_eq!(PkceChallengeMethod::parse("S256").unwrap(), PkceChallengeMethod::S256);
        assert_eq!(PkceChallengeMethod::parse("plain").unwrap(), PkceChallengeMethod::Plain);
        assert!(PkceChallengeMethod::parse("S512").is_err());
        assert_eq!(PkceChallengeMethod::default(), PkceChallengeMethod::Plain);
        assert_eq!(
            serde_json::to_string(&PkceChallengeMethod::Plain).unwrap(),
            "\"plain\""
        );
    }

    #[test]
    fn test_error_maps_to_invalid_request() {
        let err: AuthError = PkceError::VerificationFailed.into();
        assert_eq!(err.code(), crate::error::ErrorCode::InvalidRequest);
        assert!(err.to_string().contains("The code verifier is not correct"));
    }
}
