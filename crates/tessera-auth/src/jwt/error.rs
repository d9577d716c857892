//! JWT, JWS and JWE error type.

use crate::error::AuthError;

/// Failures of JWS, JWE and key handling.
///
/// Converted into [`AuthError`] at the action boundary: problems with the
/// presented token become `invalid_token`, everything else `server_error`.
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to encode a token.
    #[error("Failed to encode token: {message}")]
    EncodingError { message: String },

    /// Failed to decode a token.
    #[error("Failed to decode token: {message}")]
    DecodingError { message: String },

    /// Failed to encrypt a token.
    #[error("Failed to encrypt token: {message}")]
    EncryptionError { message: String },

    /// Failed to decrypt a token.
    #[error("Failed to decrypt token: {message}")]
    DecryptionError { message: String },

    /// The token has expired.
    #[error("Token expired")]
    Expired,

    /// The token signature is invalid.
    #[error("Invalid signature")]
    InvalidSignature,

    /// The token claims are invalid.
    #[error("Invalid claims: {message}")]
    InvalidClaims { message: String },

    /// The algorithm is unknown or not allowed here.
    #[error("Unsupported algorithm: {alg}")]
    UnsupportedAlgorithm { alg: String },

    /// The specified key was not found.
    #[error("Key not found: {kid}")]
    KeyNotFound { kid: String },

    /// Failed to generate a cryptographic key.
    #[error("Key generation error: {message}")]
    KeyGenerationError { message: String },

    /// Invalid key format or data.
    #[error("Invalid key: {message}")]
    InvalidKey { message: String },
}

impl JwtError {
    /// Creates a new `EncodingError`.
    #[must_use]
    pub fn encoding_error(message: impl Into<String>) -> Self {
        Self::EncodingError {
            message: message.into(),
        }
    }

    /// Creates a new `DecodingError`.
    #[must_use]
    pub fn decoding_error(message: impl Into<String>) -> Self {
        Self::DecodingError {
            message: message.into(),
        }
    }

    /// Creates a new `EncryptionError`.
    #[must_use]
    pub fn encryption_error(message: impl Into<String>) -> Self {
        Self::EncryptionError {
            message: message.into(),
        }
    }

    /// Creates a new `DecryptionError`.
    #[must_use]
    pub fn decryption_error(message: impl Into<String>) -> Self {
        Self::DecryptionError {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidClaims` error.
    #[must_use]
    pub fn invalid_claims(message: impl Into<String>) -> Self {
        Self::InvalidClaims {
            message: message.into(),
        }
    }

    /// Creates a new `UnsupportedAlgorithm` error.
    #[must_use]
    pub fn unsupported_algorithm(alg: impl Into<String>) -> Self {
        Self::UnsupportedAlgorithm { alg: alg.into() }
    }

    /// Creates a new `KeyNotFound` error.
    #[must_use]
    pub fn key_not_found(kid: impl Into<String>) -> Self {
        Self::KeyNotFound { kid: kid.into() }
    }

    /// Creates a new `KeyGenerationError`.
    #[must_use]
    pub fn key_generation_error(message: impl Into<String>) -> Self {
        Self::KeyGenerationError {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidKey` error.
    #[must_use]
    pub fn invalid_key(message: impl Into<String>) -> Self {
        Self::InvalidKey {
            message: message.into(),
        }
    }

    /// Returns `true` if the error is caused by the presented token itself.
    #[must_use]
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            Self::Expired
                | Self::InvalidSignature
                | Self::InvalidClaims { .. }
                | Self::DecodingError { .. }
                | Self::DecryptionError { .. }
                | Self::UnsupportedAlgorithm { .. }
        )
    }

    /// Returns `true` if this is a key-related error.
    #[must_use]
    pub fn is_key_error(&self) -> bool {
        matches!(
            self,
            Self::KeyNotFound { .. } | Self::KeyGenerationError { .. } | Self::InvalidKey { .. }
        )
    }
}

impl From<jsonwebtoken::errors::Error> for JwtError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::ExpiredSignature => Self::Expired,
            ErrorKind::InvalidSignature => Self::InvalidSignature,
            ErrorKind::InvalidToken
            | ErrorKind::InvalidAlgorithm
            | ErrorKind::InvalidAlgorithmName
            | ErrorKind::MissingAlgorithm => Self::decoding_error(err.to_string()),
            ErrorKind::InvalidAudience
            | ErrorKind::InvalidIssuer
            | ErrorKind::InvalidSubject
            | ErrorKind::MissingRequiredClaim(_) => Self::invalid_claims(err.to_string()),
            ErrorKind::InvalidRsaKey(_)
            | ErrorKind::InvalidEcdsaKey
            | ErrorKind::InvalidKeyFormat => Self::invalid_key(err.to_string()),
            _ => Self::decoding_error(err.to_string()),
        }
    }
}

impl From<JwtError> for AuthError {
    fn from(err: JwtError) -> Self {
        if err.is_validation_error() {
            AuthError::invalid_token(err.to_string())
        } else {
            AuthError::internal(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_jwt_error_predicates() {
        assert!(JwtError::Expired.is_validation_error());
        assert!(JwtError::InvalidSignature.is_validation_error());
        assert!(JwtError::key_not_found("kid").is_key_error());
        assert!(!JwtError::encoding_error("x").is_validation_error());
    }

    #[test]
    fn test_conversion_to_auth_error() {
        let err: AuthError = JwtError::Expired.into();
        assert_eq!(err.code(), ErrorCode::InvalidToken);

        let err: AuthError = JwtError::key_generation_error("rng").into();
        assert_eq!(err.code(), ErrorCode::ServerError);
    }
}
