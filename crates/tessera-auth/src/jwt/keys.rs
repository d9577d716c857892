//! Algorithms, key pairs and the server key store.
//!
//! ## Supported Algorithms
//!
//! - **JWS**: `none`, HS256/384/512 (client secret), RS256/384/512,
//!   PS256/384/512, ES384
//! - **JWE key management**: RSA1_5, RSA-OAEP-256
//! - **JWE content encryption**: A128GCM, A256GCM
//!
//! ## Example
//!
//! ```ignore
//! use tessera_auth::jwt::keys::{InMemoryKeyStore, SigningAlgorithm, SigningKeyPair};
//!
//! let key_pair = SigningKeyPair::generate_rsa(SigningAlgorithm::RS256)?;
//! let store = InMemoryKeyStore::new(SigningAlgorithm::RS256).with_signing_key(key_pair);
//! let jwks = store.public_jwks().await?;
//! ```

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use jsonwebtoken::jwk::{
    AlgorithmParameters, CommonParameters, EllipticCurve, EllipticCurveKeyParameters,
    EllipticCurveKeyType, Jwk, JwkSet, PublicKeyUse, RSAKeyParameters, RSAKeyType,
};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey};
use p384::SecretKey as EcSecretKey;
use p384::ecdsa::SigningKey as EcSigningKey;
use p384::pkcs8::{DecodePrivateKey as EcDecodePrivateKey, EncodePrivateKey as EcEncodePrivateKey};
use rand::rngs::OsRng;
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey, LineEnding};
use rsa::traits::PublicKeyParts;
use rsa::{BigUint, RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256, Sha384, Sha512};
use time::OffsetDateTime;

use crate::AuthResult;
use crate::config::SigningConfig;
use crate::error::AuthError;
use crate::jwt::error::JwtError;

// ============================================================================
// Signing Algorithm
// ============================================================================

/// JWS algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SigningAlgorithm {
    /// Unsecured JWS.
    #[serde(rename = "none")]
    None,
    /// HMAC with SHA-256.
    HS256,
    /// HMAC with SHA-384.
    HS384,
    /// HMAC with SHA-512.
    HS512,
    /// RSASSA-PKCS1-v1_5 with SHA-256.
    RS256,
    /// RSASSA-PKCS1-v1_5 with SHA-384.
    RS384,
    /// RSASSA-PKCS1-v1_5 with SHA-512.
    RS512,
    /// RSASSA-PSS with SHA-256.
    PS256,
    /// RSASSA-PSS with SHA-384.
    PS384,
    /// RSASSA-PSS with SHA-512.
    PS512,
    /// ECDSA with P-384 and SHA-384.
    ES384,
}

impl SigningAlgorithm {
    /// Converts to the `jsonwebtoken` Algorithm type. `none` has no equivalent.
    #[must_use]
    pub fn to_jwt_algorithm(self) -> Option<Algorithm> {
        match self {
            Self::None => None,
            Self::HS256 => Some(Algorithm::HS256),
            Self::HS384 => Some(Algorithm::HS384),
            Self::HS512 => Some(Algorithm::HS512),
            Self::RS256 => Some(Algorithm::RS256),
            Self::RS384 => Some(Algorithm::RS384),
            Self::RS512 => Some(Algorithm::RS512),
            Self::PS256 => Some(Algorithm::PS256),
            Self::PS384 => Some(Algorithm::PS384),
            Self::PS512 => Some(Algorithm::PS512),
            Self::ES384 => Some(Algorithm::ES384),
        }
    }

    /// Returns the algorithm name as used in JWK/JWT headers.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::HS256 => "HS256",
            Self::HS384 => "HS384",
            Self::HS512 => "HS512",
            Self::RS256 => "RS256",
            Self::RS384 => "RS384",
            Self::RS512 => "RS512",
            Self::PS256 => "PS256",
            Self::PS384 => "PS384",
            Self::PS512 => "PS512",
            Self::ES384 => "ES384",
        }
    }

    /// Returns `true` if this is an RSA-based algorithm (PKCS#1 or PSS).
    #[must_use]
    pub fn is_rsa(&self) -> bool {
        matches!(
            self,
            Self::RS256 | Self::RS384 | Self::RS512 | Self::PS256 | Self::PS384 | Self::PS512
        )
    }

    /// Returns `true` if this is an EC-based algorithm.
    #[must_use]
    pub fn is_ec(&self) -> bool {
        matches!(self, Self::ES384)
    }

    /// Returns `true` for the HMAC algorithms.
    #[must_use]
    pub fn is_symmetric(&self) -> bool {
        matches!(self, Self::HS256 | Self::HS384 | Self::HS512)
    }

    /// Hashes `input` with the SHA-2 variant named by the algorithm suffix.
    ///
    /// `none` uses SHA-256.
    #[must_use]
    pub fn hash(&self, input: &[u8]) -> Vec<u8> {
        match self {
            Self::HS384 | Self::RS384 | Self::PS384 | Self::ES384 => {
                Sha384::digest(input).to_vec()
            }
            Self::HS512 | Self::RS512 | Self::PS512 => Sha512::digest(input).to_vec(),
            _ => Sha256::digest(input).to_vec(),
        }
    }

    /// Computes an OpenID Connect `at_hash` / `c_hash` value: the base64url
    /// encoded left half of the hash of `value`.
    #[must_use]
    pub fn half_hash(&self, value: &str) -> String {
        let digest = self.hash(value.as_bytes());
        URL_SAFE_NO_PAD.encode(&digest[..digest.len() / 2])
    }
}

impl FromStr for SigningAlgorithm {
    type Err = JwtError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::None),
            "HS256" => Ok(Self::HS256),
            "HS384" => Ok(Self::HS384),
            "HS512" => Ok(Self::HS512),
            "RS256" => Ok(Self::RS256),
            "RS384" => Ok(Self::RS384),
            "RS512" => Ok(Self::RS512),
            "PS256" => Ok(Self::PS256),
            "PS384" => Ok(Self::PS384),
            "PS512" => Ok(Self::PS512),
            "ES384" => Ok(Self::ES384),
            other => Err(JwtError::unsupported_algorithm(other)),
        }
    }
}

impl fmt::Display for SigningAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Encryption Algorithms
// ============================================================================

/// JWE key management algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyManagementAlgorithm {
    /// RSAES-PKCS1-v1_5.
    #[serde(rename = "RSA1_5")]
    Rsa1_5,
    /// RSAES-OAEP with SHA-256 and MGF1 with SHA-256.
    #[serde(rename = "RSA-OAEP-256")]
    RsaOaep256,
}

impl KeyManagementAlgorithm {
    /// Returns the header value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rsa1_5 => "RSA1_5",
            Self::RsaOaep256 => "RSA-OAEP-256",
        }
    }
}

impl FromStr for KeyManagementAlgorithm {
    type Err = JwtError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "RSA1_5" => Ok(Self::Rsa1_5),
            "RSA-OAEP-256" => Ok(Self::RsaOaep256),
            other => Err(JwtError::unsupported_algorithm(other)),
        }
    }
}

impl fmt::Display for KeyManagementAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// JWE content encryption algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContentEncryptionAlgorithm {
    /// AES-GCM with a 128-bit key.
    A128GCM,
    /// AES-GCM with a 256-bit key.
    A256GCM,
}

impl ContentEncryptionAlgorithm {
    /// Returns the header value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::A128GCM => "A128GCM",
            Self::A256GCM => "A256GCM",
        }
    }

    /// Content encryption key length in bytes.
    #[must_use]
    pub fn key_len(&self) -> usize {
        match self {
            Self::A128GCM => 16,
            Self::A256GCM => 32,
        }
    }
}

impl FromStr for ContentEncryptionAlgorithm {
    type Err = JwtError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A128GCM" => Ok(Self::A128GCM),
            "A256GCM" => Ok(Self::A256GCM),
            other => Err(JwtError::unsupported_algorithm(other)),
        }
    }
}

impl fmt::Display for ContentEncryptionAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Signing Key Pair
// ============================================================================

/// An asymmetric signing key pair.
pub struct SigningKeyPair {
    /// Key ID.
    pub kid: String,

    /// Signing algorithm.
    pub algorithm: SigningAlgorithm,

    encoding_key: EncodingKey,

    decoding_key: DecodingKey,

    public_key_data: PublicKeyData,

    /// When the key was created.
    pub created_at: OffsetDateTime,
}

/// Public key material for JWKS export.
enum PublicKeyData {
    Rsa { n: Vec<u8>, e: Vec<u8> },
    Ec { x: Vec<u8>, y: Vec<u8> },
}

impl fmt::Debug for SigningKeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKeyPair")
            .field("kid", &self.kid)
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

impl SigningKeyPair {
    /// Generates a new 2048-bit RSA key pair for an RS* or PS* algorithm.
    ///
    /// # Errors
    /// Returns an error if key generation fails or algorithm is not RSA-based.
    pub fn generate_rsa(algorithm: SigningAlgorithm) -> Result<Self, JwtError> {
        if !algorithm.is_rsa() {
            return Err(JwtError::invalid_key(format!(
                "Algorithm {} is not RSA-based",
                algorithm
            )));
        }

        let private_key = RsaPrivateKey::new(&mut OsRng, 2048)
            .map_err(|e| JwtError::key_generation_error(e.to_string()))?;
        let private_pem = private_key
            .to_pkcs8_pem(LineEnding::LF)
            .map_err(|e| JwtError::key_generation_error(e.to_string()))?;
        let public_pem = private_key
            .to_public_key()
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| JwtError::key_generation_error(e.to_string()))?;

        Self::from_pem(
            uuid::Uuid::new_v4().to_string(),
            algorithm,
            private_pem.as_str(),
            &public_pem,
        )
    }

    /// Generates a new EC key pair using the P-384 curve.
    ///
    /// # Errors
    /// Returns an error if key generation fails.
    pub fn generate_ec() -> Result<Self, JwtError> {
        let secret_key = EcSecretKey::random(&mut OsRng);
        let private_pem = secret_key
            .to_pkcs8_pem(LineEnding::LF)
            .map_err(|e| JwtError::key_generation_error(e.to_string()))?;

        Self::from_pem(
            uuid::Uuid::new_v4().to_string(),
            SigningAlgorithm::ES384,
            private_pem.as_str(),
            "",
        )
    }

    /// Loads a key pair from PKCS#8 PEM strings.
    ///
    /// For ES384 the public key is derived from the private key and
    /// `public_pem` is ignored.
    ///
    /// # Errors
    /// Returns an error if the PEM data is invalid or the algorithm is not
    /// asymmetric.
    pub fn from_pem(
        kid: impl Into<String>,
        algorithm: SigningAlgorithm,
        private_pem: &str,
        public_pem: &str,
    ) -> Result<Self, JwtError> {
        let (encoding_key, decoding_key, public_key_data) = if algorithm.is_rsa() {
            let encoding_key = EncodingKey::from_rsa_pem(private_pem.as_bytes())
                .map_err(|e| JwtError::invalid_key(e.to_string()))?;
            let decoding_key = DecodingKey::from_rsa_pem(public_pem.as_bytes())
                .map_err(|e| JwtError::invalid_key(e.to_string()))?;

            let public_key = RsaPublicKey::from_public_key_pem(public_pem)
                .map_err(|e| JwtError::invalid_key(e.to_string()))?;
            let n = public_key.n().to_bytes_be();
            let e = public_key.e().to_bytes_be();

            (encoding_key, decoding_key, PublicKeyData::Rsa { n, e })
        } else if algorithm.is_ec() {
            let encoding_key = EncodingKey::from_ec_pem(private_pem.as_bytes())
                .map_err(|e| JwtError::invalid_key(e.to_string()))?;

            let secret_key = EcSecretKey::from_pkcs8_pem(private_pem)
                .map_err(|e| JwtError::invalid_key(e.to_string()))?;
            let signing_key = EcSigningKey::from(&secret_key);
            let point = signing_key.verifying_key().to_encoded_point(false);
            let x = point
                .x()
                .ok_or_else(|| JwtError::invalid_key("Missing x coordinate"))?;
            let y = point
                .y()
                .ok_or_else(|| JwtError::invalid_key("Missing y coordinate"))?;

            let x_b64 = URL_SAFE_NO_PAD.encode(x.as_slice());
            let y_b64 = URL_SAFE_NO_PAD.encode(y.as_slice());
            let decoding_key = DecodingKey::from_ec_components(&x_b64, &y_b64)
                .map_err(|e| JwtError::invalid_key(e.to_string()))?;

            (
                encoding_key,
                decoding_key,
                PublicKeyData::Ec {
                    x: x.to_vec(),
                    y: y.to_vec(),
                },
            )
        } else {
            return Err(JwtError::unsupported_algorithm(algorithm.as_str()));
        };

        Ok(Self {
            kid: kid.into(),
            algorithm,
            encoding_key,
            decoding_key,
            public_key_data,
            created_at: OffsetDateTime::now_utc(),
        })
    }

    /// Private key used to sign.
    pub(crate) fn encoding_key(&self) -> &EncodingKey {
        &self.encoding_key
    }

    /// Public key used to verify.
    pub(crate) fn decoding_key(&self) -> &DecodingKey {
        &self.decoding_key
    }

    /// Exports the public key as a JWK.
    #[must_use]
    pub fn to_jwk(&self) -> Jwk {
        let common = CommonParameters {
            public_key_use: Some(PublicKeyUse::Signature),
            key_algorithm: self.algorithm.as_str().parse().ok(),
            key_id: Some(self.kid.clone()),
            ..CommonParameters::default()
        };
        let algorithm = match &self.public_key_data {
            PublicKeyData::Rsa { n, e } => AlgorithmParameters::RSA(RSAKeyParameters {
                key_type: RSAKeyType::RSA,
                n: URL_SAFE_NO_PAD.encode(n),
                e: URL_SAFE_NO_PAD.encode(e),
            }),
            PublicKeyData::Ec { x, y } => {
                AlgorithmParameters::EllipticCurve(EllipticCurveKeyParameters {
                    key_type: EllipticCurveKeyType::EC,
                    curve: EllipticCurve::P384,
                    x: URL_SAFE_NO_PAD.encode(x),
                    y: URL_SAFE_NO_PAD.encode(y),
                })
            }
        };
        Jwk { common, algorithm }
    }
}

// ============================================================================
// Encryption Key Pair
// ============================================================================

/// RSA key pair used to decrypt JWEs addressed to this server.
pub struct EncryptionKeyPair {
    /// Key ID.
    pub kid: String,

    private_key: RsaPrivateKey,
}

impl fmt::Debug for EncryptionKeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptionKeyPair")
            .field("kid", &self.kid)
            .finish_non_exhaustive()
    }
}

impl EncryptionKeyPair {
    /// Generates a new 2048-bit RSA encryption key.
    ///
    /// # Errors
    /// Returns an error if key generation fails.
    pub fn generate() -> Result<Self, JwtError> {
        let private_key = RsaPrivateKey::new(&mut OsRng, 2048)
            .map_err(|e| JwtError::key_generation_error(e.to_string()))?;
        Ok(Self {
            kid: uuid::Uuid::new_v4().to_string(),
            private_key,
        })
    }

    /// Loads a key from a PKCS#8 PEM private key.
    ///
    /// # Errors
    /// Returns an error if the PEM data is invalid.
    pub fn from_pem(kid: impl Into<String>, private_pem: &str) -> Result<Self, JwtError> {
        let private_key = RsaPrivateKey::from_pkcs8_pem(private_pem)
            .map_err(|e| JwtError::invalid_key(e.to_string()))?;
        Ok(Self {
            kid: kid.into(),
            private_key,
        })
    }

    /// Private key.
    pub(crate) fn private_key(&self) -> &RsaPrivateKey {
        &self.private_key
    }

    /// Public key.
    #[must_use]
    pub fn public_key(&self) -> RsaPublicKey {
        self.private_key.to_public_key()
    }

    /// Exports the public key as a JWK with `use = enc`.
    #[must_use]
    pub fn to_jwk(&self) -> Jwk {
        let public_key = self.public_key();
        Jwk {
            common: CommonParameters {
                public_key_use: Some(PublicKeyUse::Encryption),
                key_id: Some(self.kid.clone()),
                ..CommonParameters::default()
            },
            algorithm: AlgorithmParameters::RSA(RSAKeyParameters {
                key_type: RSAKeyType::RSA,
                n: URL_SAFE_NO_PAD.encode(public_key.n().to_bytes_be()),
                e: URL_SAFE_NO_PAD.encode(public_key.e().to_bytes_be()),
            }),
        }
    }
}

/// Builds an RSA public key from a JWK.
///
/// # Errors
/// Returns an error if the JWK is not an RSA key or its parameters are invalid.
pub fn rsa_public_key_from_jwk(jwk: &Jwk) -> Result<RsaPublicKey, JwtError> {
    let AlgorithmParameters::RSA(params) = &jwk.algorithm else {
        return Err(JwtError::invalid_key("JWK is not an RSA key"));
    };
    let n = URL_SAFE_NO_PAD
        .decode(params.n.as_bytes())
        .map_err(|e| JwtError::invalid_key(format!("invalid modulus: {}", e)))?;
    let e = URL_SAFE_NO_PAD
        .decode(params.e.as_bytes())
        .map_err(|e| JwtError::invalid_key(format!("invalid exponent: {}", e)))?;
    RsaPublicKey::new(BigUint::from_bytes_be(&n), BigUint::from_bytes_be(&e))
        .map_err(|e| JwtError::invalid_key(e.to_string()))
}

/// Finds the first encryption key (`use` = `enc` or unspecified RSA) in a set.
#[must_use]
pub fn find_encryption_jwk(jwks: &JwkSet) -> Option<&Jwk> {
    jwks.keys.iter().find(|key| {
        matches!(key.algorithm, AlgorithmParameters::RSA(_))
            && matches!(
                key.common.public_key_use,
                Some(PublicKeyUse::Encryption) | None
            )
    })
}

// ============================================================================
// Key Store
// ============================================================================

/// Server-side key material.
///
/// Read-mostly and shared across concurrent requests.
#[async_trait]
pub trait KeyStore: Send + Sync {
    /// Returns a signing key for `alg`.
    async fn signing_key(&self, alg: SigningAlgorithm) -> AuthResult<Option<Arc<SigningKeyPair>>>;

    /// Returns the key used when no algorithm preference exists.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the store holds no signing key.
    async fn default_signing_key(&self) -> AuthResult<Arc<SigningKeyPair>>;

    /// Returns the signing key with the given key ID.
    async fn signing_key_by_kid(&self, kid: &str) -> AuthResult<Option<Arc<SigningKeyPair>>>;

    /// Returns a decryption key usable with `alg`.
    async fn encryption_key(
        &self,
        alg: KeyManagementAlgorithm,
    ) -> AuthResult<Option<Arc<EncryptionKeyPair>>>;

    /// Returns the decryption key with the given key ID.
    async fn encryption_key_by_kid(&self, kid: &str) -> AuthResult<Option<Arc<EncryptionKeyPair>>>;

    /// Returns the public JWKS (signing and encryption keys).
    async fn public_jwks(&self) -> AuthResult<JwkSet>;
}

/// Key store holding keys in memory.
#[derive(Debug)]
pub struct InMemoryKeyStore {
    default_algorithm: SigningAlgorithm,
    signing_keys: Vec<Arc<SigningKeyPair>>,
    encryption_keys: Vec<Arc<EncryptionKeyPair>>,
}

impl InMemoryKeyStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new(default_algorithm: SigningAlgorithm) -> Self {
        Self {
            default_algorithm,
            signing_keys: Vec::new(),
            encryption_keys: Vec::new(),
        }
    }

    /// Generates the keys named by the signing configuration.
    ///
    /// # Errors
    /// Returns an error if key generation fails.
    pub fn generate(config: &SigningConfig) -> Result<Self, JwtError> {
        let mut store = Self::new(config.default_algorithm);
        for alg in &config.algorithms {
            let key = if alg.is_ec() {
                SigningKeyPair::generate_ec()?
            } else {
                SigningKeyPair::generate_rsa(*alg)?
            };
            store = store.with_signing_key(key);
        }
        if config.encryption_enabled {
            store = store.with_encryption_key(EncryptionKeyPair::generate()?);
        }
        tracing::info!(
            signing_keys = store.signing_keys.len(),
            encryption_keys = store.encryption_keys.len(),
            "Generated server keys"
        );
        Ok(store)
    }

    /// Adds a signing key.
    #[must_use]
    pub fn with_signing_key(mut self, key: SigningKeyPair) -> Self {
        self.signing_keys.push(Arc::new(key));
        self
    }

    /// Adds an encryption key.
    #[must_use]
    pub fn with_encryption_key(mut self, key: EncryptionKeyPair) -> Self {
        self.encryption_keys.push(Arc::new(key));
        self
    }
}

#[async_trait]
impl KeyStore for InMemoryKeyStore {
    async fn signing_key(&self, alg: SigningAlgorithm) -> AuthResult<Option<Arc<SigningKeyPair>>> {
        Ok(self
            .signing_keys
            .iter()
            .find(|k| k.algorithm == alg)
            .cloned())
    }

    async fn default_signing_key(&self) -> AuthResult<Arc<SigningKeyPair>> {
        self.signing_keys
            .iter()
            .find(|k| k.algorithm == self.default_algorithm)
            .or_else(|| self.signing_keys.first())
            .cloned()
            .ok_or_else(|| AuthError::configuration("no signing key configured"))
    }

    async fn signing_key_by_kid(&self, kid: &str) -> AuthResult<Option<Arc<SigningKeyPair>>> {
        Ok(self.signing_keys.iter().find(|k| k.kid == kid).cloned())
    }

    async fn encryption_key(
        &self,
        _alg: KeyManagementAlgorithm,
    ) -> AuthResult<Option<Arc<EncryptionKeyPair>>> {
        // Every supported key management algorithm is RSA based.
        Ok(self.encryption_keys.first().cloned())
    }

    async fn encryption_key_by_kid(&self, kid: &str) -> AuthResult<Option<Arc<EncryptionKeyPair>>> {
        Ok(self.encryption_keys.iter().find(|k| k.kid == kid).cloned())
    }

    async fn public_jwks(&self) -> AuthResult<JwkSet> {
        let keys = self
            .signing_keys
            .iter()
            .map(|k| k.to_jwk())
            .chain(self.encryption_keys.iter().map(|k| k.to_jwk()))
            .collect();
        Ok(JwkSet { keys })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signing_algorithm_properties() {
        assert!(SigningAlgorithm::PS256.is_rsa());
        assert!(SigningAlgorithm::ES384.is_ec());
        assert!(SigningAlgorithm::HS512.is_symmetric());
        assert!(!SigningAlgorithm::None.is_symmetric());
        assert_eq!(SigningAlgorithm::None.to_jwt_algorithm(), None);
        assert_eq!(
            SigningAlgorithm::PS384.to_jwt_algorithm(),
            Some(Algorithm::PS384)
        );
    }

    #[test]
    fn test_algorithm_parsing_and_serde() {
        assert_eq!("RS512".parse::<SigningAlgorithm>().unwrap(), SigningAlgorithm::RS512);
        assert!("ES256".parse::<SigningAlgorithm>().is_err());
        assert_eq!(
            serde_json::to_string(&SigningAlgorithm::None).unwrap(),
            "\"none\""
        );
        assert_eq!(
            serde_json::to_string(&KeyManagementAlgorithm::RsaOaep256).unwrap(),
            "\"RSA-OAEP-256\""
        );
        assert_eq!(
            "A256GCM".parse::<ContentEncryptionAlgorithm>().unwrap().key_len(),
            32
        );
    }

    #[test]
    fn test_hash_size_follows_suffix() {
        assert_eq!(SigningAlgorithm::RS256.hash(b"x").len(), 32);
        assert_eq!(SigningAlgorithm::ES384.hash(b"x").len(), 48);
        assert_eq!(SigningAlgorithm::PS512.hash(b"x").len(), 64);
        assert_eq!(SigningAlgorithm::None.hash(b"x").len(), 32);
    }

    #[test]
    fn test_half_hash_rs256() {
        // Example from OpenID Connect Core, section A.3 (at_hash).
        let at_hash = SigningAlgorithm::RS256.half_hash("jHkWEdUXMU1BwAsC4vtUsZwnNvTIxEl0z9K3vx5KF0Y");
        assert_eq!(at_hash, "77QmUPtjPfzWtF2AnpK9RQ");
    }

    #[test]
    fn test_generate_ec_key_pair() {
        let key = SigningKeyPair::generate_ec().unwrap();
        assert_eq!(key.algorithm, SigningAlgorithm::ES384);
        let jwk = key.to_jwk();
        assert_eq!(jwk.common.key_id.as_deref(), Some(key.kid.as_str()));
        assert!(matches!(jwk.algorithm, AlgorithmParameters::EllipticCurve(_)));
    }

    #[test]
    fn test_generate_rsa_rejects_ec_algorithm() {
        let err = SigningKeyPair::generate_rsa(SigningAlgorithm::ES384).unwrap_err();
        assert!(err.is_key_error());
    }

    #[tokio::test]
    async fn test_in_memory_store_lookup() {
        let ec = SigningKeyPair::generate_ec().unwrap();
        let kid = ec.kid.clone();
        let store = InMemoryKeyStore::new(SigningAlgorithm::ES384).with_signing_key(ec);

        let default = store.default_signing_key().await.unwrap();
        assert_eq!(default.kid, kid);
        assert!(store.signing_key(SigningAlgorithm::RS256).await.unwrap().is_none());
        assert!(store.signing_key_by_kid(&kid).await.unwrap().is_some());
        assert!(
            store
                .encryption_key(KeyManagementAlgorithm::Rsa1_5)
                .await
                .unwrap()
                .is_none()
        );
        assert_eq!(store.public_jwks().await.unwrap().keys.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_store_has_no_default_key() {
        let store = InMemoryKeyStore::new(SigningAlgorithm::RS256);
        let err = store.default_signing_key().await.unwrap_err();
        assert!(err.is_server_error());
    }
}
