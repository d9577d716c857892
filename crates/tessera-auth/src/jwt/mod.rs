//! JWS/JWE generation and parsing.
//!
//! - [`payload`] - claim container and claim names
//! - [`claims`] - `claims` request parameter and constraints
//! - [`keys`] - algorithms, key pairs and the server [`KeyStore`]
//! - [`jws`] / [`jwe`] - compact serialization
//! - [`jwks`] - client key resolution (`jwks` / `jwks_uri`)
//! - [`generator`] - ID token and user info payloads, signing, encryption
//! - [`parser`] - verification and decryption

pub mod claims;
pub mod error;
pub mod generator;
pub mod jwe;
pub mod jwks;
pub mod jws;
pub mod keys;
pub mod parser;
pub mod payload;

pub use claims::{ClaimConstraint, ClaimParameter, ClaimsParameter};
pub use error::JwtError;
pub use generator::JwtGenerator;
pub use jwks::{ClientKeyResolver, HttpJwksFetcher, JwksFetcher};
pub use keys::{
    ContentEncryptionAlgorithm, EncryptionKeyPair, InMemoryKeyStore, KeyManagementAlgorithm,
    KeyStore, SigningAlgorithm, SigningKeyPair,
};
pub use parser::JwtParser;
pub use payload::JwtPayload;
