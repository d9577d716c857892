//! JWE compact serialization (RFC 7516).
//!
//! Key management: RSA1_5 and RSA-OAEP-256. Content encryption: A128GCM and
//! A256GCM. The additional authenticated data is the ASCII of the encoded
//! protected header.

use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes128Gcm, Aes256Gcm, Nonce};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::RngCore;
use rand::rngs::OsRng;
use rsa::{Oaep, Pkcs1v15Encrypt, RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;

use crate::jwt::error::JwtError;
use crate::jwt::jws::{JWT_TYPE, JoseHeader, decode_header};
use crate::jwt::keys::{ContentEncryptionAlgorithm, KeyManagementAlgorithm};

const IV_LEN: usize = 12;
const TAG_LEN: usize = 16;

/// Returns `true` if `token` has the five parts of a compact JWE.
#[must_use]
pub fn is_jwe(token: &str) -> bool {
    token.split('.').count() == 5
}

/// Encrypts `plaintext` for the holder of `recipient`.
///
/// `nested` marks the content as a JWT (`cty` = `JWT`).
///
/// # Errors
/// Returns an encryption error if key wrapping or sealing fails.
pub fn encrypt(
    plaintext: &[u8],
    alg: KeyManagementAlgorithm,
    enc: ContentEncryptionAlgorithm,
    recipient: &RsaPublicKey,
    kid: Option<&str>,
    nested: bool,
) -> Result<String, JwtError> {
    let header = JoseHeader {
        alg: alg.as_str().to_string(),
        enc: Some(enc.as_str().to_string()),
        kid: kid.map(str::to_string),
        typ: None,
        cty: nested.then(|| JWT_TYPE.to_string()),
    };
    let header = serde_json::to_vec(&header).map_err(|e| JwtError::encryption_error(e.to_string()))?;
    let encoded_header = URL_SAFE_NO_PAD.encode(header);

    let mut cek = vec![0u8; enc.key_len()];
    OsRng.fill_bytes(&mut cek);
    let mut iv = [0u8; IV_LEN];
    OsRng.fill_bytes(&mut iv);

    let encrypted_key = match alg {
        KeyManagementAlgorithm::Rsa1_5 => recipient.encrypt(&mut OsRng, Pkcs1v15Encrypt, &cek),
        KeyManagementAlgorithm::RsaOaep256 => {
            recipient.encrypt(&mut OsRng, Oaep::new::<Sha256>(), &cek)
        }
    }
    .map_err(|e| JwtError::encryption_error(format!("key wrapping failed: {}", e)))?;

    let payload = Payload {
        msg: plaintext,
        aad: encoded_header.as_bytes(),
    };
    let sealed = match enc {
        ContentEncryptionAlgorithm::A128GCM => Aes128Gcm::new_from_slice(&cek)
            .map_err(|e| JwtError::encryption_error(e.to_string()))?
            .encrypt(Nonce::from_slice(&iv), payload),
        ContentEncryptionAlgorithm::A256GCM => Aes256Gcm::new_from_slice(&cek)
            .map_err(|e| JwtError::encryption_error(e.to_string()))?
            .encrypt(Nonce::from_slice(&iv), payload),
    }
    .map_err(|_| JwtError::encryption_error("content encryption failed"))?;

    let (ciphertext, tag) = sealed.split_at(sealed.len() - TAG_LEN);
    Ok(format!(
        "{}.{}.{}.{}.{}",
        encoded_header,
        URL_SAFE_NO_PAD.encode(encrypted_key),
        URL_SAFE_NO_PAD.encode(iv),
        URL_SAFE_NO_PAD.encode(ciphertext),
        URL_SAFE_NO_PAD.encode(tag)
    ))
}

/// Decrypts a compact JWE with the server's private key.
///
/// # Errors
/// Returns a decryption error for malformed tokens, unsupported algorithms,
/// or failed authentication.
pub fn decrypt(token: &str, key: &RsaPrivateKey) -> Result<Vec<u8>, JwtError> {
    let parts: Vec<&str> = token.split('.').collect();
    let [encoded_header, encrypted_key, iv, ciphertext, tag] = *parts.as_slice() else {
        return Err(JwtError::decryption_error("a JWE has five parts"));
    };

    let header = decode_header(token)?;
    let alg: KeyManagementAlgorithm = header.alg.parse()?;
    let enc: ContentEncryptionAlgorithm = header
        .enc
        .as_deref()
        .ok_or_else(|| JwtError::decryption_error("missing enc header"))?
        .parse()?;

    let decode = |part: &str, what: &str| {
        URL_SAFE_NO_PAD
            .decode(part)
            .map_err(|e| JwtError::decryption_error(format!("{} is not base64url: {}", what, e)))
    };
    let encrypted_key = decode(encrypted_key, "encrypted key")?;
    let iv = decode(iv, "iv")?;
    let mut sealed = decode(ciphertext, "ciphertext")?;
    sealed.extend(decode(tag, "tag")?);

    if iv.len() != IV_LEN {
        return Err(JwtError::decryption_error("invalid iv length"));
    }

    let cek = match alg {
        KeyManagementAlgorithm::Rsa1_5 => key.decrypt(Pkcs1v15Encrypt, &encrypted_key),
        KeyManagementAlgorithm::RsaOaep256 => key.decrypt(Oaep::new::<Sha256>(), &encrypted_key),
    }
    .map_err(|_| JwtError::decryption_error("key unwrapping failed"))?;
    if cek.len() != enc.key_len() {
        return Err(JwtError::decryption_error("invalid content encryption key"));
    }

    let payload = Payload {
        msg: &sealed,
        aad: encoded_header.as_bytes(),
    };
    match enc {
        ContentEncryptionAlgorithm::A128GCM => Aes128Gcm::new_from_slice(&cek)
            .map_err(|e| JwtError::decryption_error(e.to_string()))?
            .decrypt(Nonce::from_slice(&iv), payload),
        ContentEncryptionAlgorithm::A256GCM => Aes256Gcm::new_from_slice(&cek)
            .map_err(|e| JwtError::decryption_error(e.to_string()))?
            .decrypt(Nonce::from_slice(&iv), payload),
    }
    .map_err(|_| JwtError::decryption_error("authentication tag mismatch"))
}
