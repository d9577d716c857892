//! Client key resolution.
//!
//! A client publishes its keys either inline in its registration (`jwks`) or
//! at a `jwks_uri`. Remote key sets are fetched over HTTPS and cached in
//! memory with a TTL.
//!
//! # Security Considerations
//!
//! - Only HTTPS URIs are fetched
//! - HTTP timeouts prevent hanging on slow endpoints
//! - Response size is limited

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::jwk::{Jwk, JwkSet, PublicKeyUse};
use tokio::sync::RwLock;

use crate::AuthResult;
use crate::config::JwksFetchConfig;
use crate::error::AuthError;
use crate::jwt::keys::{SigningAlgorithm, find_encryption_jwk};
use crate::types::Client;

/// Retrieves a JWKS document.
#[async_trait]
pub trait JwksFetcher: Send + Sync {
    /// Fetches the key set published at `uri`.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be retrieved or parsed.
    async fn fetch(&self, uri: &str) -> AuthResult<JwkSet>;
}

/// `reqwest` based fetcher.
#[derive(Debug, Clone)]
pub struct HttpJwksFetcher {
    request_timeout: Duration,
    max_response_size: usize,
}

impl HttpJwksFetcher {
    /// Creates a fetcher from the JWKS configuration.
    #[must_use]
    pub fn new(config: &JwksFetchConfig) -> Self {
        Self {
            request_timeout: config.request_timeout,
            max_response_size: config.max_response_size,
        }
    }
}

#[async_trait]
impl JwksFetcher for HttpJwksFetcher {
    async fn fetch(&self, uri: &str) -> AuthResult<JwkSet> {
        if !uri.starts_with("https://") {
            return Err(AuthError::invalid_client("JWKS URI must use HTTPS"));
        }

        let client = reqwest::Client::builder()
            .timeout(self.request_timeout)
            .build()
            .map_err(|e| AuthError::internal(format!("Failed to create HTTP client: {}", e)))?;

        let response = client
            .get(uri)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(jwks_uri = %uri, error = %e, "Failed to fetch JWKS");
                AuthError::internal(format!("Failed to fetch JWKS: {}", e))
            })?;

        if !response.status().is_success() {
            return Err(AuthError::internal(format!(
                "JWKS fetch failed with status: {}",
                response.status()
            )));
        }

        if let Some(len) = response.content_length()
            && len as usize > self.max_response_size
        {
            return Err(AuthError::internal("JWKS response exceeds maximum size"));
        }

        response
            .json()
            .await
            .map_err(|e| AuthError::internal(format!("Invalid JWKS JSON: {}", e)))
    }
}

struct CachedJwks {
    jwks: JwkSet,
    fetched_at: Instant,
}

/// Resolves verification and encryption keys registered by clients.
pub struct ClientKeyResolver {
    fetcher: Arc<dyn JwksFetcher>,
    cache: RwLock<HashMap<String, CachedJwks>>,
    ttl: Duration,
}

impl ClientKeyResolver {
    /// Creates a resolver backed by `fetcher`.
    #[must_use]
    pub fn new(fetcher: Arc<dyn JwksFetcher>, ttl: Duration) -> Self {
        Self {
            fetcher,
            cache: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Creates a resolver that fetches over HTTPS.
    #[must_use]
    pub fn from_config(config: &JwksFetchConfig) -> Self {
        Self::new(Arc::new(HttpJwksFetcher::new(config)), config.cache_ttl)
    }

    /// Returns the client's key set: inline keys win over `jwks_uri`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidClient` when the client registered no keys, or a
    /// server error when the remote set cannot be fetched.
    pub async fn key_set(&self, client: &Client) -> AuthResult<JwkSet> {
        if let Some(jwks) = &client.jwks {
            return Ok(jwks.clone());
        }
        let Some(uri) = client.jwks_uri.as_deref() else {
            return Err(AuthError::invalid_client(format!(
                "client '{}' has no registered keys",
                client.client_id
            )));
        };

        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.get(uri)
                && cached.fetched_at.elapsed() < self.ttl
            {
                return Ok(cached.jwks.clone());
            }
        }

        let jwks = self.fetcher.fetch(uri).await?;
        tracing::debug!(client_id = %client.client_id, keys = jwks.keys.len(), "Fetched client JWKS");

        let mut cache = self.cache.write().await;
        cache.insert(
            uri.to_string(),
            CachedJwks {
                jwks: jwks.clone(),
                fetched_at: Instant::now(),
            },
        );
        Ok(jwks)
    }

    /// Returns the key that verifies a token signed with `alg` (and `kid`,
    /// when present).
    ///
    /// # Errors
    ///
    /// Returns `InvalidClient` when no suitable key exists.
    pub async fn verification_key(
        &self,
        client: &Client,
        kid: Option<&str>,
        alg: SigningAlgorithm,
    ) -> AuthResult<DecodingKey> {
        let jwks = self.key_set(client).await?;
        let key = find_verification_jwk(&jwks, kid, alg).ok_or_else(|| match kid {
            Some(kid) => AuthError::invalid_client(format!("Key '{}' not found in JWKS", kid)),
            None => AuthError::invalid_client("No suitable key found in JWKS"),
        })?;
        DecodingKey::from_jwk(key).map_err(|e| AuthError::invalid_client(format!("Invalid JWK: {}", e)))
    }

    /// Returns the client's encryption key.
    ///
    /// # Errors
    ///
    /// Returns `InvalidClient` when the client published no encryption key.
    pub async fn encryption_key(&self, client: &Client) -> AuthResult<Jwk> {
        let jwks = self.key_set(client).await?;
        find_encryption_jwk(&jwks).cloned().ok_or_else(|| {
            AuthError::invalid_client(format!(
                "client '{}' has no encryption key",
                client.client_id
            ))
        })
    }

    /// Drops a cached key set.
    pub async fn invalidate(&self, jwks_uri: &str) {
        self.cache.write().await.remove(jwks_uri);
    }
}

fn find_verification_jwk<'a>(
    jwks: &'a JwkSet,
    kid: Option<&str>,
    alg: SigningAlgorithm,
) -> Option<&'a Jwk> {
    jwks.keys.iter().find(|key| {
        if let Some(expected_kid) = kid
            && key.common.key_id.as_deref() != Some(expected_kid)
        {
            return false;
        }
        if let Some(key_alg) = &key.common.key_algorithm
            && key_alg.to_string() != alg.as_str()
        {
            return false;
        }
        !matches!(&key.common.public_key_use, Some(u) if *u != PublicKeyUse::Signature)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwt::keys::SigningKeyPair;
    use crate::types::GrantType;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingFetcher {
        jwks: JwkSet,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl JwksFetcher for CountingFetcher {
        async fn fetch(&self, _uri: &str) -> AuthResult<JwkSet> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.jwks.clone())
        }
    }

    fn ec_jwks() -> (JwkSet, String) {
        let key = SigningKeyPair::generate_ec().unwrap();
        let kid = key.kid.clone();
        (JwkSet { keys: vec![key.to_jwk()] }, kid)
    }

    #[tokio::test]
    async fn test_remote_key_set_is_cached() {
        let (jwks, kid) = ec_jwks();
        let fetcher = Arc::new(CountingFetcher {
            jwks,
            calls: AtomicUsize::new(0),
        });
        let resolver = ClientKeyResolver::new(fetcher.clone(), Duration::from_secs(60));

        let mut client = Client::new("remote", vec![GrantType::ClientCredentials]);
        client.jwks_uri = Some("https://client.example.com/jwks".to_string());

        resolver
            .verification_key(&client, Some(&kid), SigningAlgorithm::ES384)
            .await
            .unwrap();
        resolver
            .verification_key(&client, None, SigningAlgorithm::ES384)
            .await
            .unwrap();
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);

        resolver.invalidate("https://client.example.com/jwks").await;
        resolver.key_set(&client).await.unwrap();
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_inline_keys_and_missing_keys() {
        let (jwks, _) = ec_jwks();
        let resolver = ClientKeyResolver::from_config(&JwksFetchConfig::default());

        let mut client = Client::new("inline", vec![GrantType::ClientCredentials]);
        assert!(resolver.key_set(&client).await.is_err());

        client.jwks = Some(jwks);
        assert!(
            resolver
                .verification_key(&client, Some("unknown"), SigningAlgorithm::ES384)
                .await
                .is_err()
        );
        assert!(
            resolver
                .verification_key(&client, None, SigningAlgorithm::RS256)
                .await
                .is_err()
        );
        assert!(resolver.encryption_key(&client).await.is_err());
    }

    #[tokio::test]
    async fn test_http_fetcher_requires_https() {
        let fetcher = HttpJwksFetcher::new(&JwksFetchConfig::default());
        let err = fetcher.fetch("http://client.example.com/jwks").await.unwrap_err();
        assert_eq!(err.code(), crate::error::ErrorCode::InvalidClient);
    }
}
