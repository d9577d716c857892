//! ID token and user info generation.
//!
//! The generator assembles payloads from a [`ClaimsPrincipal`], filtered
//! either by the requested scopes or by an explicit `claims` request
//! parameter, adds the protocol claims (`iss`, `aud`, `azp`, `exp`, `iat`,
//! `auth_time`, `nonce`, `acr`, `amr`, `at_hash`, `c_hash`) and turns the
//! result into a JWS, optionally wrapped in a JWE, following the client's
//! registered algorithm preferences.
//!
//! # Audience
//!
//! `aud` lists every client registered for the `id_token` response type plus
//! the issuer. `azp` names the requesting client whenever `aud` is not
//! exactly that client.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use time::OffsetDateTime;

use crate::AuthResult;
use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::jwt::claims::{ClaimConstraint, ClaimParameter};
use crate::jwt::jwe;
use crate::jwt::jwks::ClientKeyResolver;
use crate::jwt::jws;
use crate::jwt::keys::{
    ContentEncryptionAlgorithm, KeyManagementAlgorithm, KeyStore, SigningAlgorithm,
    rsa_public_key_from_jwk,
};
use crate::jwt::payload::{JwtPayload, PROTOCOL_CLAIMS, claim_names};
use crate::oauth::authorize::AuthorizationParameter;
use crate::storage::{ClientStore, ScopeStore};
use crate::types::{Client, ClaimsPrincipal, DEFAULT_AMR, ResponseType};

/// Builds, signs and encrypts ID tokens and user info responses.
pub struct JwtGenerator {
    client_store: Arc<dyn ClientStore>,
    scope_store: Arc<dyn ScopeStore>,
    key_store: Arc<dyn KeyStore>,
    key_resolver: Arc<ClientKeyResolver>,
    default_algorithm: SigningAlgorithm,
    default_token_lifetime: Duration,
}

impl JwtGenerator {
    /// Creates a generator.
    #[must_use]
    pub fn new(
        config: &AuthConfig,
        client_store: Arc<dyn ClientStore>,
        scope_store: Arc<dyn ScopeStore>,
        key_store: Arc<dyn KeyStore>,
        key_resolver: Arc<ClientKeyResolver>,
    ) -> Self {
        Self {
            client_store,
            scope_store,
            key_store,
            key_resolver,
            default_algorithm: config.signing.default_algorithm,
            default_token_lifetime: config.oauth.default_token_lifetime,
        }
    }

    // ------------------------------------------------------------------------
    // Dates
    // ------------------------------------------------------------------------

    /// Returns `(iat, exp)` for a token issued to `client` at `now`.
    #[must_use]
    pub fn token_expiration(&self, client: Option<&Client>, now: OffsetDateTime) -> (i64, i64) {
        let lifetime = client
            .map(|c| c.token_lifetime_secs(self.default_token_lifetime.as_secs()))
            .unwrap_or(self.default_token_lifetime.as_secs());
        let iat = now.unix_timestamp();
        (iat, iat.saturating_add(i64::try_from(lifetime).unwrap_or(i64::MAX)))
    }

    /// Replaces `iat` and `exp` with values computed at `now`.
    pub fn update_payload_date(&self, payload: &mut JwtPayload, client: &Client, now: OffsetDateTime) {
        let (iat, exp) = self.token_expiration(Some(client), now);
        payload.insert(claim_names::ISSUED_AT, iat);
        payload.insert(claim_names::EXPIRATION, exp);
    }

    // ------------------------------------------------------------------------
    // ID token payloads
    // ------------------------------------------------------------------------

    /// Builds an ID token payload releasing the claims of the requested
    /// OpenID scopes.
    ///
    /// # Errors
    ///
    /// Returns `InvalidGrant` (with the request state) when the principal has
    /// no subject.
    pub async fn generate_id_token_payload_for_scopes(
        &self,
        principal: &ClaimsPrincipal,
        params: &AuthorizationParameter,
        issuer: &str,
        now: OffsetDateTime,
    ) -> AuthResult<JwtPayload> {
        let mut payload = JwtPayload::new();
        self.fill_in_identity_token_claims(&mut payload, principal, params, issuer, now)
            .await?;
        self.fill_in_scope_claims(&mut payload, principal, params).await?;
        Ok(payload)
    }

    /// Builds an ID token payload holding exactly the requested claims, each
    /// checked against its constraint.
    ///
    /// # Errors
    ///
    /// Returns `InvalidGrant` naming the first claim whose value does not
    /// satisfy its constraint, carrying the request state.
    pub async fn generate_filtered_id_token_payload(
        &self,
        principal: &ClaimsPrincipal,
        params: &AuthorizationParameter,
        claim_parameters: &[ClaimParameter],
        issuer: &str,
        now: OffsetDateTime,
    ) -> AuthResult<JwtPayload> {
        let mut payload = JwtPayload::new();
        self.fill_in_identity_token_claims(&mut payload, principal, params, issuer, now)
            .await?;

        for parameter in claim_parameters
            .iter()
            .filter(|p| PROTOCOL_CLAIMS.contains(&p.name.as_str()))
        {
            if !parameter.is_satisfied_by(payload.get(&parameter.name)) {
                return Err(invalid_claim(&parameter.name, params));
            }
        }

        fill_in_requested_claims(&mut payload, claim_parameters, principal, params)?;
        Ok(payload)
    }

    // ------------------------------------------------------------------------
    // User info payloads
    // ------------------------------------------------------------------------

    /// Builds a user info payload releasing the claims of the requested
    /// OpenID scopes.
    ///
    /// # Errors
    ///
    /// Returns `InvalidGrant` when the principal has no subject.
    pub async fn generate_user_info_payload_for_scope(
        &self,
        principal: &ClaimsPrincipal,
        params: &AuthorizationParameter,
    ) -> AuthResult<JwtPayload> {
        let mut payload = JwtPayload::new();
        self.fill_in_scope_claims(&mut payload, principal, params).await?;
        Ok(payload)
    }

    /// Builds a user info payload holding exactly the requested claims.
    ///
    /// # Errors
    ///
    /// Returns `InvalidGrant` naming the first claim that does not satisfy
    /// its constraint.
    pub fn generate_filtered_user_info_payload(
        &self,
        claim_parameters: &[ClaimParameter],
        principal: &ClaimsPrincipal,
        params: &AuthorizationParameter,
    ) -> AuthResult<JwtPayload> {
        let mut payload = JwtPayload::new();
        fill_in_requested_claims(&mut payload, claim_parameters, principal, params)?;
        Ok(payload)
    }

    /// Adds `at_hash` and `c_hash` for the issued access token and code.
    ///
    /// The hash follows the algorithm the ID token will be signed with.
    pub fn fill_in_other_claims_identity_token_payload(
        &self,
        payload: &mut JwtPayload,
        authorization_code: Option<&str>,
        access_token: Option<&str>,
        client: &Client,
    ) {
        let alg = self.id_token_algorithm(client);
        if let Some(access_token) = access_token {
            payload.insert(claim_names::AT_HASH, alg.half_hash(access_token));
        }
        if let Some(code) = authorization_code {
            payload.insert(claim_names::C_HASH, alg.half_hash(code));
        }
    }

    // ------------------------------------------------------------------------
    // Signing and encryption
    // ------------------------------------------------------------------------

    /// Signs `payload` with `alg`.
    ///
    /// HMAC algorithms use the client's first shared secret; asymmetric ones
    /// use the server key registered for the algorithm.
    ///
    /// # Errors
    ///
    /// Returns a server error when no key exists for the algorithm.
    pub async fn sign(
        &self,
        payload: &JwtPayload,
        alg: SigningAlgorithm,
        client: &Client,
    ) -> AuthResult<String> {
        if alg == SigningAlgorithm::None {
            return Ok(jws::sign_unsecured(payload)?);
        }
        if alg.is_symmetric() {
            let secret = client.shared_secrets().next().ok_or_else(|| {
                AuthError::configuration(format!(
                    "client '{}' has no shared secret for {}",
                    client.client_id, alg
                ))
            })?;
            return Ok(jws::sign_with_secret(payload, alg, secret.as_bytes())?);
        }

        let key = self.key_store.signing_key(alg).await?.ok_or_else(|| {
            AuthError::configuration(format!("no signing key for algorithm {}", alg))
        })?;
        Ok(jws::sign_with_key(payload, &key)?)
    }

    /// Encrypts `content` for `client`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidClient` when the client published no encryption key.
    pub async fn encrypt(
        &self,
        content: &str,
        alg: KeyManagementAlgorithm,
        enc: ContentEncryptionAlgorithm,
        client: &Client,
        nested: bool,
    ) -> AuthResult<String> {
        let jwk = self.key_resolver.encryption_key(client).await?;
        let public_key = rsa_public_key_from_jwk(&jwk).map_err(|e| {
            AuthError::invalid_client(format!("unusable encryption key: {}", e))
        })?;
        Ok(jwe::encrypt(
            content.as_bytes(),
            alg,
            enc,
            &public_key,
            jwk.common.key_id.as_deref(),
            nested,
        )?)
    }

    /// Produces the serialized ID token following the client's
    /// `id_token_signed_response_alg` and encryption preferences.
    ///
    /// # Errors
    ///
    /// Propagates signing and encryption failures.
    pub async fn sign_and_encrypt_id_token(
        &self,
        payload: &JwtPayload,
        client: &Client,
    ) -> AuthResult<String> {
        let jws = self.sign(payload, self.id_token_algorithm(client), client).await?;
        match client.id_token_encrypted_response_alg {
            Some(alg) => {
                let enc = client
                    .id_token_encrypted_response_enc
                    .unwrap_or(ContentEncryptionAlgorithm::A128GCM);
                self.encrypt(&jws, alg, enc, client, true).await
            }
            None => Ok(jws),
        }
    }

    /// Produces the user info response as a JWT when the client registered
    /// a signing or encryption preference, `None` for plain JSON.
    ///
    /// # Errors
    ///
    /// Propagates signing and encryption failures.
    pub async fn sign_and_encrypt_user_info(
        &self,
        payload: &JwtPayload,
        client: &Client,
    ) -> AuthResult<Option<String>> {
        let signed = match client.userinfo_signed_response_alg {
            Some(alg) => Some(self.sign(payload, alg, client).await?),
            None => None,
        };

        let Some(alg) = client.userinfo_encrypted_response_alg else {
            return Ok(signed);
        };
        let enc = client
            .userinfo_encrypted_response_enc
            .unwrap_or(ContentEncryptionAlgorithm::A128GCM);
        let (content, nested) = match signed {
            Some(jws) => (jws, true),
            None => (
                serde_json::to_string(payload).map_err(|e| AuthError::internal(e.to_string()))?,
                false,
            ),
        };
        Ok(Some(self.encrypt(&content, alg, enc, client, nested).await?))
    }

    /// Returns the algorithm ID tokens for `client` are signed with.
    #[must_use]
    pub fn id_token_algorithm(&self, client: &Client) -> SigningAlgorithm {
        client
            .id_token_signed_response_alg
            .unwrap_or(self.default_algorithm)
    }

    // ------------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------------

    async fn fill_in_identity_token_claims(
        &self,
        payload: &mut JwtPayload,
        principal: &ClaimsPrincipal,
        params: &AuthorizationParameter,
        issuer: &str,
        now: OffsetDateTime,
    ) -> AuthResult<()> {
        let client = self.client_store.get_by_id(&params.client_id).await?;
        let audiences = match &client {
            Some(_) => {
                let mut audiences: Vec<String> = self
                    .client_store
                    .get_all()
                    .await?
                    .into_iter()
                    .filter(|c| c.response_types.contains(&ResponseType::IdToken))
                    .map(|c| c.client_id)
                    .collect();
                audiences.push(issuer.to_string());
                audiences
            }
            None => vec![issuer.to_string()],
        };

        let (iat, exp) = self.token_expiration(client.as_ref(), now);
        let auth_time = principal
            .json_value(claim_names::AUTH_TIME)
            .and_then(|v| v.as_i64())
            .unwrap_or(iat);
        let amr = {
            let values = principal.values(claim_names::AMR);
            if values.is_empty() {
                vec![DEFAULT_AMR.to_string()]
            } else {
                values.into_iter().map(str::to_string).collect()
            }
        };

        payload.insert(claim_names::ISSUER, issuer);
        payload.set_audiences(&audiences);
        if audiences.len() > 1 || audiences[0] != params.client_id {
            payload.insert(claim_names::AZP, params.client_id.as_str());
        }
        payload.insert(claim_names::EXPIRATION, exp);
        payload.insert(claim_names::ISSUED_AT, iat);
        payload.insert(claim_names::AUTH_TIME, auth_time);
        if let Some(nonce) = params.nonce.as_deref().filter(|n| !n.is_empty()) {
            payload.insert(claim_names::NONCE, nonce);
        }
        if let Some(acr) = principal.first(claim_names::ACR) {
            payload.insert(claim_names::ACR, acr);
        }
        payload.insert(claim_names::AMR, amr);
        Ok(())
    }

    async fn fill_in_scope_claims(
        &self,
        payload: &mut JwtPayload,
        principal: &ClaimsPrincipal,
        params: &AuthorizationParameter,
    ) -> AuthResult<()> {
        let subject = principal
            .subject()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| invalid_claim(claim_names::SUBJECT, params))?;
        payload.insert(claim_names::SUBJECT, subject);

        let scopes = self.scope_store.search_by_names(&params.scopes()).await?;
        for claim in scopes
            .iter()
            .filter(|s| s.is_openid_scope)
            .flat_map(|s| s.claims.iter())
        {
            if claim == claim_names::SUBJECT || PROTOCOL_CLAIMS.contains(&claim.as_str()) {
                continue;
            }
            if let Some(value) = principal.json_value(claim) {
                payload.insert(claim.as_str(), value);
            }
        }
        Ok(())
    }
}

/// Adds every requested claim the principal holds, checking constraints.
/// The subject is always treated as essential.
fn fill_in_requested_claims(
    payload: &mut JwtPayload,
    claim_parameters: &[ClaimParameter],
    principal: &ClaimsPrincipal,
    params: &AuthorizationParameter,
) -> AuthResult<()> {
    let subject = claim_parameters
        .iter()
        .find(|p| p.name == claim_names::SUBJECT)
        .map(|p| ClaimParameter::new(claim_names::SUBJECT, ClaimConstraint {
            essential: true,
            ..p.constraint.clone()
        }))
        .unwrap_or_else(|| ClaimParameter::new(claim_names::SUBJECT, ClaimConstraint::essential()));

    let requested = std::iter::once(&subject).chain(
        claim_parameters
            .iter()
            .filter(|p| p.name != claim_names::SUBJECT && !PROTOCOL_CLAIMS.contains(&p.name.as_str())),
    );

    for parameter in requested {
        let value = principal.json_value(&parameter.name);
        if !parameter.is_satisfied_by(value.as_ref()) {
            tracing::debug!(claim = %parameter.name, "Requested claim not satisfied");
            return Err(invalid_claim(&parameter.name, params));
        }
        if let Some(value) = value.filter(|v| !v.is_null()) {
            payload.insert(parameter.name.as_str(), value);
        }
    }
    Ok(())
}

fn invalid_claim(name: &str, params: &AuthorizationParameter) -> AuthError {
    AuthError::invalid_grant(format!("The claim {} is not valid", name))
        .with_optional_state(params.state())
}

/// Reads the value of a produced claim as a string list, for logging and
/// consent bookkeeping.
#[must_use]
pub fn claim_names_of(payload: &JwtPayload) -> Vec<String> {
    payload
        .iter()
        .filter(|(name, value)| !PROTOCOL_CLAIMS.contains(&name.as_str()) && !Value::is_null(value))
        .map(|(name, _)| name.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClaimsConfig;
    use crate::error::ErrorCode;
    use crate::jwt::claims::ClaimsParameter;
    use crate::jwt::keys::{EncryptionKeyPair, InMemoryKeyStore, SigningKeyPair};
    use crate::storage::memory::{InMemoryClientStore, InMemoryScopeStore};
    use crate::types::{Claim, ClientSecret, GrantType};
    use jsonwebtoken::jwk::JwkSet;
    use serde_json::json;

    const ISSUER: &str = "https://issuer.example.com";

    fn client(id: &str, response_types: Vec<ResponseType>) -> Client {
        let mut client = Client::new(id, vec![GrantType::AuthorizationCode]);
        client.response_types = response_types;
        client.secrets = vec![ClientSecret::shared("secret")];
        client
    }

    fn principal() -> ClaimsPrincipal {
        ClaimsPrincipal::new(vec![
            Claim::new("sub", "alice"),
            Claim::new("email", "alice@example.com"),
            Claim::new("email_verified", "true"),
            Claim::new("role", "admin"),
            Claim::new("role", "user"),
        ])
    }

    fn params(client_id: &str) -> AuthorizationParameter {
        AuthorizationParameter {
            client_id: client_id.to_string(),
            scope: "openid email".to_string(),
            state: Some("state-1".to_string()),
            nonce: Some("nonce-1".to_string()),
            ..AuthorizationParameter::default()
        }
    }

    fn generator(clients: Vec<Client>) -> JwtGenerator {
        let config = AuthConfig {
            issuer: ISSUER.to_string(),
            ..AuthConfig::default()
        };
        let client_store = Arc::new(InMemoryClientStore::new());
        for c in clients {
            client_store.insert(c);
        }
        let scope_store = Arc::new(InMemoryScopeStore::new());
        scope_store.seed_if_empty(&ClaimsConfig::default());
        let key_store = InMemoryKeyStore::new(SigningAlgorithm::ES384)
            .with_signing_key(SigningKeyPair::generate_ec().unwrap());
        let mut config = config;
        config.signing.default_algorithm = SigningAlgorithm::ES384;
        JwtGenerator::new(
            &config,
            client_store,
            scope_store,
            Arc::new(key_store),
            Arc::new(ClientKeyResolver::from_config(&config.jwks)),
        )
    }

    #[tokio::test]
    async fn test_scope_payload_and_audiences() {
        let generator = generator(vec![
            client("web", vec![ResponseType::Code, ResponseType::IdToken]),
            client("spa", vec![ResponseType::IdToken]),
            client("api", vec![ResponseType::Code]),
        ]);
        let now = OffsetDateTime::now_utc();

        let payload = generator
            .generate_id_token_payload_for_scopes(&principal(), &params("web"), ISSUER, now)
            .await
            .unwrap();

        assert_eq!(payload.subject(), Some("alice"));
        assert_eq!(payload.issuer(), Some(ISSUER));
        assert_eq!(payload.get("email"), Some(&json!("alice@example.com")));
        assert_eq!(payload.get("email_verified"), Some(&json!(true)));
        assert!(!payload.contains("role"));
        assert_eq!(payload.get_str("nonce"), Some("nonce-1"));
        assert_eq!(payload.audiences(), vec!["spa", "web", ISSUER]);
        assert_eq!(payload.get_str("azp"), Some("web"));
        assert_eq!(payload.get("amr"), Some(&json!(["pwd"])));
    }

    #[tokio::test]
    async fn test_unknown_client_audience_is_issuer() {
        let generator = generator(vec![]);
        let payload = generator
            .generate_filtered_id_token_payload(
                &principal(),
                &params("ghost"),
                &[],
                ISSUER,
                OffsetDateTime::now_utc(),
            )
            .await
            .unwrap();

        assert_eq!(payload.get("aud"), Some(&json!(ISSUER)));
        assert_eq!(payload.get_str("azp"), Some("ghost"));
    }

    #[tokio::test]
    async fn test_filtered_payload_rejects_missing_essential_claim() {
        let generator = generator(vec![client("web", vec![ResponseType::IdToken])]);
        let claims = ClaimsParameter::parse(r#"{"id_token":{"phone_number":{"essential":true}}}"#).unwrap();

        let err = generator
            .generate_filtered_id_token_payload(
                &principal(),
                &params("web"),
                &claims.id_token,
                ISSUER,
                OffsetDateTime::now_utc(),
            )
            .await
            .unwrap_err();

        assert_eq!(err.code(), ErrorCode::InvalidGrant);
        assert_eq!(err.state(), Some("state-1"));
        assert!(err.to_string().contains("phone_number"));
    }

    #[tokio::test]
    async fn test_filtered_payload_checks_protocol_and_multi_valued_claims() {
        let generator = generator(vec![client("web", vec![ResponseType::IdToken])]);
        let now = OffsetDateTime::now_utc();

        let claims = ClaimsParameter::parse(
            r#"{"id_token":{"role":{"values":["admin"]},"email":null,"iss":{"value":"https://issuer.example.com"}}}"#,
        )
        .unwrap();
        let payload = generator
            .generate_filtered_id_token_payload(&principal(), &params("web"), &claims.id_token, ISSUER, now)
            .await
            .unwrap();
        assert_eq!(payload.get("role"), Some(&json!(["admin", "user"])));
        assert!(payload.contains("email"));
        assert!(!payload.contains("email_verified"));

        let claims = ClaimsParameter::parse(r#"{"id_token":{"iss":{"value":"https://evil"}}}"#).unwrap();
        let err = generator
            .generate_filtered_id_token_payload(&principal(), &params("web"), &claims.id_token, ISSUER, now)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("iss"));
    }

    #[tokio::test]
    async fn test_subject_is_always_essential() {
        let generator = generator(vec![]);
        let anonymous = ClaimsPrincipal::new(vec![Claim::new("email", "x@example.com")]);

        let err = generator
            .generate_filtered_user_info_payload(&[], &anonymous, &params("web"))
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidGrant);

        let err = generator
            .generate_user_info_payload_for_scope(&anonymous, &params("web"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("sub"));
    }

    #[test]
    fn test_update_payload_date_replaces_claims() {
        let generator = generator(vec![]);
        let mut web = client("web", vec![]);
        web.token_lifetime = Some(120);
        let mut payload = JwtPayload::new();
        payload.insert("iat", 1);
        payload.insert("exp", 2);

        let now = OffsetDateTime::from_unix_timestamp(1_000).unwrap();
        generator.update_payload_date(&mut payload, &web, now);

        assert_eq!(payload.len(), 2);
        assert_eq!(payload.get_i64("iat"), Some(1_000));
        assert_eq!(payload.get_i64("exp"), Some(1_120));
    }

    #[test]
    fn test_hashes_follow_client_algorithm() {
        let generator = generator(vec![]);
        let mut web = client("web", vec![]);
        web.id_token_signed_response_alg = Some(SigningAlgorithm::RS256);
        let mut payload = JwtPayload::new();

        generator.fill_in_other_claims_identity_token_payload(
            &mut payload,
            Some("code"),
            Some("jHkWEdUXMU1BwAsC4vtUsZwnNvTIxEl0z9K3vx5KF0Y"),
            &web,
        );
        assert_eq!(payload.get_str("at_hash"), Some("77QmUPtjPfzWtF2AnpK9RQ"));
        assert!(payload.contains("c_hash"));
    }

    #[tokio::test]
    async fn test_sign_with_client_secret_and_none() {
        let generator = generator(vec![]);
        let mut web = client("web", vec![]);
        let mut payload = JwtPayload::new();
        payload.insert("sub", "alice");

        web.id_token_signed_response_alg = Some(SigningAlgorithm::HS256);
        let token = generator.sign_and_encrypt_id_token(&payload, &web).await.unwrap();
        let verified = jws::verify_with_secret(&token, SigningAlgorithm::HS256, b"secret").unwrap();
        assert_eq!(verified, payload);

        let unsecured = generator.sign(&payload, SigningAlgorithm::None, &web).await.unwrap();
        assert!(unsecured.ends_with('.'));

        assert!(generator.sign(&payload, SigningAlgorithm::RS256, &web).await.is_err());
    }

    #[tokio::test]
    async fn test_encrypted_id_token_decrypts_with_client_key() {
        let generator = generator(vec![]);
        let encryption_key = EncryptionKeyPair::generate().unwrap();
        let mut web = client("web", vec![]);
        web.jwks = Some(JwkSet {
            keys: vec![encryption_key.to_jwk()],
        });
        web.id_token_encrypted_response_alg = Some(KeyManagementAlgorithm::RsaOaep256);
        web.id_token_encrypted_response_enc = Some(ContentEncryptionAlgorithm::A256GCM);

        let mut payload = JwtPayload::new();
        payload.insert("sub", "alice");
        let token = generator.sign_and_encrypt_id_token(&payload, &web).await.unwrap();
        assert!(jwe::is_jwe(&token));

        let nested = jwe::decrypt(&token, encryption_key.private_key()).unwrap();
        let nested = String::from_utf8(nested).unwrap();
        assert_eq!(jws::decode_payload_unverified(&nested).unwrap(), payload);
    }

    #[tokio::test]
    async fn test_user_info_is_plain_json_without_preferences() {
        let generator = generator(vec![]);
        let web = client("web", vec![]);
        let payload = JwtPayload::new();
        assert!(
            generator
                .sign_and_encrypt_user_info(&payload, &web)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn test_claim_names_of() {
        let mut payload = JwtPayload::new();
        payload.insert("iss", ISSUER);
        payload.insert("sub", "alice");
        payload.insert("email", "a@b.c");
        assert_eq!(claim_names_of(&payload), vec!["email", "sub"]);
    }
}
