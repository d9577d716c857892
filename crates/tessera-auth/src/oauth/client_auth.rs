//! Client authentication for the token, revocation, introspection and device
//! authorization endpoints.
//!
//! The client's registered `token_endpoint_auth_method` decides which of the
//! presented credentials are checked. Credentials for another method are
//! ignored, so a client cannot downgrade to a weaker method.
//!
//! # Authentication Methods
//!
//! - `none` - Public clients (client_id only)
//! - `client_secret_basic` - HTTP Basic Auth with client_id:client_secret
//! - `client_secret_post` - client_id and client_secret in request body
//! - `client_secret_jwt` - JWT assertion signed with a shared secret
//! - `private_key_jwt` - JWT assertion signed with the client's private key
//! - `tls_client_auth` - Certificate subject DN or thumbprint
//! - `self_signed_tls_client_auth` - Certificate thumbprint

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use time::OffsetDateTime;

use crate::AuthResult;
use crate::error::AuthError;
use crate::jwt::JwtParser;
use crate::oauth::client_assertion::{
    CLIENT_ASSERTION_TYPE_JWT_BEARER, extract_client_id_unverified, validate_assertion_claims,
};
use crate::storage::ClientStore;
use crate::types::{Client, ClientSecretType, TokenEndpointAuthMethod};

/// Client credentials sent in a request body.
///
/// Every grant parameter embeds this struct.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientAuthParameters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_assertion_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_assertion: Option<String>,
}

/// Certificate presented during the TLS handshake.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientCertificate {
    /// Hex thumbprint, with or without separators.
    pub thumbprint: Option<String>,
    /// Subject distinguished name.
    pub subject: Option<String>,
}

impl ClientCertificate {
    #[must_use]
    pub fn new(thumbprint: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            thumbprint: Some(thumbprint.into()),
            subject: Some(subject.into()),
        }
    }
}

/// Everything a request presented to authenticate its client.
#[derive(Debug, Clone, Default)]
pub struct AuthenticateInstruction {
    pub client_id_from_authorization_header: Option<String>,
    pub client_secret_from_authorization_header: Option<String>,
    pub client_id_from_request_body: Option<String>,
    pub client_secret_from_request_body: Option<String>,
    pub client_assertion_type: Option<String>,
    pub client_assertion: Option<String>,
    pub certificate: Option<ClientCertificate>,
}

impl AuthenticateInstruction {
    /// Collects the credentials of a request.
    ///
    /// An `Authorization` header that is not valid HTTP Basic is ignored.
    #[must_use]
    pub fn new(
        parameters: &ClientAuthParameters,
        authorization_header: Option<&str>,
        certificate: Option<&ClientCertificate>,
    ) -> Self {
        let (header_id, header_secret) = authorization_header
            .and_then(parse_basic_auth)
            .map_or((None, None), |(id, secret)| (Some(id), Some(secret)));

        Self {
            client_id_from_authorization_header: header_id,
            client_secret_from_authorization_header: header_secret,
            client_id_from_request_body: parameters.client_id.clone(),
            client_secret_from_request_body: parameters.client_secret.clone(),
            client_assertion_type: parameters.client_assertion_type.clone(),
            client_assertion: parameters.client_assertion.clone(),
            certificate: certificate.cloned(),
        }
    }

    /// Returns the client_id the request claims to act for.
    ///
    /// An encrypted assertion cannot be read here; its client_id is only
    /// known once [`ClientAuthenticator::authenticate`] has decrypted it.
    ///
    /// # Errors
    ///
    /// Returns `InvalidClient` when no client_id can be found or the sources
    /// disagree.
    pub fn client_id(&self) -> AuthResult<String> {
        let from_assertion = self
            .client_assertion
            .as_deref()
            .filter(|a| !JwtParser::is_jwe(a))
            .map(extract_client_id_unverified)
            .transpose()?;
        self.client_id_with(from_assertion.as_deref())
    }

    fn client_id_with(&self, from_assertion: Option<&str>) -> AuthResult<String> {
        let mut candidates = [
            self.client_id_from_authorization_header.as_deref(),
            self.client_id_from_request_body.as_deref(),
            from_assertion,
        ]
        .into_iter()
        .flatten()
        .filter(|id| !id.is_empty());

        let Some(first) = candidates.next() else {
            return Err(AuthError::invalid_client("the client_id cannot be extracted"));
        };
        if candidates.any(|other| other != first) {
            tracing::warn!("Conflicting client identifiers in one request");
            return Err(AuthError::invalid_client("conflicting client identifiers"));
        }
        Ok(first.to_string())
    }
}

/// Result of successful client authentication.
#[derive(Debug, Clone)]
pub struct AuthenticatedClient {
    pub client: Client,
    /// The method that authenticated the client.
    pub auth_method: TokenEndpointAuthMethod,
}

/// Authenticates clients against their registrations.
pub struct ClientAuthenticator {
    client_store: Arc<dyn ClientStore>,
    parser: Arc<JwtParser>,
}

impl ClientAuthenticator {
    #[must_use]
    pub fn new(client_store: Arc<dyn ClientStore>, parser: Arc<JwtParser>) -> Self {
        Self {
            client_store,
            parser,
        }
    }

    /// Authenticates the client of a request.
    ///
    /// `issuer` is the audience JWT assertions must name.
    ///
    /// # Errors
    ///
    /// Returns `InvalidClient` when the client is unknown or its registered
    /// method is not satisfied.
    pub async fn authenticate(
        &self,
        instruction: &AuthenticateInstruction,
        issuer: &str,
    ) -> AuthResult<AuthenticatedClient> {
        let assertion = self.open_assertion(instruction).await?;
        let from_assertion = assertion
            .as_deref()
            .map(extract_client_id_unverified)
            .transpose()?;
        let client_id = instruction.client_id_with(from_assertion.as_deref())?;
        let client = self
            .client_store
            .get_by_id(&client_id)
            .await?
            .ok_or_else(|| {
                tracing::debug!(client_id = %client_id, "Unknown client");
                AuthError::invalid_client("the client doesn't exist")
            })?;

        let method = client.token_endpoint_auth_method;
        let result = match method {
            TokenEndpointAuthMethod::None => Ok(()),
            TokenEndpointAuthMethod::ClientSecretBasic => check_shared_secret(
                &client,
                instruction.client_secret_from_authorization_header.as_deref(),
            ),
            TokenEndpointAuthMethod::ClientSecretPost => check_shared_secret(
                &client,
                instruction.client_secret_from_request_body.as_deref(),
            ),
            TokenEndpointAuthMethod::ClientSecretJwt | TokenEndpointAuthMethod::PrivateKeyJwt => {
                self.check_assertion(&client, method, instruction, assertion.as_deref(), issuer)
                    .await
            }
            TokenEndpointAuthMethod::TlsClientAuth => {
                check_certificate(&client, instruction.certificate.as_ref(), true)
            }
            TokenEndpointAuthMethod::SelfSignedTlsClientAuth => {
                check_certificate(&client, instruction.certificate.as_ref(), false)
            }
        };

        if let Err(err) = result {
            tracing::debug!(client_id = %client.client_id, method = %method, error = %err, "Client authentication failed");
            return Err(err);
        }

        tracing::debug!(client_id = %client.client_id, method = %method, "Client authenticated");
        Ok(AuthenticatedClient {
            client,
            auth_method: method,
        })
    }

    /// Returns the presented assertion as a JWS, decrypting a JWE with the
    /// server's key.
    async fn open_assertion(
        &self,
        instruction: &AuthenticateInstruction,
    ) -> AuthResult<Option<String>> {
        let Some(assertion) = instruction.client_assertion.as_deref().filter(|a| !a.is_empty())
        else {
            return Ok(None);
        };
        if !JwtParser::is_jwe(assertion) {
            return Ok(Some(assertion.to_string()));
        }
        self.parser
            .decrypt(assertion)
            .await
            .map(Some)
            .map_err(|e| AuthError::invalid_client(format!("Invalid client assertion: {}", e.inner())))
    }

    async fn check_assertion(
        &self,
        client: &Client,
        method: TokenEndpointAuthMethod,
        instruction: &AuthenticateInstruction,
        assertion: Option<&str>,
        issuer: &str,
    ) -> AuthResult<()> {
        if instruction.client_assertion_type.as_deref() != Some(CLIENT_ASSERTION_TYPE_JWT_BEARER) {
            return Err(AuthError::invalid_client(format!(
                "client_assertion_type must be {}",
                CLIENT_ASSERTION_TYPE_JWT_BEARER
            )));
        }
        let jws = assertion.ok_or_else(|| AuthError::invalid_client("no client assertion"))?;

        let header = JwtParser::header(jws)
            .map_err(|e| AuthError::invalid_client(format!("Invalid client assertion: {}", e.inner())))?;
        let symmetric = header.alg.starts_with("HS");
        if symmetric != (method == TokenEndpointAuthMethod::ClientSecretJwt) {
            return Err(AuthError::invalid_client(format!(
                "algorithm {} cannot be used with {}",
                header.alg, method
            )));
        }

        let payload = self
            .parser
            .unsign_with_client(jws, client)
            .await
            .map_err(|e| AuthError::invalid_client(format!("Invalid client assertion: {}", e.inner())))?;

        validate_assertion_claims(
            &payload,
            &client.client_id,
            issuer,
            OffsetDateTime::now_utc(),
        )?;
        Ok(())
    }
}

fn check_shared_secret(client: &Client, presented: Option<&str>) -> AuthResult<()> {
    let presented = presented
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AuthError::invalid_client("the client secret is missing"))?;

    let matched = client
        .shared_secrets()
        .any(|stored| bool::from(stored.as_bytes().ct_eq(presented.as_bytes())));
    if matched {
        Ok(())
    } else {
        Err(AuthError::invalid_client("the client secret is not correct"))
    }
}

fn check_certificate(
    client: &Client,
    certificate: Option<&ClientCertificate>,
    accept_subject: bool,
) -> AuthResult<()> {
    let certificate =
        certificate.ok_or_else(|| AuthError::invalid_client("no client certificate"))?;

    if let Some(thumbprint) = certificate.thumbprint.as_deref() {
        let presented = normalize_thumbprint(thumbprint);
        if client
            .secrets_of(ClientSecretType::X509Thumbprint)
            .any(|stored| bool::from(normalize_thumbprint(stored).as_bytes().ct_eq(presented.as_bytes())))
        {
            return Ok(());
        }
    }

    if accept_subject && let Some(subject) = certificate.subject.as_deref() {
        let presented = normalize_dn(subject);
        if client
            .secrets_of(ClientSecretType::X509Name)
            .any(|stored| normalize_dn(stored) == presented)
        {
            return Ok(());
        }
    }

    Err(AuthError::invalid_client("the client certificate is not registered"))
}

fn normalize_thumbprint(value: &str) -> String {
    value
        .chars()
        .filter(char::is_ascii_hexdigit)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

fn normalize_dn(value: &str) -> String {
    value
        .split(',')
        .map(|rdn| {
            rdn.split_once('=')
                .map(|(k, v)| format!("{}={}", k.trim().to_ascii_uppercase(), v.trim()))
                .unwrap_or_else(|| rdn.trim().to_string())
        })
        .collect::<Vec<_>>()
        .join(",")
}

/// Parses HTTP Basic Auth header value.
///
/// Returns `Some((client_id, client_secret))` if valid, `None` otherwise.
/// Both parts are form-urlencoded per RFC 6749 section 2.3.1.
#[must_use]
pub fn parse_basic_auth(header_value: &str) -> Option<(String, String)> {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;

    let encoded = header_value.trim().strip_prefix("Basic ")?;
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let credentials = String::from_utf8(decoded).ok()?;

    // Split on first colon (password may contain colons)
    let (client_id, client_secret) = credentials.split_once(':')?;

    let decode = |s: &str| -> String {
        url::form_urlencoded::parse(format!("v={}", s).as_bytes())
            .next()
            .map(|(_, v)| v.into_owned())
            .unwrap_or_else(|| s.to_string())
    };
    Some((decode(client_id), decode(client_secret)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::JwksFetchConfig;
    use crate::jwt::jwks::ClientKeyResolver;
    use crate::jwt::keys::{
        ContentEncryptionAlgorithm, EncryptionKeyPair, InMemoryKeyStore, KeyManagementAlgorithm,
        SigningAlgorithm, SigningKeyPair,
    };
    use crate::jwt::{jwe, jws};
    use crate::jwt::payload::JwtPayload;
    use crate::storage::memory::InMemoryClientStore;
    use crate::types::{ClientSecret, GrantType};
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use jsonwebtoken::jwk::JwkSet;

    const ISSUER: &str = "https://issuer.example.com";

    fn authenticator(clients: Vec<Client>) -> ClientAuthenticator {
        authenticator_with_keys(clients, InMemoryKeyStore::new(SigningAlgorithm::ES384))
    }

    fn authenticator_with_keys(clients: Vec<Client>, keys: InMemoryKeyStore) -> ClientAuthenticator {
        let store = Arc::new(InMemoryClientStore::new());
        for client in clients {
            store.insert(client);
        }
        let parser = JwtParser::new(
            Arc::new(keys),
            Arc::new(ClientKeyResolver::from_config(&JwksFetchConfig::default())),
        );
        ClientAuthenticator::new(store, Arc::new(parser))
    }

    fn client(id: &str, method: TokenEndpointAuthMethod) -> Client {
        let mut client = Client::new(id, vec![GrantType::ClientCredentials]);
        client.token_endpoint_auth_method = method;
        client.secrets = vec![ClientSecret::shared("s3cret")];
        client
    }

    fn basic(id: &str, secret: &str) -> String {
        format!("Basic {}", STANDARD.encode(format!("{}:{}", id, secret)))
    }

    fn body(id: &str, secret: Option<&str>) -> ClientAuthParameters {
        ClientAuthParameters {
            client_id: Some(id.to_string()),
            client_secret: secret.map(str::to_string),
            ..ClientAuthParameters::default()
        }
    }

    fn assertion_payload(client_id: &str) -> JwtPayload {
        let mut payload = JwtPayload::new();
        payload.insert("iss", client_id);
        payload.insert("sub", client_id);
        payload.insert("aud", ISSUER);
        payload.insert("exp", OffsetDateTime::now_utc().unix_timestamp() + 120);
        payload.insert("jti", uuid::Uuid::new_v4().to_string());
        payload
    }

    fn assertion_params(assertion: String) -> ClientAuthParameters {
        ClientAuthParameters {
            client_assertion_type: Some(CLIENT_ASSERTION_TYPE_JWT_BEARER.to_string()),
            client_assertion: Some(assertion),
            ..ClientAuthParameters::default()
        }
    }

    #[tokio::test]
    async fn test_client_secret_basic() {
        let auth = authenticator(vec![client("web", TokenEndpointAuthMethod::ClientSecretBasic)]);

        let header = basic("web", "s3cret");
        let instruction = AuthenticateInstruction::new(&ClientAuthParameters::default(), Some(&header), None);
        let result = auth.authenticate(&instruction, ISSUER).await.unwrap();
        assert_eq!(result.client.client_id, "web");
        assert_eq!(result.auth_method, TokenEndpointAuthMethod::ClientSecretBasic);

        let header = basic("web", "wrong");
        let instruction = AuthenticateInstruction::new(&ClientAuthParameters::default(), Some(&header), None);
        assert!(auth.authenticate(&instruction, ISSUER).await.is_err());
    }

    #[tokio::test]
    async fn test_registered_method_decides() {
        let auth = authenticator(vec![client("web", TokenEndpointAuthMethod::ClientSecretBasic)]);

        // correct secret, but sent in the body
        let instruction = AuthenticateInstruction::new(&body("web", Some("s3cret")), None, None);
        let err = auth.authenticate(&instruction, ISSUER).await.unwrap_err();
        assert_eq!(err.code(), crate::error::ErrorCode::InvalidClient);
    }

    #[tokio::test]
    async fn test_client_secret_post_and_public() {
        let auth = authenticator(vec![
            client("post", TokenEndpointAuthMethod::ClientSecretPost),
            client("spa", TokenEndpointAuthMethod::None),
        ]);

        let instruction = AuthenticateInstruction::new(&body("post", Some("s3cret")), None, None);
        assert!(auth.authenticate(&instruction, ISSUER).await.is_ok());

        let instruction = AuthenticateInstruction::new(&body("post", None), None, None);
        assert!(auth.authenticate(&instruction, ISSUER).await.is_err());

        let instruction = AuthenticateInstruction::new(&body("spa", None), None, None);
        let result = auth.authenticate(&instruction, ISSUER).await.unwrap();
        assert_eq!(result.auth_method, TokenEndpointAuthMethod::None);
    }

    #[tokio::test]
    async fn test_unknown_and_missing_client() {
        let auth = authenticator(vec![]);
        let instruction = AuthenticateInstruction::new(&body("ghost", Some("x")), None, None);
        assert!(auth.authenticate(&instruction, ISSUER).await.is_err());

        let instruction = AuthenticateInstruction::default();
        assert!(auth.authenticate(&instruction, ISSUER).await.is_err());
    }

    #[test]
    fn test_conflicting_client_ids() {
        let header = basic("a", "x");
        let instruction = AuthenticateInstruction::new(&body("b", None), Some(&header), None);
        assert!(instruction.client_id().is_err());
    }

    #[tokio::test]
    async fn test_client_secret_jwt() {
        let mut svc = client("svc", TokenEndpointAuthMethod::ClientSecretJwt);
        svc.token_endpoint_auth_signing_alg = Some(SigningAlgorithm::HS256);
        let auth = authenticator(vec![svc]);

        let token = jws::sign_with_secret(&assertion_payload("svc"), SigningAlgorithm::HS256, b"s3cret").unwrap();
        let instruction = AuthenticateInstruction::new(&assertion_params(token), None, None);
        assert!(auth.authenticate(&instruction, ISSUER).await.is_ok());

        let mut wrong_aud = assertion_payload("svc");
        wrong_aud.insert("aud", "https://elsewhere");
        let token = jws::sign_with_secret(&wrong_aud, SigningAlgorithm::HS256, b"s3cret").unwrap();
        let instruction = AuthenticateInstruction::new(&assertion_params(token), None, None);
        assert!(auth.authenticate(&instruction, ISSUER).await.is_err());
    }

    #[tokio::test]
    async fn test_encrypted_client_assertion() {
        let encryption_key = EncryptionKeyPair::generate().unwrap();
        let recipient = encryption_key.public_key();
        let keys = InMemoryKeyStore::new(SigningAlgorithm::ES384).with_encryption_key(encryption_key);

        let mut svc = client("svc", TokenEndpointAuthMethod::ClientSecretJwt);
        svc.token_endpoint_auth_signing_alg = Some(SigningAlgorithm::HS256);
        let auth = authenticator_with_keys(vec![svc], keys);

        let signed = jws::sign_with_secret(&assertion_payload("svc"), SigningAlgorithm::HS256, b"s3cret").unwrap();
        let encrypted = jwe::encrypt(
            signed.as_bytes(),
            KeyManagementAlgorithm::RsaOaep256,
            ContentEncryptionAlgorithm::A256GCM,
            &recipient,
            None,
            true,
        )
        .unwrap();

        // the client_id is only inside the encrypted assertion
        let instruction = AuthenticateInstruction::new(&assertion_params(encrypted.clone()), None, None);
        let result = auth.authenticate(&instruction, ISSUER).await.unwrap();
        assert_eq!(result.client.client_id, "svc");
        assert_eq!(result.auth_method, TokenEndpointAuthMethod::ClientSecretJwt);

        let mut params = assertion_params(encrypted);
        params.client_id = Some("svc".to_string());
        let instruction = AuthenticateInstruction::new(&params, None, None);
        assert!(auth.authenticate(&instruction, ISSUER).await.is_ok());

        // encrypted for another server
        let foreign = EncryptionKeyPair::generate().unwrap();
        let signed = jws::sign_with_secret(&assertion_payload("svc"), SigningAlgorithm::HS256, b"s3cret").unwrap();
        let encrypted = jwe::encrypt(
            signed.as_bytes(),
            KeyManagementAlgorithm::RsaOaep256,
            ContentEncryptionAlgorithm::A256GCM,
            &foreign.public_key(),
            None,
            true,
        )
        .unwrap();
        let instruction = AuthenticateInstruction::new(&assertion_params(encrypted), None, None);
        let err = auth.authenticate(&instruction, ISSUER).await.unwrap_err();
        assert_eq!(err.code(), crate::error::ErrorCode::InvalidClient);
    }

    #[tokio::test]
    async fn test_private_key_jwt() {
        let key = SigningKeyPair::generate_ec().unwrap();
        let mut svc = client("svc", TokenEndpointAuthMethod::PrivateKeyJwt);
        svc.jwks = Some(JwkSet { keys: vec![key.to_jwk()] });
        let auth = authenticator(vec![svc]);

        let token = jws::sign_with_key(&assertion_payload("svc"), &key).unwrap();
        let instruction = AuthenticateInstruction::new(&assertion_params(token), None, None);
        let result = auth.authenticate(&instruction, ISSUER).await.unwrap();
        assert_eq!(result.auth_method, TokenEndpointAuthMethod::PrivateKeyJwt);

        // a shared-secret assertion does not satisfy private_key_jwt
        let token = jws::sign_with_secret(&assertion_payload("svc"), SigningAlgorithm::HS256, b"s3cret").unwrap();
        let instruction = AuthenticateInstruction::new(&assertion_params(token), None, None);
        assert!(auth.authenticate(&instruction, ISSUER).await.is_err());

        // key of someone else
        let other = SigningKeyPair::generate_ec().unwrap();
        let token = jws::sign_with_key(&assertion_payload("svc"), &other).unwrap();
        let instruction = AuthenticateInstruction::new(&assertion_params(token), None, None);
        assert!(auth.authenticate(&instruction, ISSUER).await.is_err());
    }

    #[tokio::test]
    async fn test_tls_client_auth() {
        let mut device = client("device", TokenEndpointAuthMethod::TlsClientAuth);
        device.secrets = vec![
            ClientSecret::thumbprint("AB:CD:EF:01"),
            ClientSecret::x509_name("CN=device, O=Example"),
        ];
        let mut self_signed = client("iot", TokenEndpointAuthMethod::SelfSignedTlsClientAuth);
        self_signed.secrets = vec![ClientSecret::x509_name("CN=iot")];
        let auth = authenticator(vec![device, self_signed]);

        let by_thumbprint = ClientCertificate {
            thumbprint: Some("abcdef01".to_string()),
            subject: None,
        };
        let instruction = AuthenticateInstruction::new(&body("device", None), None, Some(&by_thumbprint));
        assert!(auth.authenticate(&instruction, ISSUER).await.is_ok());

        let by_subject = ClientCertificate::new("00", "cn=device,O=Example");
        let instruction = AuthenticateInstruction::new(&body("device", None), None, Some(&by_subject));
        assert!(auth.authenticate(&instruction, ISSUER).await.is_ok());

        // self-signed certificates only match by thumbprint
        let iot_cert = ClientCertificate::new("00", "CN=iot");
        let instruction = AuthenticateInstruction::new(&body("iot", None), None, Some(&iot_cert));
        assert!(auth.authenticate(&instruction, ISSUER).await.is_err());

        let instruction = AuthenticateInstruction::new(&body("device", None), None, None);
        assert!(auth.authenticate(&instruction, ISSUER).await.is_err());
    }

    #[test]
    fn test_parse_basic_auth() {
        assert_eq!(
            parse_basic_auth(&basic("client", "pa:ss")),
            Some(("client".to_string(), "pa:ss".to_string()))
        );
        assert_eq!(
            parse_basic_auth(&basic("my%20client", "s%2Bt")),
            Some(("my client".to_string(), "s+t".to_string()))
        );
        assert!(parse_basic_auth("Bearer abc").is_none());
        assert!(parse_basic_auth("Basic !!!").is_none());
        assert!(parse_basic_auth(&format!("Basic {}", STANDARD.encode("nocolon"))).is_none());
    }
}
