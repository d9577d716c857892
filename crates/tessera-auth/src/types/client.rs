//! OAuth 2.0 client domain types.
//!
//! This module defines the `Client` registration record and the closed sets
//! of grant types, response types and token endpoint authentication methods
//! it refers to. Field names follow the OpenID Connect Dynamic Client
//! Registration metadata.

use std::str::FromStr;

use jsonwebtoken::jwk::JwkSet;
use serde::{Deserialize, Serialize};

use crate::error::AuthError;
use crate::jwt::keys::{ContentEncryptionAlgorithm, KeyManagementAlgorithm, SigningAlgorithm};

// =============================================================================
// Grant Type
// =============================================================================

/// OAuth 2.0 grant types.
///
/// Defines the authorization flows a client is allowed to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantType {
    /// Authorization Code flow.
    AuthorizationCode,
    /// Implicit flow (tokens returned from the authorization endpoint).
    Implicit,
    /// Refresh Token flow.
    RefreshToken,
    /// Client Credentials flow.
    ClientCredentials,
    /// Resource Owner Password Credentials flow.
    Password,
    /// Device Authorization Grant (RFC 8628).
    #[serde(rename = "urn:ietf:params:oauth:grant-type:device_code")]
    DeviceCode,
    /// UMA 2.0 ticket grant.
    #[serde(rename = "urn:ietf:params:oauth:grant-type:uma-ticket")]
    UmaTicket,
}

impl GrantType {
    /// Returns the OAuth 2.0 grant_type parameter value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthorizationCode => "authorization_code",
            Self::Implicit => "implicit",
            Self::RefreshToken => "refresh_token",
            Self::ClientCredentials => "client_credentials",
            Self::Password => "password",
            Self::DeviceCode => "urn:ietf:params:oauth:grant-type:device_code",
            Self::UmaTicket => "urn:ietf:params:oauth:grant-type:uma-ticket",
        }
    }
}

impl FromStr for GrantType {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "authorization_code" => Ok(Self::AuthorizationCode),
            "implicit" => Ok(Self::Implicit),
            "refresh_token" => Ok(Self::RefreshToken),
            "client_credentials" => Ok(Self::ClientCredentials),
            "password" => Ok(Self::Password),
            "urn:ietf:params:oauth:grant-type:device_code" => Ok(Self::DeviceCode),
            "urn:ietf:params:oauth:grant-type:uma-ticket" => Ok(Self::UmaTicket),
            other => Err(AuthError::unsupported_grant_type(other)),
        }
    }
}

impl std::fmt::Display for GrantType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Response Type
// =============================================================================

/// Authorization endpoint response types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseType {
    /// Authorization code.
    Code,
    /// Access token (implicit).
    Token,
    /// ID token.
    IdToken,
}

impl ResponseType {
    /// Returns the wire value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Code => "code",
            Self::Token => "token",
            Self::IdToken => "id_token",
        }
    }

    /// Parses a space-delimited `response_type` parameter.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedResponseType` for an empty value or an unknown
    /// member.
    pub fn parse_list(value: &str) -> Result<Vec<Self>, AuthError> {
        let mut types = Vec::new();
        for part in value.split_whitespace() {
            let parsed = part.parse::<Self>()?;
            if !types.contains(&parsed) {
                types.push(parsed);
            }
        }
        if types.is_empty() {
            return Err(AuthError::unsupported_response_type(value));
        }
        Ok(types)
    }
}

impl FromStr for ResponseType {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "code" => Ok(Self::Code),
            "token" => Ok(Self::Token),
            "id_token" => Ok(Self::IdToken),
            other => Err(AuthError::unsupported_response_type(other)),
        }
    }
}

impl std::fmt::Display for ResponseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Token Endpoint Auth Method
// =============================================================================

/// Client authentication methods for the token endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenEndpointAuthMethod {
    /// Public client, no authentication.
    None,
    /// Client credentials in the HTTP Basic Authorization header.
    #[default]
    ClientSecretBasic,
    /// Client credentials in the request body.
    ClientSecretPost,
    /// JWT assertion signed with the client secret (HMAC).
    ClientSecretJwt,
    /// JWT assertion signed with the client's private key.
    PrivateKeyJwt,
    /// Mutual TLS with a PKI-issued certificate (RFC 8705).
    TlsClientAuth,
    /// Mutual TLS with a self-signed certificate (RFC 8705).
    SelfSignedTlsClientAuth,
}

impl TokenEndpointAuthMethod {
    /// Returns the string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::ClientSecretBasic => "client_secret_basic",
            Self::ClientSecretPost => "client_secret_post",
            Self::ClientSecretJwt => "client_secret_jwt",
            Self::PrivateKeyJwt => "private_key_jwt",
            Self::TlsClientAuth => "tls_client_auth",
            Self::SelfSignedTlsClientAuth => "self_signed_tls_client_auth",
        }
    }
}

impl std::fmt::Display for TokenEndpointAuthMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Client Secret
// =============================================================================

/// Kind of credential stored in a [`ClientSecret`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientSecretType {
    /// Shared secret compared against presented secrets.
    SharedSecret,
    /// Hex SHA-1/SHA-256 thumbprint of a client certificate.
    X509Thumbprint,
    /// Subject distinguished name of a client certificate.
    X509Name,
}

/// A typed credential registered for a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientSecret {
    /// Credential kind.
    #[serde(rename = "type")]
    pub secret_type: ClientSecretType,
    /// Credential value.
    pub value: String,
}

impl ClientSecret {
    /// Creates a shared secret.
    #[must_use]
    pub fn shared(value: impl Into<String>) -> Self {
        Self {
            secret_type: ClientSecretType::SharedSecret,
            value: value.into(),
        }
    }

    /// Creates a certificate thumbprint secret.
    #[must_use]
    pub fn thumbprint(value: impl Into<String>) -> Self {
        Self {
            secret_type: ClientSecretType::X509Thumbprint,
            value: value.into(),
        }
    }

    /// Creates a certificate subject name secret.
    #[must_use]
    pub fn x509_name(value: impl Into<String>) -> Self {
        Self {
            secret_type: ClientSecretType::X509Name,
            value: value.into(),
        }
    }
}

// =============================================================================
// Client
// =============================================================================

/// OAuth 2.0 / OpenID Connect client registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    /// Unique client identifier used in OAuth flows.
    pub client_id: String,

    /// Human-readable display name.
    #[serde(default)]
    pub client_name: String,

    /// Registered credentials.
    #[serde(default)]
    pub secrets: Vec<ClientSecret>,

    /// Grant types this client may use.
    pub grant_types: Vec<GrantType>,

    /// Response types this client may request.
    #[serde(default)]
    pub response_types: Vec<ResponseType>,

    /// Scopes this client may request. Empty means every scope is allowed.
    #[serde(default)]
    pub allowed_scopes: Vec<String>,

    /// Allowed redirect URIs.
    #[serde(default)]
    pub redirect_uris: Vec<String>,

    /// Token endpoint authentication method.
    #[serde(default)]
    pub token_endpoint_auth_method: TokenEndpointAuthMethod,

    /// Algorithm the client signs its assertions with.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_endpoint_auth_signing_alg: Option<SigningAlgorithm>,

    /// ID token signing algorithm.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_token_signed_response_alg: Option<SigningAlgorithm>,

    /// ID token key management algorithm (enables encryption).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_token_encrypted_response_alg: Option<KeyManagementAlgorithm>,

    /// ID token content encryption algorithm.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_token_encrypted_response_enc: Option<ContentEncryptionAlgorithm>,

    /// User info signing algorithm. Absent means plain JSON.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub userinfo_signed_response_alg: Option<SigningAlgorithm>,

    /// User info key management algorithm (enables encryption).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub userinfo_encrypted_response_alg: Option<KeyManagementAlgorithm>,

    /// User info content encryption algorithm.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub userinfo_encrypted_response_enc: Option<ContentEncryptionAlgorithm>,

    /// Token lifetime in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_lifetime: Option<u64>,

    /// Whether authorization requests must carry a PKCE challenge.
    #[serde(default)]
    pub require_pkce: bool,

    /// Inline JWKS holding the client's public keys.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jwks: Option<JwkSet>,

    /// URI of the client's JWKS document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jwks_uri: Option<String>,
}

impl Client {
    /// Creates a client with the given id and grant types and defaults elsewhere.
    #[must_use]
    pub fn new(client_id: impl Into<String>, grant_types: Vec<GrantType>) -> Self {
        Self {
            client_id: client_id.into(),
            client_name: String::new(),
            secrets: Vec::new(),
            grant_types,
            response_types: Vec::new(),
            allowed_scopes: Vec::new(),
            redirect_uris: Vec::new(),
            token_endpoint_auth_method: TokenEndpointAuthMethod::default(),
            token_endpoint_auth_signing_alg: None,
            id_token_signed_response_alg: None,
            id_token_encrypted_response_alg: None,
            id_token_encrypted_response_enc: None,
            userinfo_signed_response_alg: None,
            userinfo_encrypted_response_alg: None,
            userinfo_encrypted_response_enc: None,
            token_lifetime: None,
            require_pkce: false,
            jwks: None,
            jwks_uri: None,
        }
    }

    /// Validates the registration.
    ///
    /// # Errors
    ///
    /// Returns an error if the client configuration is invalid.
    pub fn validate(&self) -> Result<(), ClientValidationError> {
        if self.client_id.is_empty() {
            return Err(ClientValidationError::EmptyClientId);
        }

        if self.grant_types.is_empty() {
            return Err(ClientValidationError::NoGrantTypes);
        }

        let redirects = self.grant_types.contains(&GrantType::AuthorizationCode)
            || self.grant_types.contains(&GrantType::Implicit);
        if redirects && self.redirect_uris.is_empty() {
            return Err(ClientValidationError::NoRedirectUris);
        }

        match self.token_endpoint_auth_method {
            TokenEndpointAuthMethod::ClientSecretBasic
            | TokenEndpointAuthMethod::ClientSecretPost
            | TokenEndpointAuthMethod::ClientSecretJwt => {
                if self.shared_secrets().next().is_none() {
                    return Err(ClientValidationError::MissingSecret);
                }
            }
            TokenEndpointAuthMethod::PrivateKeyJwt => {
                if self.jwks.is_none() && self.jwks_uri.is_none() {
                    return Err(ClientValidationError::MissingKeys);
                }
            }
            TokenEndpointAuthMethod::TlsClientAuth
            | TokenEndpointAuthMethod::SelfSignedTlsClientAuth => {
                let has_certificate = self.secrets.iter().any(|s| {
                    matches!(
                        s.secret_type,
                        ClientSecretType::X509Thumbprint | ClientSecretType::X509Name
                    )
                });
                if !has_certificate {
                    return Err(ClientValidationError::MissingCertificate);
                }
            }
            TokenEndpointAuthMethod::None => {}
        }

        if self.id_token_encrypted_response_alg.is_some()
            && self.id_token_encrypted_response_enc.is_none()
        {
            return Err(ClientValidationError::IncompleteEncryption("id_token"));
        }
        if self.userinfo_encrypted_response_alg.is_some()
            && self.userinfo_encrypted_response_enc.is_none()
        {
            return Err(ClientValidationError::IncompleteEncryption("userinfo"));
        }

        Ok(())
    }

    /// Checks if the given redirect URI is allowed for this client.
    #[must_use]
    pub fn is_redirect_uri_allowed(&self, uri: &str) -> bool {
        self.redirect_uris.iter().any(|allowed| allowed == uri)
    }

    /// Checks if the given scope is allowed for this client.
    ///
    /// An empty allow-list means all scopes are allowed.
    #[must_use]
    pub fn is_scope_allowed(&self, scope: &str) -> bool {
        self.allowed_scopes.is_empty() || self.allowed_scopes.iter().any(|s| s == scope)
    }

    /// Checks if the given grant type is allowed for this client.
    #[must_use]
    pub fn is_grant_type_allowed(&self, grant_type: GrantType) -> bool {
        self.grant_types.contains(&grant_type)
    }

    /// Checks if every requested response type is registered.
    #[must_use]
    pub fn supports_response_types(&self, requested: &[ResponseType]) -> bool {
        requested.iter().all(|r| self.response_types.contains(r))
    }

    /// Iterates over the shared secrets of this client.
    pub fn shared_secrets(&self) -> impl Iterator<Item = &str> {
        self.secrets_of(ClientSecretType::SharedSecret)
    }

    /// Iterates over the secrets of one kind.
    pub fn secrets_of(&self, secret_type: ClientSecretType) -> impl Iterator<Item = &str> {
        self.secrets
            .iter()
            .filter(move |s| s.secret_type == secret_type)
            .map(|s| s.value.as_str())
    }

    /// Returns the token lifetime in seconds, falling back to `default_secs`.
    #[must_use]
    pub fn token_lifetime_secs(&self, default_secs: u64) -> u64 {
        self.token_lifetime.unwrap_or(default_secs)
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Errors that can occur during client validation.
#[derive(Debug, thiserror::Error)]
pub enum ClientValidationError {
    /// Client ID cannot be empty.
    #[error("Client ID cannot be empty")]
    EmptyClientId,

    /// At least one grant type is required.
    #[error("At least one grant type is required")]
    NoGrantTypes,

    /// Redirect-based flows require redirect URIs.
    #[error("Authorization code and implicit flows require redirect URIs")]
    NoRedirectUris,

    /// Secret-based authentication requires a shared secret.
    #[error("Secret-based authentication requires a shared secret")]
    MissingSecret,

    /// private_key_jwt requires registered keys.
    #[error("private_key_jwt requires jwks or jwks_uri")]
    MissingKeys,

    /// mTLS authentication requires a certificate thumbprint or name.
    #[error("TLS client authentication requires a certificate thumbprint or name")]
    MissingCertificate,

    /// Encryption algorithm registered without a content encryption algorithm.
    #[error("{0} encryption requires both alg and enc")]
    IncompleteEncryption(&'static str),
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn make_web_client() -> Client {
        let mut client = Client::new(
            "web-client",
            vec![GrantType::AuthorizationCode, GrantType::RefreshToken],
        );
        client.client_name = "Web Client".to_string();
        client.secrets = vec![ClientSecret::shared("secret")];
        client.response_types = vec![ResponseType::Code, ResponseType::IdToken];
        client.redirect_uris = vec!["https://example.com/callback".to_string()];
        client
    }

    #[test]
    fn test_valid_client() {
        assert!(make_web_client().validate().is_ok());
    }

    #[test]
    fn test_empty_client_id() {
        let mut client = make_web_client();
        client.client_id = String::new();
        assert!(matches!(
            client.validate(),
            Err(ClientValidationError::EmptyClientId)
        ));
    }

    #[test]
    fn test_no_grant_types() {
        let mut client = make_web_client();
        client.grant_types.clear();
        assert!(matches!(
            client.validate(),
            Err(ClientValidationError::NoGrantTypes)
        ));
    }

    #[test]
    fn test_auth_code_without_redirect_uris() {
        let mut client = make_web_client();
        client.redirect_uris.clear();
        assert!(matches!(
            client.validate(),
            Err(ClientValidationError::NoRedirectUris)
        ));
    }

    #[test]
    fn test_secret_method_without_secret() {
        let mut client = make_web_client();
        client.secrets.clear();
        assert!(matches!(
            client.validate(),
            Err(ClientValidationError::MissingSecret)
        ));

        client.token_endpoint_auth_method = TokenEndpointAuthMethod::None;
        assert!(client.validate().is_ok());
    }

    #[test]
    fn test_private_key_jwt_requires_keys() {
        let mut client = make_web_client();
        client.token_endpoint_auth_method = TokenEndpointAuthMethod::PrivateKeyJwt;
        assert!(matches!(
            client.validate(),
            Err(ClientValidationError::MissingKeys)
        ));

        client.jwks_uri = Some("https://client.example.com/jwks".to_string());
        assert!(client.validate().is_ok());
    }

    #[test]
    fn test_tls_client_auth_requires_certificate() {
        let mut client = make_web_client();
        client.token_endpoint_auth_method = TokenEndpointAuthMethod::TlsClientAuth;
        assert!(matches!(
            client.validate(),
            Err(ClientValidationError::MissingCertificate)
        ));

        client.secrets.push(ClientSecret::x509_name("CN=web-client"));
        assert!(client.validate().is_ok());
    }

    #[test]
    fn test_incomplete_encryption() {
        let mut client = make_web_client();
        client.id_token_encrypted_response_alg = Some(KeyManagementAlgorithm::RsaOaep256);
        assert!(matches!(
            client.validate(),
            Err(ClientValidationError::IncompleteEncryption("id_token"))
        ));
    }

    #[test]
    fn test_redirect_uri_allowed() {
        let client = make_web_client();
        assert!(client.is_redirect_uri_allowed("https://example.com/callback"));
        assert!(!client.is_redirect_uri_allowed("https://evil.com/callback"));
    }

    #[test]
    fn test_scope_allowed() {
        let mut client = make_web_client();
        assert!(client.is_scope_allowed("anything"));

        client.allowed_scopes = vec!["openid".to_string(), "api1".to_string()];
        assert!(client.is_scope_allowed("api1"));
        assert!(!client.is_scope_allowed("admin"));
    }

    #[test]
    fn test_supports_response_types() {
        let client = make_web_client();
        assert!(client.supports_response_types(&[ResponseType::Code]));
        assert!(client.supports_response_types(&[ResponseType::Code, ResponseType::IdToken]));
        assert!(!client.supports_response_types(&[ResponseType::Token]));
    }

    #[test]
    fn test_grant_type_parsing() {
        assert_eq!(
            "urn:ietf:params:oauth:grant-type:device_code"
                .parse::<GrantType>()
                .unwrap(),
            GrantType::DeviceCode
        );
        let err = "magic".parse::<GrantType>().unwrap_err();
        assert_eq!(err.code(), crate::error::ErrorCode::UnsupportedGrantType);
    }

    #[test]
    fn test_response_type_parse_list() {
        let types = ResponseType::parse_list("code  id_token code").unwrap();
        assert_eq!(types, vec![ResponseType::Code, ResponseType::IdToken]);
        assert!(ResponseType::parse_list("").is_err());
        assert!(ResponseType::parse_list("code device").is_err());
    }

    #[test]
    fn test_serde_uses_registration_names() {
        let mut client = make_web_client();
        client.grant_types.push(GrantType::UmaTicket);
        client.token_endpoint_auth_method = TokenEndpointAuthMethod::PrivateKeyJwt;

        let json = serde_json::to_value(&client).unwrap();
        assert_eq!(json["token_endpoint_auth_method"], "private_key_jwt");
        assert_eq!(
            json["grant_types"][2],
            "urn:ietf:params:oauth:grant-type:uma-ticket"
        );
        assert_eq!(json["secrets"][0]["type"], "shared_secret");

        let parsed: Client = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.grant_types, client.grant_types);
    }
}
