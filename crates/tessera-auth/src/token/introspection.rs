//! Token introspection (RFC 7662)
//!
//! Lets an authenticated client read the state of an access or refresh
//! token. Unknown and expired tokens yield `{"active": false}` without a
//! reason.
//!
//! Two response variants exist: the OAuth one carries `scope` as a
//! space-separated string, the UMA one as an array.
//!
//! # References
//!
//! - [RFC 7662 - OAuth 2.0 Token Introspection](https://tools.ietf.org/html/rfc7662)

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::AuthResult;
use crate::error::AuthError;
use crate::oauth::client_auth::{
    AuthenticateInstruction, ClientAuthParameters, ClientAuthenticator, ClientCertificate,
};
use crate::storage::TokenStore;
use crate::token::revocation::{TokenTypeHint, find_token};
use crate::types::{GrantedToken, hash_token};

/// Token introspection request per RFC 7662.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IntrospectionRequest {
    /// The token to introspect.
    pub token: String,

    /// Optional hint about the token type.
    #[serde(default)]
    pub token_type_hint: Option<TokenTypeHint>,

    #[serde(flatten)]
    pub client: ClientAuthParameters,
}

/// `scope` member of an introspection response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IntrospectionScope {
    /// OAuth 2.0: space-separated.
    Text(String),
    /// UMA 2.0: one entry per scope.
    List(Vec<String>),
}

/// Token introspection response per RFC 7662.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct IntrospectionResponse {
    /// Whether the token is currently active. The only required member.
    pub active: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<IntrospectionScope>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    /// Resource owner the token was issued for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
}

impl IntrospectionResponse {
    /// Response for unknown, expired or foreign tokens.
    #[must_use]
    pub fn inactive() -> Self {
        Self::default()
    }

    /// Describes an active `token`.
    #[must_use]
    pub fn from_granted_token(token: &GrantedToken, issuer: &str, uma: bool) -> Self {
        let iat = token.create_date_time.unix_timestamp();
        let scope = if uma {
            IntrospectionScope::List(token.scopes().map(str::to_string).collect())
        } else {
            IntrospectionScope::Text(token.scope.clone())
        };
        let aud = token
            .id_token_payload
            .as_ref()
            .map(|p| p.audiences())
            .filter(|aud| !aud.is_empty())
            .unwrap_or_else(|| vec![token.client_id.clone()]);

        Self {
            active: true,
            scope: Some(scope),
            client_id: Some(token.client_id.clone()),
            username: token.subject().map(str::to_string),
            token_type: Some(token.token_type.clone()),
            exp: Some(token.expires_at().unix_timestamp()),
            iat: Some(iat),
            nbf: Some(iat),
            sub: token.subject().map(str::to_string),
            aud: Some(aud),
            iss: Some(issuer.to_string()),
            jti: Some(token.id.clone()),
        }
    }
}

/// Answers introspection requests.
pub struct IntrospectionAction {
    authenticator: Arc<ClientAuthenticator>,
    token_store: Arc<dyn TokenStore>,
}

impl IntrospectionAction {
    #[must_use]
    pub fn new(authenticator: Arc<ClientAuthenticator>, token_store: Arc<dyn TokenStore>) -> Self {
        Self {
            authenticator,
            token_store,
        }
    }

    /// Introspects with the OAuth response variant.
    ///
    /// # Errors
    ///
    /// `InvalidRequest` when the token is missing, `InvalidClient` for
    /// failed client authentication.
    pub async fn execute(
        &self,
        request: &IntrospectionRequest,
        authorization_header: Option<&str>,
        certificate: Option<&ClientCertificate>,
        issuer: &str,
    ) -> AuthResult<IntrospectionResponse> {
        self.introspect(request, authorization_header, certificate, issuer, false)
            .await
    }

    /// Introspects a requesting party token with the UMA response variant.
    ///
    /// # Errors
    ///
    /// As [`execute`](Self::execute).
    pub async fn execute_uma(
        &self,
        request: &IntrospectionRequest,
        authorization_header: Option<&str>,
        certificate: Option<&ClientCertificate>,
        issuer: &str,
    ) -> AuthResult<IntrospectionResponse> {
        self.introspect(request, authorization_header, certificate, issuer, true)
            .await
    }

    async fn introspect(
        &self,
        request: &IntrospectionRequest,
        authorization_header: Option<&str>,
        certificate: Option<&ClientCertificate>,
        issuer: &str,
        uma: bool,
    ) -> AuthResult<IntrospectionResponse> {
        if request.token.is_empty() {
            return Err(AuthError::invalid_request("the parameter token is missing"));
        }

        let instruction =
            AuthenticateInstruction::new(&request.client, authorization_header, certificate);
        let client = self.authenticator.authenticate(&instruction, issuer).await?.client;

        let Some((token, _)) =
            find_token(self.token_store.as_ref(), &request.token, request.token_type_hint).await?
        else {
            tracing::debug!(
                client_id = %client.client_id,
                token_hash = %hash_token(&request.token),
                "Introspection of an unknown token"
            );
            return Ok(IntrospectionResponse::inactive());
        };

        if token.is_expired(OffsetDateTime::now_utc()) {
            return Ok(IntrospectionResponse::inactive());
        }
        Ok(IntrospectionResponse::from_granted_token(&token, issuer, uma))
    }
}
