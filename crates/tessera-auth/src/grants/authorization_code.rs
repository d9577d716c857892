//! `authorization_code` grant.
//!
//! Validation runs completely before the code is removed. The removal is the
//! synchronisation point between concurrent redemptions: only the caller
//! whose `remove` reports a deletion may mint a token.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use time::OffsetDateTime;

use crate::AuthResult;
use crate::error::AuthError;
use crate::grants::authenticate_for_grant;
use crate::grants::issuer::{IssueRequest, TokenIssuer};
use crate::oauth::client_auth::{ClientAuthParameters, ClientAuthenticator, ClientCertificate};
use crate::oauth::pkce::check_code_verifier;
use crate::storage::AuthorizationCodeStore;
use crate::types::{GrantType, GrantedToken, ResponseType, has_offline_access};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthorizationCodeGrantParameter {
    #[serde(flatten)]
    pub client: ClientAuthParameters,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub redirect_uri: Option<String>,
    #[serde(default)]
    pub code_verifier: Option<String>,
}

/// Exchanges an authorization code for tokens.
pub struct AuthorizationCodeGrant {
    authenticator: Arc<ClientAuthenticator>,
    code_store: Arc<dyn AuthorizationCodeStore>,
    issuer: Arc<TokenIssuer>,
    code_validity: Duration,
}

impl AuthorizationCodeGrant {
    #[must_use]
    pub fn new(
        authenticator: Arc<ClientAuthenticator>,
        code_store: Arc<dyn AuthorizationCodeStore>,
        issuer: Arc<TokenIssuer>,
        code_validity: Duration,
    ) -> Self {
        Self {
            authenticator,
            code_store,
            issuer,
            code_validity,
        }
    }

    /// # Errors
    ///
    /// - `InvalidRequest` when the code is missing or PKCE fails
    /// - `InvalidClient` for failed client authentication
    /// - `InvalidGrant` for an unknown, foreign or already redeemed code, or
    ///   a redirect URI mismatch
    /// - `InvalidResponse` when the client may not receive codes
    /// - `ExpiredAuthorizationCode` past the code validity period
    pub async fn execute(
        &self,
        parameter: &AuthorizationCodeGrantParameter,
        authorization_header: Option<&str>,
        certificate: Option<&ClientCertificate>,
        issuer: &str,
    ) -> AuthResult<GrantedToken> {
        let code_value = parameter
            .code
            .as_deref()
            .filter(|c| !c.is_empty())
            .ok_or_else(|| AuthError::invalid_request("the parameter code is missing"))?;

        let client = authenticate_for_grant(
            &self.authenticator,
            &parameter.client,
            authorization_header,
            certificate,
            issuer,
            GrantType::AuthorizationCode,
        )
        .await?;

        if !client.response_types.contains(&ResponseType::Code) {
            return Err(AuthError::invalid_response(format!(
                "the client '{}' doesn't support the response type code",
                client.client_id
            )));
        }

        let code = self
            .code_store
            .get(code_value)
            .await?
            .ok_or_else(|| {
                tracing::debug!(client_id = %client.client_id, "Unknown authorization code");
                AuthError::invalid_grant("the authorization code is not correct")
            })?;

        if code.client_id != client.client_id {
            tracing::warn!(
                client_id = %client.client_id,
                code_client_id = %code.client_id,
                "Authorization code presented by another client"
            );
            return Err(AuthError::invalid_grant(
                "the authorization code has not been issued for the given client",
            ));
        }

        if parameter.redirect_uri.as_deref().unwrap_or_default() != code.redirect_uri {
            return Err(AuthError::invalid_grant(
                "the redirect_uri doesn't match the one of the authorization request",
            ));
        }

        // Only a fully validated redemption removes the code.
        if code.is_expired(self.code_validity, OffsetDateTime::now_utc()) {
            return Err(AuthError::ExpiredAuthorizationCode);
        }

        if client.require_pkce && code.code_challenge.as_deref().is_none_or(str::is_empty) {
            return Err(AuthError::invalid_request(
                "the client requires PKCE but no code_challenge was registered",
            ));
        }
        check_code_verifier(
            code.code_challenge.as_deref(),
            code.code_challenge_method,
            parameter.code_verifier.as_deref(),
        )?;

        if !self.code_store.remove(code_value).await? {
            tracing::warn!(client_id = %client.client_id, "Authorization code redeemed concurrently");
            return Err(AuthError::invalid_grant(
                "the authorization code has already been used",
            ));
        }

        let mut request = IssueRequest::new(&client, GrantType::AuthorizationCode, code.scopes.clone());
        request.issue_refresh_token = has_offline_access(&code.scopes);
        request.id_token_payload = code.id_token_payload;
        request.user_info_payload = code.user_info_payload;
        request.authorization_code = Some(code_value);
        self.issuer.issue(request).await
    }
}
