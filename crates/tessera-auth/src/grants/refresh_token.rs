//! `refresh_token` grant.

use std::sync::Arc;

use serde::Deserialize;

use crate::AuthResult;
use crate::error::AuthError;
use crate::grants::authenticate_for_grant;
use crate::grants::issuer::{IssueRequest, TokenIssuer};
use crate::oauth::client_auth::{ClientAuthParameters, ClientAuthenticator, ClientCertificate};
use crate::storage::TokenStore;
use crate::types::{GrantType, GrantedToken, parse_scopes};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RefreshTokenGrantParameter {
    #[serde(flatten)]
    pub client: ClientAuthParameters,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Optional narrowing of the original scope.
    #[serde(default)]
    pub scope: Option<String>,
}

/// Exchanges a refresh token for a new access token.
///
/// The new token inherits the scope and payload snapshots of the refreshed
/// one, records it as its parent and carries a fresh refresh token.
pub struct RefreshTokenGrant {
    authenticator: Arc<ClientAuthenticator>,
    token_store: Arc<dyn TokenStore>,
    issuer: Arc<TokenIssuer>,
}

impl RefreshTokenGrant {
    #[must_use]
    pub fn new(
        authenticator: Arc<ClientAuthenticator>,
        token_store: Arc<dyn TokenStore>,
        issuer: Arc<TokenIssuer>,
    ) -> Self {
        Self {
            authenticator,
            token_store,
            issuer,
        }
    }

    /// # Errors
    ///
    /// - `InvalidRequest` when the refresh token is missing
    /// - `InvalidClient` for failed client authentication
    /// - `InvalidGrant` for an unknown refresh token or one issued to
    ///   another client
    /// - `InvalidScope` when the requested scope widens the original
    pub async fn execute(
        &self,
        parameter: &RefreshTokenGrantParameter,
        authorization_header: Option<&str>,
        certificate: Option<&ClientCertificate>,
        issuer: &str,
    ) -> AuthResult<GrantedToken> {
        let refresh_token = parameter
            .refresh_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AuthError::invalid_request("the parameter refresh_token is missing"))?;

        let client = authenticate_for_grant(
            &self.authenticator,
            &parameter.client,
            authorization_header,
            certificate,
            issuer,
            GrantType::RefreshToken,
        )
        .await?;

        let granted = self
            .token_store
            .get_refresh_token(refresh_token)
            .await?
            .ok_or_else(|| AuthError::invalid_grant("the refresh token is not valid"))?;

        if granted.client_id != client.client_id {
            tracing::warn!(
                client_id = %client.client_id,
                owner = %granted.client_id,
                "Refresh token presented by another client"
            );
            return Err(AuthError::invalid_grant(
                "the refresh token can be used only by the same issuer",
            ));
        }

        let original: Vec<String> = granted.scopes().map(str::to_string).collect();
        let scopes = match parameter.scope.as_deref().filter(|s| !s.trim().is_empty()) {
            Some(requested) => {
                let requested = parse_scopes(requested);
                if let Some(extra) = requested.iter().find(|s| !original.contains(*s)) {
                    return Err(AuthError::invalid_scope(format!(
                        "the scope '{}' was not granted originally",
                        extra
                    )));
                }
                requested
            }
            None => original,
        };

        let mut request = IssueRequest::new(&client, GrantType::RefreshToken, scopes);
        request.issue_refresh_token = true;
        request.parent_token_id = Some(granted.id.clone());
        request.id_token_payload = granted.id_token_payload;
        request.user_info_payload = granted.user_info_payload;
        self.issuer.issue(request).await
    }
}
