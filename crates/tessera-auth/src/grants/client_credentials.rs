//! `client_credentials` grant.

use std::sync::Arc;

use serde::Deserialize;

use crate::AuthResult;
use crate::grants::{authenticate_for_grant, resolve_scopes};
use crate::grants::issuer::{IssueRequest, TokenIssuer};
use crate::oauth::client_auth::{ClientAuthParameters, ClientAuthenticator, ClientCertificate};
use crate::types::{GrantType, GrantedToken, has_offline_access};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClientCredentialsGrantParameter {
    #[serde(flatten)]
    pub client: ClientAuthParameters,
    #[serde(default)]
    pub scope: Option<String>,
}

/// Issues tokens to a client acting on its own behalf.
pub struct ClientCredentialsGrant {
    authenticator: Arc<ClientAuthenticator>,
    issuer: Arc<TokenIssuer>,
}

impl ClientCredentialsGrant {
    #[must_use]
    pub fn new(authenticator: Arc<ClientAuthenticator>, issuer: Arc<TokenIssuer>) -> Self {
        Self {
            authenticator,
            issuer,
        }
    }

    /// # Errors
    ///
    /// `InvalidClient` for failed authentication, `InvalidGrant` when the
    /// client may not use this grant, `InvalidScope` for scopes the client
    /// is not allowed.
    pub async fn execute(
        &self,
        parameter: &ClientCredentialsGrantParameter,
        authorization_header: Option<&str>,
        certificate: Option<&ClientCertificate>,
        issuer: &str,
    ) -> AuthResult<GrantedToken> {
        let client = authenticate_for_grant(
            &self.authenticator,
            &parameter.client,
            authorization_header,
            certificate,
            issuer,
            GrantType::ClientCredentials,
        )
        .await?;

        let scopes = resolve_scopes(parameter.scope.as_deref(), &client)?;
        let mut request = IssueRequest::new(&client, GrantType::ClientCredentials, scopes);
        request.issue_refresh_token = has_offline_access(&request.scopes);
        self.issuer.issue(request).await
    }
}
