//! Resource owner password credentials grant.
//!
//! Credentials are checked by pluggable [`ResourceOwnerAuthenticator`]s,
//! each bound to an authentication method reference (AMR). The request's
//! `amr_values` select the authenticator; without them the `pwd`
//! authenticator is used.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use crate::AuthResult;
use crate::error::AuthError;
use crate::grants::issuer::{IssueRequest, TokenIssuer};
use crate::grants::{authenticate_for_grant, identity_payloads, resolve_scopes};
use crate::oauth::client_auth::{ClientAuthParameters, ClientAuthenticator, ClientCertificate};
use crate::storage::ResourceOwnerStore;
use crate::types::{DEFAULT_AMR, GrantType, GrantedToken, ResourceOwner, has_offline_access};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResourceOwnerGrantParameter {
    #[serde(flatten)]
    pub client: ClientAuthParameters,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    /// Space-separated AMR values, in order of preference.
    #[serde(default)]
    pub amr_values: Option<String>,
}

/// Checks resource owner credentials for one authentication method.
#[async_trait]
pub trait ResourceOwnerAuthenticator: Send + Sync {
    /// The AMR this authenticator implements.
    fn amr(&self) -> &str;

    /// Returns the resource owner when the credentials are valid.
    ///
    /// # Errors
    ///
    /// Returns an error only when the check itself fails.
    async fn authenticate(&self, login: &str, password: &str) -> AuthResult<Option<ResourceOwner>>;
}

/// Password check against the SHA-256 hashes of a [`ResourceOwnerStore`].
pub struct PasswordAuthenticator {
    store: Arc<dyn ResourceOwnerStore>,
}

impl PasswordAuthenticator {
    #[must_use]
    pub fn new(store: Arc<dyn ResourceOwnerStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ResourceOwnerAuthenticator for PasswordAuthenticator {
    fn amr(&self) -> &str {
        DEFAULT_AMR
    }

    async fn authenticate(&self, login: &str, password: &str) -> AuthResult<Option<ResourceOwner>> {
        self.store.get_by_credentials(login, password).await
    }
}

/// Ordered set of authenticators, at most one per AMR.
#[derive(Default)]
pub struct ResourceOwnerAuthenticators {
    authenticators: Vec<Arc<dyn ResourceOwnerAuthenticator>>,
}

impl ResourceOwnerAuthenticators {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an authenticator. A later one with an AMR already present is
    /// ignored.
    #[must_use]
    pub fn with(mut self, authenticator: Arc<dyn ResourceOwnerAuthenticator>) -> Self {
        if self.find(authenticator.amr()).is_none() {
            self.authenticators.push(authenticator);
        }
        self
    }

    fn find(&self, amr: &str) -> Option<&Arc<dyn ResourceOwnerAuthenticator>> {
        self.authenticators.iter().find(|a| a.amr() == amr)
    }

    /// Authenticates with the first of `amr_values` that has an
    /// authenticator, or with `pwd` when `amr_values` is empty.
    ///
    /// The returned owner's `amr` is the method that succeeded.
    ///
    /// # Errors
    ///
    /// `InvalidRequest` when none of the requested methods is available.
    pub async fn authenticate(
        &self,
        amr_values: &[String],
        login: &str,
        password: &str,
    ) -> AuthResult<Option<ResourceOwner>> {
        let authenticator = if amr_values.is_empty() {
            self.find(DEFAULT_AMR)
        } else {
            amr_values.iter().find_map(|amr| self.find(amr))
        }
        .ok_or_else(|| {
            AuthError::invalid_request(format!(
                "no authenticator for the amr values '{}'",
                amr_values.join(" ")
            ))
        })?;

        Ok(authenticator
            .authenticate(login, password)
            .await?
            .map(|mut owner| {
                owner.amr = authenticator.amr().to_string();
                owner
            }))
    }
}

/// Issues tokens for resource owner credentials.
pub struct ResourceOwnerPasswordGrant {
    authenticator: Arc<ClientAuthenticator>,
    resource_owners: Arc<ResourceOwnerAuthenticators>,
    issuer: Arc<TokenIssuer>,
}

impl ResourceOwnerPasswordGrant {
    #[must_use]
    pub fn new(
        authenticator: Arc<ClientAuthenticator>,
        resource_owners: Arc<ResourceOwnerAuthenticators>,
        issuer: Arc<TokenIssuer>,
    ) -> Self {
        Self {
            authenticator,
            resource_owners,
            issuer,
        }
    }

    /// # Errors
    ///
    /// - `InvalidRequest` when username or password is missing
    /// - `InvalidClient` for failed client authentication
    /// - `InvalidGrant` for wrong credentials or a client without this grant
    /// - `InvalidScope` for scopes the client is not allowed
    pub async fn execute(
        &self,
        parameter: &ResourceOwnerGrantParameter,
        authorization_header: Option<&str>,
        certificate: Option<&ClientCertificate>,
        issuer: &str,
    ) -> AuthResult<GrantedToken> {
        let username = parameter
            .username
            .as_deref()
            .filter(|u| !u.is_empty())
            .ok_or_else(|| AuthError::invalid_request("the parameter username is missing"))?;
        let password = parameter
            .password
            .as_deref()
            .ok_or_else(|| AuthError::invalid_request("the parameter password is missing"))?;

        let client = authenticate_for_grant(
            &self.authenticator,
            &parameter.client,
            authorization_header,
            certificate,
            issuer,
            GrantType::Password,
        )
        .await?;
        let scopes = resolve_scopes(parameter.scope.as_deref(), &client)?;

        let amr_values: Vec<String> = parameter
            .amr_values
            .as_deref()
            .map(|v| v.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default();
        let owner = self
            .resource_owners
            .authenticate(&amr_values, username, password)
            .await?
            .ok_or_else(|| {
                tracing::debug!(client_id = %client.client_id, "Resource owner credentials rejected");
                AuthError::invalid_grant("the resource owner credentials are not correct")
            })?;

        let (id_token_payload, user_info_payload) = identity_payloads(
            self.issuer.generator(),
            &owner.to_principal(),
            &client,
            &scopes,
            issuer,
        )
        .await?;

        let mut request = IssueRequest::new(&client, GrantType::Password, scopes);
        request.issue_refresh_token = has_offline_access(&request.scopes);
        request.id_token_payload = id_token_payload;
        request.user_info_payload = Some(user_info_payload);
        self.issuer.issue(request).await
    }
}
