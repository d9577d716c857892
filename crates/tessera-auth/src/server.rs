//! Wiring of the token issuance core.
//!
//! [`AuthServer`] owns one instance of every action, built from an
//! [`AuthConfig`], the [`Stores`] and a [`KeyStore`]. The HTTP layer maps
//! requests onto its methods and errors onto [`AuthError::to_details`].
//!
//! # Example
//!
//! ```ignore
//! use tessera_auth::server::AuthServerBuilder;
//! use tessera_auth::storage::memory::InMemoryStores;
//!
//! let stores = InMemoryStores::new();
//! stores.scopes.seed_if_empty(&config.claims);
//! let key_store = Arc::new(InMemoryKeyStore::generate(&config.signing)?);
//! let server = AuthServerBuilder::new(config, stores.stores(), key_store).build()?;
//!
//! let token = server.token(&request, authorization_header, None).await?;
//! ```

use std::sync::Arc;

use jsonwebtoken::jwk::JwkSet;

use crate::AuthResult;
use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::events::{EventPublisher, TracingEventPublisher};
use crate::grants::{
    AuthorizationCodeGrant, ClientCredentialsGrant, DeviceCodeGrant, PasswordAuthenticator,
    RefreshTokenGrant, ResourceOwnerAuthenticators, ResourceOwnerPasswordGrant, TokenGrants,
    TokenIssuer, UmaTicketGrant,
};
use crate::jwt::{ClientKeyResolver, JwtGenerator, JwtParser, KeyStore};
use crate::oauth::{
    AuthorizationOutcome, AuthorizationParameter, AuthorizationProcessor, ClientAuthenticator,
    ClientCertificate, DeviceAuthorizationAction, DeviceAuthorizationRequest, TokenRequest,
};
use crate::storage::Stores;
use crate::token::{
    IntrospectionAction, IntrospectionRequest, IntrospectionResponse, RevocationAction,
    RevocationRequest, UserInfoAction, UserInfoResponse,
};
use crate::types::{ClaimsPrincipal, DeviceAuthorizationResponse, GrantedToken};
use crate::uma::AuthorizationPolicyValidator;

/// Assembles an [`AuthServer`].
pub struct AuthServerBuilder {
    config: AuthConfig,
    stores: Stores,
    key_store: Arc<dyn KeyStore>,
    events: Arc<dyn EventPublisher>,
    key_resolver: Option<Arc<ClientKeyResolver>>,
    resource_owner_authenticators: Option<ResourceOwnerAuthenticators>,
}

impl AuthServerBuilder {
    #[must_use]
    pub fn new(config: AuthConfig, stores: Stores, key_store: Arc<dyn KeyStore>) -> Self {
        Self {
            config,
            stores,
            key_store,
            events: Arc::new(TracingEventPublisher),
            key_resolver: None,
            resource_owner_authenticators: None,
        }
    }

    /// Replaces the default publisher, which only logs.
    #[must_use]
    pub fn with_events(mut self, events: Arc<dyn EventPublisher>) -> Self {
        self.events = events;
        self
    }

    /// Replaces the `reqwest`-backed client key resolver.
    #[must_use]
    pub fn with_key_resolver(mut self, key_resolver: Arc<ClientKeyResolver>) -> Self {
        self.key_resolver = Some(key_resolver);
        self
    }

    /// Replaces the default set, which holds only the `pwd` authenticator.
    #[must_use]
    pub fn with_resource_owner_authenticators(
        mut self,
        authenticators: ResourceOwnerAuthenticators,
    ) -> Self {
        self.resource_owner_authenticators = Some(authenticators);
        self
    }

    /// # Errors
    ///
    /// Returns a configuration error when the configuration is invalid.
    pub fn build(self) -> AuthResult<AuthServer> {
        self.config
            .validate()
            .map_err(|e| AuthError::configuration(e.to_string()))?;

        let Self {
            config,
            stores,
            key_store,
            events,
            key_resolver,
            resource_owner_authenticators,
        } = self;

        let key_resolver = key_resolver
            .unwrap_or_else(|| Arc::new(ClientKeyResolver::from_config(&config.jwks)));
        let parser = Arc::new(JwtParser::new(key_store.clone(), key_resolver.clone()));
        let generator = Arc::new(JwtGenerator::new(
            &config,
            stores.clients.clone(),
            stores.scopes.clone(),
            key_store.clone(),
            key_resolver,
        ));
        let authenticator = Arc::new(ClientAuthenticator::new(stores.clients.clone(), parser.clone()));
        let issuer = Arc::new(TokenIssuer::new(
            stores.tokens.clone(),
            generator.clone(),
            events,
            config.oauth.default_token_lifetime,
        ));
        let resource_owners = Arc::new(resource_owner_authenticators.unwrap_or_else(|| {
            ResourceOwnerAuthenticators::new().with(Arc::new(PasswordAuthenticator::new(
                stores.resource_owners.clone(),
            )))
        }));
        let validator = Arc::new(AuthorizationPolicyValidator::new(
            stores.resource_sets.clone(),
            parser,
            &config.uma,
        ));

        let grants = TokenGrants {
            authorization_code: AuthorizationCodeGrant::new(
                authenticator.clone(),
                stores.authorization_codes.clone(),
                issuer.clone(),
                config.oauth.authorization_code_lifetime,
            ),
            refresh_token: RefreshTokenGrant::new(
                authenticator.clone(),
                stores.tokens.clone(),
                issuer.clone(),
            ),
            client_credentials: ClientCredentialsGrant::new(authenticator.clone(), issuer.clone()),
            password: ResourceOwnerPasswordGrant::new(
                authenticator.clone(),
                resource_owners,
                issuer.clone(),
            ),
            device_code: DeviceCodeGrant::new(
                authenticator.clone(),
                stores.device_authorizations.clone(),
                stores.resource_owners.clone(),
                issuer.clone(),
            ),
            uma_ticket: UmaTicketGrant::new(
                authenticator.clone(),
                stores.tickets.clone(),
                validator,
                issuer.clone(),
                config.uma.rpt_lifetime,
            ),
        };

        tracing::info!(issuer = %config.issuer, "Token issuance core ready");

        Ok(AuthServer {
            grants,
            authorization: AuthorizationProcessor::new(
                stores.clients.clone(),
                stores.consents.clone(),
                stores.authorization_codes.clone(),
                issuer,
            ),
            device_authorization: DeviceAuthorizationAction::new(
                authenticator.clone(),
                stores.device_authorizations.clone(),
                &config.device,
            ),
            revocation: RevocationAction::new(authenticator.clone(), stores.tokens.clone()),
            introspection: IntrospectionAction::new(authenticator, stores.tokens.clone()),
            userinfo: UserInfoAction::new(stores.clients.clone(), stores.tokens.clone(), generator),
            key_store,
            config,
        })
    }
}

/// Entry point of every protocol operation.
pub struct AuthServer {
    config: AuthConfig,
    key_store: Arc<dyn KeyStore>,
    grants: TokenGrants,
    authorization: AuthorizationProcessor,
    device_authorization: DeviceAuthorizationAction,
    revocation: RevocationAction,
    introspection: IntrospectionAction,
    userinfo: UserInfoAction,
}

impl AuthServer {
    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Issuer name placed in tokens.
    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.config.issuer
    }

    /// Token endpoint.
    ///
    /// # Errors
    ///
    /// See [`TokenGrants::execute`].
    pub async fn token(
        &self,
        request: &TokenRequest,
        authorization_header: Option<&str>,
        certificate: Option<&ClientCertificate>,
    ) -> AuthResult<GrantedToken> {
        self.grants
            .execute(request, authorization_header, certificate, self.issuer())
            .await
    }

    /// Authorization endpoint.
    ///
    /// # Errors
    ///
    /// See [`AuthorizationProcessor::process`].
    pub async fn authorize(
        &self,
        params: &AuthorizationParameter,
        principal: Option<&ClaimsPrincipal>,
    ) -> AuthResult<AuthorizationOutcome> {
        self.authorization.process(params, principal, self.issuer()).await
    }

    /// Device authorization endpoint.
    ///
    /// # Errors
    ///
    /// See [`DeviceAuthorizationAction::execute`].
    pub async fn device_authorization(
        &self,
        request: &DeviceAuthorizationRequest,
        authorization_header: Option<&str>,
        certificate: Option<&ClientCertificate>,
    ) -> AuthResult<DeviceAuthorizationResponse> {
        self.device_authorization
            .execute(request, authorization_header, certificate, self.issuer())
            .await
    }

    /// Approves a pending device authorization.
    ///
    /// # Errors
    ///
    /// See [`DeviceAuthorizationAction::confirm`].
    pub async fn confirm_device(&self, user_code: &str, subject: &str) -> AuthResult<()> {
        self.device_authorization.confirm(user_code, subject).await
    }

    /// Revocation endpoint.
    ///
    /// # Errors
    ///
    /// See [`RevocationAction::execute`].
    pub async fn revoke(
        &self,
        request: &RevocationRequest,
        authorization_header: Option<&str>,
        certificate: Option<&ClientCertificate>,
    ) -> AuthResult<()> {
        self.revocation
            .execute(request, authorization_header, certificate, self.issuer())
            .await
    }

    /// Introspection endpoint.
    ///
    /// # Errors
    ///
    /// See [`IntrospectionAction::execute`].
    pub async fn introspect(
        &self,
        request: &IntrospectionRequest,
        authorization_header: Option<&str>,
        certificate: Option<&ClientCertificate>,
    ) -> AuthResult<IntrospectionResponse> {
        self.introspection
            .execute(request, authorization_header, certificate, self.issuer())
            .await
    }

    /// UMA introspection endpoint.
    ///
    /// # Errors
    ///
    /// See [`IntrospectionAction::execute_uma`].
    pub async fn introspect_uma(
        &self,
        request: &IntrospectionRequest,
        authorization_header: Option<&str>,
        certificate: Option<&ClientCertificate>,
    ) -> AuthResult<IntrospectionResponse> {
        self.introspection
            .execute_uma(request, authorization_header, certificate, self.issuer())
            .await
    }

    /// User info endpoint.
    ///
    /// # Errors
    ///
    /// See [`UserInfoAction::execute`].
    pub async fn userinfo(&self, access_token: &str) -> AuthResult<UserInfoResponse> {
        self.userinfo.execute(access_token).await
    }

    /// Public signing and encryption keys.
    ///
    /// # Errors
    ///
    /// Propagates key store failures.
    pub async fn jwks(&self) -> AuthResult<JwkSet> {
        self.key_store.public_jwks().await
    }
}
