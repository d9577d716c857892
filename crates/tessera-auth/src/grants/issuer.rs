//! Token minting shared by every grant action.
//!
//! The sequence is fixed: look for a reusable token, otherwise mint one,
//! persist it with a single `add_token` call and publish the event. Nothing
//! is written before the final store call, so a dropped future leaves no
//! partial state behind.
//!
//! # Reuse
//!
//! A stored token is reused when it belongs to the same client, carries the
//! same scope string, has not expired and its ID token and user info
//! snapshots are equal once time-dependent claims are ignored. Refresh
//! exchanges always mint.

use std::sync::Arc;
use std::time::Duration;

use time::OffsetDateTime;
use uuid::Uuid;

use crate::AuthResult;
use crate::events::{AuthEvent, EventPublisher};
use crate::jwt::JwtGenerator;
use crate::jwt::payload::JwtPayload;
use crate::storage::TokenStore;
use crate::types::{BEARER_TOKEN_TYPE, Client, GrantType, GrantedToken, generate_token};

/// What a grant action asks the issuer to mint.
#[derive(Debug, Clone)]
pub struct IssueRequest<'a> {
    pub client: &'a Client,
    pub grant_type: GrantType,
    pub scopes: Vec<String>,
    pub id_token_payload: Option<JwtPayload>,
    pub user_info_payload: Option<JwtPayload>,
    /// Code being redeemed, hashed into `c_hash`.
    pub authorization_code: Option<&'a str>,
    pub issue_refresh_token: bool,
    /// Token being refreshed. Disables reuse.
    pub parent_token_id: Option<String>,
    /// Overrides the client's token lifetime.
    pub lifetime: Option<Duration>,
}

impl<'a> IssueRequest<'a> {
    #[must_use]
    pub fn new(client: &'a Client, grant_type: GrantType, scopes: Vec<String>) -> Self {
        Self {
            client,
            grant_type,
            scopes,
            id_token_payload: None,
            user_info_payload: None,
            authorization_code: None,
            issue_refresh_token: false,
            parent_token_id: None,
            lifetime: None,
        }
    }
}

/// A token ready to be handed out, not yet persisted when freshly minted.
#[derive(Debug, Clone)]
pub struct PreparedToken {
    token: GrantedToken,
    grant_type: GrantType,
    scopes: Vec<String>,
    reused: bool,
}

impl PreparedToken {
    #[must_use]
    pub fn token(&self) -> &GrantedToken {
        &self.token
    }

    /// `true` if an already stored token was found.
    #[must_use]
    pub fn is_reused(&self) -> bool {
        self.reused
    }
}

/// Mints, persists and announces granted tokens.
pub struct TokenIssuer {
    token_store: Arc<dyn TokenStore>,
    generator: Arc<JwtGenerator>,
    events: Arc<dyn EventPublisher>,
    default_token_lifetime: Duration,
}

impl TokenIssuer {
    #[must_use]
    pub fn new(
        token_store: Arc<dyn TokenStore>,
        generator: Arc<JwtGenerator>,
        events: Arc<dyn EventPublisher>,
        default_token_lifetime: Duration,
    ) -> Self {
        Self {
            token_store,
            generator,
            events,
            default_token_lifetime,
        }
    }

    /// Returns the generator used for ID tokens.
    #[must_use]
    pub fn generator(&self) -> &Arc<JwtGenerator> {
        &self.generator
    }

    /// Returns an existing valid token or mints and persists a new one.
    ///
    /// # Errors
    ///
    /// Propagates store, signing and encryption failures.
    pub async fn issue(&self, request: IssueRequest<'_>) -> AuthResult<GrantedToken> {
        let prepared = self.prepare(request).await?;
        self.commit(prepared).await
    }

    /// Finds a reusable token or mints a new one without storing it.
    ///
    /// Callers that have more failing steps after minting use this together
    /// with [`TokenIssuer::commit`].
    ///
    /// # Errors
    ///
    /// Propagates store, signing and encryption failures.
    pub async fn prepare(&self, request: IssueRequest<'_>) -> AuthResult<PreparedToken> {
        let client = request.client;
        let scope = request.scopes.join(" ");

        if request.parent_token_id.is_none()
            && let Some(existing) = self
                .token_store
                .get_valid_granted_token(
                    &scope,
                    &client.client_id,
                    request.id_token_payload.as_ref(),
                    request.user_info_payload.as_ref(),
                )
                .await?
        {
            tracing::debug!(
                client_id = %client.client_id,
                grant_type = %request.grant_type,
                "Reusing valid granted token"
            );
            return Ok(PreparedToken {
                token: existing,
                grant_type: request.grant_type,
                scopes: request.scopes,
                reused: true,
            });
        }

        let now = OffsetDateTime::now_utc();
        let access_token = generate_token();
        let expires_in = request.lifetime.map_or_else(
            || client.token_lifetime_secs(self.default_token_lifetime.as_secs()),
            |lifetime| lifetime.as_secs(),
        );

        let (id_token, id_token_payload) = match request.id_token_payload {
            Some(mut payload) => {
                self.generator.update_payload_date(&mut payload, client, now);
                self.generator.fill_in_other_claims_identity_token_payload(
                    &mut payload,
                    request.authorization_code,
                    Some(&access_token),
                    client,
                );
                let id_token = self
                    .generator
                    .sign_and_encrypt_id_token(&payload, client)
                    .await?;
                (Some(id_token), Some(payload))
            }
            None => (None, None),
        };

        let token = GrantedToken {
            id: Uuid::new_v4().to_string(),
            access_token,
            refresh_token: request.issue_refresh_token.then(generate_token),
            id_token,
            scope,
            expires_in,
            create_date_time: now,
            client_id: client.client_id.clone(),
            parent_token_id: request.parent_token_id,
            token_type: BEARER_TOKEN_TYPE.to_string(),
            user_info_payload: request.user_info_payload,
            id_token_payload,
        };

        Ok(PreparedToken {
            token,
            grant_type: request.grant_type,
            scopes: request.scopes,
            reused: false,
        })
    }

    /// Persists a minted token with a single `add_token` call and publishes
    /// its event. A reused token is returned unchanged.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub async fn commit(&self, prepared: PreparedToken) -> AuthResult<GrantedToken> {
        let PreparedToken {
            token,
            grant_type,
            scopes,
            reused,
        } = prepared;
        if reused {
            return Ok(token);
        }

        self.token_store.add_token(token.clone()).await?;

        tracing::info!(
            client_id = %token.client_id,
            grant_type = %grant_type,
            token_id = %token.id,
            refresh_token = token.refresh_token.is_some(),
            id_token = token.id_token.is_some(),
            expires_in = token.expires_in,
            "Token issued"
        );

        let event = match token.subject() {
            Some(subject) => AuthEvent::TokenGranted {
                id: token.id.clone(),
                subject: Some(subject.to_string()),
                client_id: token.client_id.clone(),
                scopes,
                grant_type,
                timestamp: token.create_date_time,
            },
            None => AuthEvent::AccessToClientGranted {
                id: token.id.clone(),
                client_id: token.client_id.clone(),
                scopes,
                grant_type,
                timestamp: token.create_date_time,
            },
        };
        self.events.publish(event).await;

        Ok(token)
    }
}
