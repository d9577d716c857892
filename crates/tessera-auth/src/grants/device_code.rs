//! Device code polling (RFC 8628 section 3.4).
//!
//! An unapproved record answers every poll with an error:
//!
//! | condition                           | error                  |
//! |-------------------------------------|------------------------|
//! | `now > expires`                     | `expired_token`        |
//! | `now < last_polled + interval`      | `slow_down`            |
//! | otherwise                           | `authorization_pending`|
//!
//! `last_polled` is updated on `slow_down` and `authorization_pending`.

use std::sync::Arc;

use serde::Deserialize;
use time::OffsetDateTime;

use crate::AuthResult;
use crate::error::AuthError;
use crate::grants::issuer::{IssueRequest, TokenIssuer};
use crate::grants::{authenticate_for_grant, identity_payloads};
use crate::oauth::client_auth::{ClientAuthParameters, ClientAuthenticator, ClientCertificate};
use crate::storage::{DeviceAuthorizationStore, ResourceOwnerStore};
use crate::types::{GrantType, GrantedToken, has_offline_access};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeviceCodeGrantParameter {
    #[serde(flatten)]
    pub client: ClientAuthParameters,
    #[serde(default)]
    pub device_code: Option<String>,
}

/// Answers device polls and issues the token once the user approved.
pub struct DeviceCodeGrant {
    authenticator: Arc<ClientAuthenticator>,
    device_store: Arc<dyn DeviceAuthorizationStore>,
    resource_owner_store: Arc<dyn ResourceOwnerStore>,
    issuer: Arc<TokenIssuer>,
}

impl DeviceCodeGrant {
    #[must_use]
    pub fn new(
        authenticator: Arc<ClientAuthenticator>,
        device_store: Arc<dyn DeviceAuthorizationStore>,
        resource_owner_store: Arc<dyn ResourceOwnerStore>,
        issuer: Arc<TokenIssuer>,
    ) -> Self {
        Self {
            authenticator,
            device_store,
            resource_owner_store,
            issuer,
        }
    }

    /// # Errors
    ///
    /// - `InvalidRequest` when the device code is missing
    /// - `InvalidClient` for failed client authentication
    /// - `InvalidGrant` for an unknown device code
    /// - `ExpiredToken`, `SlowDown`, `AuthorizationPending` while unapproved
    pub async fn execute(
        &self,
        parameter: &DeviceCodeGrantParameter,
        authorization_header: Option<&str>,
        certificate: Option<&ClientCertificate>,
        issuer: &str,
    ) -> AuthResult<GrantedToken> {
        let device_code = parameter
            .device_code
            .as_deref()
            .filter(|c| !c.is_empty())
            .ok_or_else(|| AuthError::invalid_request("the parameter device_code is missing"))?;

        let client = authenticate_for_grant(
            &self.authenticator,
            &parameter.client,
            authorization_header,
            certificate,
            issuer,
            GrantType::DeviceCode,
        )
        .await?;

        let mut record = self
            .device_store
            .get(&client.client_id, device_code)
            .await?
            .ok_or_else(|| AuthError::invalid_grant("the device code is not valid"))?;

        if !record.is_confirmed {
            let now = OffsetDateTime::now_utc();
            if record.is_expired(now) {
                return Err(AuthError::ExpiredToken);
            }

            let too_fast = record.is_polling_too_fast(now);
            record.last_polled = now;
            self.device_store.save(record).await?;

            if too_fast {
                tracing::debug!(client_id = %client.client_id, "Device polling too fast");
                return Err(AuthError::SlowDown);
            }
            return Err(AuthError::AuthorizationPending);
        }

        let subject = record
            .subject
            .as_deref()
            .ok_or_else(|| AuthError::internal("approved device authorization has no subject"))?;
        let owner = self
            .resource_owner_store
            .get_by_id(subject)
            .await?
            .ok_or_else(|| AuthError::invalid_grant("the resource owner doesn't exist"))?;

        let (id_token_payload, user_info_payload) = identity_payloads(
            self.issuer.generator(),
            &owner.to_principal(),
            &client,
            &record.scopes,
            issuer,
        )
        .await?;

        let mut request = IssueRequest::new(&client, GrantType::DeviceCode, record.scopes.clone());
        request.issue_refresh_token = has_offline_access(&record.scopes);
        request.id_token_payload = id_token_payload;
        request.user_info_payload = Some(user_info_payload);
        self.issuer.issue(request).await
    }
}
