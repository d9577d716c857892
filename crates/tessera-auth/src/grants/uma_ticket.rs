//! UMA 2.0 ticket grant (`urn:ietf:params:oauth:grant-type:uma-ticket`).
//!
//! Exchanges a permission ticket for a requesting party token once the
//! resource set policies authorize it. The ticket is consumed on success
//! and kept otherwise, so the client can retry after `need_info` or
//! `request_submitted`.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use time::OffsetDateTime;

use crate::AuthResult;
use crate::error::AuthError;
use crate::grants::authenticate_for_grant;
use crate::grants::issuer::{IssueRequest, TokenIssuer};
use crate::oauth::client_auth::{ClientAuthParameters, ClientAuthenticator, ClientCertificate};
use crate::storage::TicketStore;
use crate::types::{GrantType, GrantedToken};
use crate::uma::{AuthorizationPolicyValidator, ClaimTokenParameter};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TicketGrantParameter {
    #[serde(flatten)]
    pub client: ClientAuthParameters,
    #[serde(default)]
    pub ticket: Option<String>,
    #[serde(default)]
    pub claim_token: Option<String>,
    #[serde(default)]
    pub claim_token_format: Option<String>,
}

impl TicketGrantParameter {
    fn claim_token(&self) -> AuthResult<Option<ClaimTokenParameter>> {
        match (self.claim_token.as_deref(), self.claim_token_format.as_deref()) {
            (None, _) => Ok(None),
            (Some(token), Some(format)) if !format.is_empty() => Ok(Some(ClaimTokenParameter {
                token: token.to_string(),
                format: format.to_string(),
            })),
            (Some(_), _) => Err(AuthError::invalid_request(
                "the parameter claim_token_format is missing",
            )),
        }
    }
}

/// Issues requesting party tokens (RPT).
pub struct UmaTicketGrant {
    authenticator: Arc<ClientAuthenticator>,
    ticket_store: Arc<dyn TicketStore>,
    validator: Arc<AuthorizationPolicyValidator>,
    issuer: Arc<TokenIssuer>,
    rpt_lifetime: Duration,
}

impl UmaTicketGrant {
    #[must_use]
    pub fn new(
        authenticator: Arc<ClientAuthenticator>,
        ticket_store: Arc<dyn TicketStore>,
        validator: Arc<AuthorizationPolicyValidator>,
        issuer: Arc<TokenIssuer>,
        rpt_lifetime: Duration,
    ) -> Self {
        Self {
            authenticator,
            ticket_store,
            validator,
            issuer,
            rpt_lifetime,
        }
    }

    /// # Errors
    ///
    /// - `InvalidRequest` when the ticket is missing
    /// - `InvalidClient` for failed client authentication
    /// - `InvalidGrant` for an unknown or expired ticket
    /// - `NotAuthorized`, `NeedInfo` or `RequestSubmitted` from the policies
    pub async fn execute(
        &self,
        parameter: &TicketGrantParameter,
        authorization_header: Option<&str>,
        certificate: Option<&ClientCertificate>,
        issuer: &str,
    ) -> AuthResult<GrantedToken> {
        let ticket_id = parameter
            .ticket
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AuthError::invalid_request("the parameter ticket is missing"))?;
        let claim_token = parameter.claim_token()?;

        let client = authenticate_for_grant(
            &self.authenticator,
            &parameter.client,
            authorization_header,
            certificate,
            issuer,
            GrantType::UmaTicket,
        )
        .await?;

        let ticket = self
            .ticket_store
            .get(ticket_id)
            .await?
            .ok_or_else(|| AuthError::invalid_grant("the ticket doesn't exist"))?;
        if ticket.is_expired(OffsetDateTime::now_utc()) {
            return Err(AuthError::invalid_grant("the ticket is expired"));
        }

        self.validator
            .validate(&ticket, &client.client_id, claim_token.as_ref(), issuer)
            .await?
            .into_result()?;

        if !self.ticket_store.remove(ticket_id).await? {
            tracing::warn!(client_id = %client.client_id, "UMA ticket redeemed concurrently");
            return Err(AuthError::invalid_grant("the ticket doesn't exist"));
        }

        let mut request = IssueRequest::new(&client, GrantType::UmaTicket, ticket.scopes());
        request.lifetime = Some(self.rpt_lifetime);
        self.issuer.issue(request).await
    }
}
