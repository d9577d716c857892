//! Token endpoint grant actions.
//!
//! One action per grant type, each a short state machine:
//!
//! 1. authenticate the client and check it may use the grant
//! 2. run the grant-specific validation
//! 3. hand the result to [`TokenIssuer`], which reuses or mints the token
//!
//! Every action returns a typed error and persists nothing before all
//! validation has passed. [`TokenGrants`] dispatches a raw
//! [`TokenRequest`] to the matching action.

pub mod authorization_code;
pub mod client_credentials;
pub mod device_code;
pub mod issuer;
pub mod password;
pub mod refresh_token;
pub mod uma_ticket;

use std::sync::Arc;

use time::OffsetDateTime;

pub use authorization_code::{AuthorizationCodeGrant, AuthorizationCodeGrantParameter};
pub use client_credentials::{ClientCredentialsGrant, ClientCredentialsGrantParameter};
pub use device_code::{DeviceCodeGrant, DeviceCodeGrantParameter};
pub use issuer::{IssueRequest, PreparedToken, TokenIssuer};
pub use password::{
    PasswordAuthenticator, ResourceOwnerAuthenticator, ResourceOwnerAuthenticators,
    ResourceOwnerGrantParameter, ResourceOwnerPasswordGrant,
};
pub use refresh_token::{RefreshTokenGrant, RefreshTokenGrantParameter};
pub use uma_ticket::{TicketGrantParameter, UmaTicketGrant};

use crate::AuthResult;
use crate::error::AuthError;
use crate::jwt::JwtGenerator;
use crate::jwt::payload::JwtPayload;
use crate::oauth::authorize::AuthorizationParameter;
use crate::oauth::client_auth::{
    AuthenticateInstruction, ClientAuthParameters, ClientAuthenticator, ClientCertificate,
};
use crate::oauth::token::TokenRequest;
use crate::types::{Client, ClaimsPrincipal, GrantType, GrantedToken, parse_scopes};

/// Dispatches token requests to the grant actions.
pub struct TokenGrants {
    pub authorization_code: AuthorizationCodeGrant,
    pub refresh_token: RefreshTokenGrant,
    pub client_credentials: ClientCredentialsGrant,
    pub password: ResourceOwnerPasswordGrant,
    pub device_code: DeviceCodeGrant,
    pub uma_ticket: UmaTicketGrant,
}

impl TokenGrants {
    /// Runs the action selected by `request.grant_type`.
    ///
    /// # Errors
    ///
    /// `UnsupportedGrantType` for an unknown grant, otherwise the error of
    /// the action.
    pub async fn execute(
        &self,
        request: &TokenRequest,
        authorization_header: Option<&str>,
        certificate: Option<&ClientCertificate>,
        issuer: &str,
    ) -> AuthResult<GrantedToken> {
        let grant_type: GrantType = request.grant_type.parse()?;
        tracing::debug!(grant_type = %grant_type, "Token request");

        let client = request.client.clone();
        match grant_type {
            GrantType::AuthorizationCode => {
                let parameter = AuthorizationCodeGrantParameter {
                    client,
                    code: request.code.clone(),
                    redirect_uri: request.redirect_uri.clone(),
                    code_verifier: request.code_verifier.clone(),
                };
                self.authorization_code
                    .execute(&parameter, authorization_header, certificate, issuer)
                    .await
            }
            GrantType::RefreshToken => {
                let parameter = RefreshTokenGrantParameter {
                    client,
                    refresh_token: request.refresh_token.clone(),
                    scope: request.scope.clone(),
                };
                self.refresh_token
                    .execute(&parameter, authorization_header, certificate, issuer)
                    .await
            }
            GrantType::ClientCredentials => {
                let parameter = ClientCredentialsGrantParameter {
                    client,
                    scope: request.scope.clone(),
                };
                self.client_credentials
                    .execute(&parameter, authorization_header, certificate, issuer)
                    .await
            }
            GrantType::Password => {
                let parameter = ResourceOwnerGrantParameter {
                    client,
                    username: request.username.clone(),
                    password: request.password.clone(),
                    scope: request.scope.clone(),
                    amr_values: request.amr_values.clone(),
                };
                self.password
                    .execute(&parameter, authorization_header, certificate, issuer)
                    .await
            }
            GrantType::DeviceCode => {
                let parameter = DeviceCodeGrantParameter {
                    client,
                    device_code: request.device_code.clone(),
                };
                self.device_code
                    .execute(&parameter, authorization_header, certificate, issuer)
                    .await
            }
            GrantType::UmaTicket => {
                let parameter = TicketGrantParameter {
                    client,
                    ticket: request.ticket.clone(),
                    claim_token: request.claim_token.clone(),
                    claim_token_format: request.claim_token_format.clone(),
                };
                self.uma_ticket
                    .execute(&parameter, authorization_header, certificate, issuer)
                    .await
            }
            GrantType::Implicit => Err(AuthError::unsupported_grant_type(grant_type.as_str())),
        }
    }
}

/// Authenticates the client and checks it registered `grant_type`.
pub(crate) async fn authenticate_for_grant(
    authenticator: &ClientAuthenticator,
    parameters: &ClientAuthParameters,
    authorization_header: Option<&str>,
    certificate: Option<&ClientCertificate>,
    issuer: &str,
    grant_type: GrantType,
) -> AuthResult<Client> {
    let instruction = AuthenticateInstruction::new(parameters, authorization_header, certificate);
    let client = authenticator.authenticate(&instruction, issuer).await?.client;

    if !client.is_grant_type_allowed(grant_type) {
        tracing::debug!(
            client_id = %client.client_id,
            grant_type = %grant_type,
            "Grant type not allowed for client"
        );
        return Err(AuthError::invalid_grant(format!(
            "the client {} doesn't support the grant type {}",
            client.client_id, grant_type
        )));
    }
    Ok(client)
}

/// Resolves the requested scope against the client's allowed scopes.
///
/// A missing or blank scope grants every allowed scope.
pub(crate) fn resolve_scopes(requested: Option<&str>, client: &Client) -> AuthResult<Vec<String>> {
    let Some(requested) = requested.filter(|s| !s.trim().is_empty()) else {
        return Ok(client.allowed_scopes.clone());
    };

    let scopes = parse_scopes(requested);
    if let Some(scope) = scopes.iter().find(|s| !client.is_scope_allowed(s)) {
        return Err(AuthError::invalid_scope(format!(
            "the scope '{scope}' is not allowed for the client"
        )));
    }
    Ok(scopes)
}

/// Builds the ID token (for `openid` requests) and user info payloads of a
/// resource owner acting through `client`.
pub(crate) async fn identity_payloads(
    generator: &Arc<JwtGenerator>,
    principal: &ClaimsPrincipal,
    client: &Client,
    scopes: &[String],
    issuer: &str,
) -> AuthResult<(Option<JwtPayload>, JwtPayload)> {
    let params = AuthorizationParameter {
        client_id: client.client_id.clone(),
        scope: scopes.join(" "),
        ..AuthorizationParameter::default()
    };

    let id_token_payload = if scopes.iter().any(|s| s == "openid") {
        Some(
            generator
                .generate_id_token_payload_for_scopes(
                    principal,
                    &params,
                    issuer,
                    OffsetDateTime::now_utc(),
                )
                .await?,
        )
    } else {
        None
    };
    let user_info_payload = generator
        .generate_user_info_payload_for_scope(principal, &params)
        .await?;
    Ok((id_token_payload, user_info_payload))
}
