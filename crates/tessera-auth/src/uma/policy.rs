//! UMA authorization policy evaluation.
//!
//! Every ticket line is checked against the policies of its resource set.
//! A resource set without policies authorizes everything. Otherwise each
//! rule must authorize, and the first rule that does not decides the
//! outcome. Rule checks run in this order:
//!
//! 1. the requesting client is in `client_ids_allowed` (when set)
//! 2. the requested scopes are a subset of the rule scopes (when set)
//! 3. resource owner approval, when the rule requires it
//! 4. the required claims, read from a verified claim token
//!
//! A ticket is authorized only when every line is.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

use crate::AuthResult;
use crate::config::UmaConfig;
use crate::error::AuthError;
use crate::jwt::JwtParser;
use crate::storage::ResourceSetStore;
use crate::types::{ClaimsPrincipal, PolicyRule, RequiredClaim, ResourceSet, Ticket, TicketLine};

/// Claim token format of an OpenID Connect ID token.
pub const ID_TOKEN_CLAIM_TOKEN_FORMAT: &str =
    "http://openid.net/specs/openid-connect-core-1_0.html#IDToken";

/// Claims pushed by the requesting party.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimTokenParameter {
    pub token: String,
    pub format: String,
}

/// A claim the requesting party still has to provide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequiredClaimDetails {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub friendly_name: Option<String>,
    pub claim_type: String,
    pub claim_token_format: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RequestingPartyClaims {
    pub required_claims: Vec<RequiredClaimDetails>,
    /// OpenID provider the requesting party should be sent to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_user: Option<String>,
}

/// Payload of a `need_info` error.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NeedInfoDetails {
    pub requesting_party_claims: RequestingPartyClaims,
}

/// Outcome of a policy evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorizationPolicyResult {
    Authorized,
    NotAuthorized,
    NeedInfo(NeedInfoDetails),
    RequestSubmitted,
}

impl AuthorizationPolicyResult {
    #[must_use]
    pub fn is_authorized(&self) -> bool {
        matches!(self, Self::Authorized)
    }

    /// Converts a non-authorized outcome into the matching error.
    ///
    /// # Errors
    ///
    /// `NotAuthorized`, `NeedInfo` or `RequestSubmitted`.
    pub fn into_result(self) -> AuthResult<()> {
        match self {
            Self::Authorized => Ok(()),
            Self::NotAuthorized => Err(AuthError::not_authorized(
                "the authorization policy is not satisfied",
            )),
            Self::NeedInfo(details) => Err(AuthError::need_info(details)),
            Self::RequestSubmitted => Err(AuthError::RequestSubmitted),
        }
    }
}

/// Evaluates UMA tickets against resource set policies.
pub struct AuthorizationPolicyValidator {
    resource_set_store: Arc<dyn ResourceSetStore>,
    parser: Arc<JwtParser>,
    default_openid_provider: Option<String>,
}

impl AuthorizationPolicyValidator {
    #[must_use]
    pub fn new(
        resource_set_store: Arc<dyn ResourceSetStore>,
        parser: Arc<JwtParser>,
        config: &UmaConfig,
    ) -> Self {
        Self {
            resource_set_store,
            parser,
            default_openid_provider: config.default_openid_provider.clone(),
        }
    }

    /// Evaluates `ticket` for the requesting `client_id`.
    ///
    /// `issuer` is the expected issuer of ID token claim tokens.
    ///
    /// # Errors
    ///
    /// Returns `InvalidGrant` when a referenced resource set does not exist,
    /// or a storage error.
    pub async fn validate(
        &self,
        ticket: &Ticket,
        client_id: &str,
        claim_token: Option<&ClaimTokenParameter>,
        issuer: &str,
    ) -> AuthResult<AuthorizationPolicyResult> {
        let ids: Vec<String> = ticket
            .lines
            .iter()
            .map(|line| line.resource_set_id.clone())
            .collect();
        let resource_sets = self.resource_set_store.get(&ids).await?;

        let principal = match claim_token {
            Some(claim_token) => self.extract_principal(claim_token, issuer).await,
            None => None,
        };

        for line in &ticket.lines {
            let resource_set = resource_sets
                .iter()
                .find(|rs| rs.id == line.resource_set_id)
                .ok_or_else(|| {
                    AuthError::invalid_grant(format!(
                        "the resource set '{}' doesn't exist",
                        line.resource_set_id
                    ))
                })?;

            let result = self.validate_line(ticket, line, resource_set, client_id, principal.as_ref());
            if !result.is_authorized() {
                tracing::debug!(
                    ticket_id = %ticket.id,
                    resource_set_id = %resource_set.id,
                    result = ?result,
                    "UMA ticket line not authorized"
                );
                return Ok(result);
            }
        }

        Ok(AuthorizationPolicyResult::Authorized)
    }

    fn validate_line(
        &self,
        ticket: &Ticket,
        line: &TicketLine,
        resource_set: &ResourceSet,
        client_id: &str,
        principal: Option<&ClaimsPrincipal>,
    ) -> AuthorizationPolicyResult {
        for rule in resource_set.policies.iter().flat_map(|p| p.rules.iter()) {
            let result = self.validate_rule(ticket, line, rule, client_id, principal);
            if !result.is_authorized() {
                return result;
            }
        }
        AuthorizationPolicyResult::Authorized
    }

    fn validate_rule(
        &self,
        ticket: &Ticket,
        line: &TicketLine,
        rule: &PolicyRule,
        client_id: &str,
        principal: Option<&ClaimsPrincipal>,
    ) -> AuthorizationPolicyResult {
        if !rule.client_ids_allowed.is_empty()
            && !rule.client_ids_allowed.iter().any(|c| c == client_id)
        {
            return AuthorizationPolicyResult::NotAuthorized;
        }

        if !rule.scopes.is_empty() && !line.scopes.iter().all(|s| rule.scopes.contains(s)) {
            return AuthorizationPolicyResult::NotAuthorized;
        }

        if rule.is_resource_owner_consent_needed && !ticket.is_authorized_by_ro {
            return AuthorizationPolicyResult::RequestSubmitted;
        }

        if rule.script.is_some() {
            tracing::warn!(rule_id = %rule.id, "Policy scripts are not evaluated");
        }

        if !rule.claims.is_empty() {
            let satisfied = principal
                .is_some_and(|p| rule.claims.iter().all(|required| has_claim(p, required)));
            if !satisfied {
                return AuthorizationPolicyResult::NeedInfo(self.need_info(rule));
            }
        }

        AuthorizationPolicyResult::Authorized
    }

    async fn extract_principal(
        &self,
        claim_token: &ClaimTokenParameter,
        issuer: &str,
    ) -> Option<ClaimsPrincipal> {
        if claim_token.format != ID_TOKEN_CLAIM_TOKEN_FORMAT {
            tracing::debug!(format = %claim_token.format, "Unsupported claim token format");
            return None;
        }
        match self
            .parser
            .validate_id_token(&claim_token.token, issuer, OffsetDateTime::now_utc())
            .await
        {
            Ok(payload) => Some(ClaimsPrincipal::from_payload(&payload)),
            Err(err) => {
                tracing::debug!(error = %err, "Claim token rejected");
                None
            }
        }
    }

    fn need_info(&self, rule: &PolicyRule) -> NeedInfoDetails {
        NeedInfoDetails {
            requesting_party_claims: RequestingPartyClaims {
                required_claims: rule
                    .claims
                    .iter()
                    .map(|claim| RequiredClaimDetails {
                        name: claim.claim_type.clone(),
                        friendly_name: claim.friendly_name.clone(),
                        claim_type: claim.claim_type.clone(),
                        claim_token_format: vec![ID_TOKEN_CLAIM_TOKEN_FORMAT.to_string()],
                    })
                    .collect(),
                redirect_user: rule
                    .openid_provider
                    .clone()
                    .or_else(|| self.default_openid_provider.clone()),
            },
        }
    }
}

/// Scalar claims match by equality, array claims by membership. An array
/// may also arrive serialized as a JSON string.
fn has_claim(principal: &ClaimsPrincipal, required: &RequiredClaim) -> bool {
    principal.values(&required.claim_type).into_iter().any(|value| {
        if value == required.value {
            return true;
        }
        match serde_json::from_str::<Value>(value) {
            Ok(Value::Array(items)) => items.iter().any(|item| match item {
                Value::String(s) => *s == required.value,
                other => other.to_string() == required.value,
            }),
            _ => false,
        }
    })
}
