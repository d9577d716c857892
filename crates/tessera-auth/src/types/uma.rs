//! UMA 2.0 domain types: permission tickets, resource sets and policies.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Permission requested on one resource set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketLine {
    /// Resource set identifier.
    pub resource_set_id: String,

    /// Requested scopes on the resource set.
    pub scopes: Vec<String>,
}

/// UMA permission ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    /// Ticket identifier.
    pub id: String,

    /// Client (resource server) that registered the permission.
    pub client_id: String,

    /// Requested permissions.
    pub lines: Vec<TicketLine>,

    /// Absolute expiry.
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,

    /// When the ticket was issued.
    #[serde(with = "time::serde::rfc3339")]
    pub create_date_time: OffsetDateTime,

    /// Earliest instant the ticket may be redeemed.
    #[serde(with = "time::serde::rfc3339")]
    pub not_before: OffsetDateTime,

    /// Whether the resource owner approved a pending request.
    #[serde(default)]
    pub is_authorized_by_ro: bool,

    /// Audience of the requesting party token.
    #[serde(default)]
    pub audience: Vec<String>,
}

impl Ticket {
    /// Returns `true` if the ticket cannot be redeemed at `now`.
    #[must_use]
    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        now > self.expires_at || now < self.not_before
    }

    /// Returns the union of the requested scopes, in first-seen order.
    #[must_use]
    pub fn scopes(&self) -> Vec<String> {
        let mut scopes: Vec<String> = Vec::new();
        for scope in self.lines.iter().flat_map(|l| l.scopes.iter()) {
            if !scopes.contains(scope) {
                scopes.push(scope.clone());
            }
        }
        scopes
    }
}

/// Protected resource registered by a resource server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSet {
    /// Resource set identifier.
    pub id: String,

    /// Display name.
    pub name: String,

    /// Subject of the resource owner.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,

    /// Scopes available on the resource.
    #[serde(default)]
    pub scopes: Vec<String>,

    /// Attached policies.
    #[serde(default)]
    pub policies: Vec<Policy>,
}

/// Authorization policy attached to a resource set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    /// Policy identifier.
    pub id: String,

    /// Rules evaluated in order.
    #[serde(default)]
    pub rules: Vec<PolicyRule>,
}

/// Claim the requesting party must present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequiredClaim {
    /// Claim name.
    #[serde(rename = "type")]
    pub claim_type: String,

    /// Expected value.
    pub value: String,

    /// Display name returned in `need_info` details.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub friendly_name: Option<String>,
}

/// One rule of a policy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyRule {
    /// Rule identifier.
    #[serde(default)]
    pub id: String,

    /// Clients allowed to request the resource. Empty means any client.
    #[serde(default)]
    pub client_ids_allowed: Vec<String>,

    /// Scopes the rule grants.
    #[serde(default)]
    pub scopes: Vec<String>,

    /// Claims the requesting party must present.
    #[serde(default)]
    pub claims: Vec<RequiredClaim>,

    /// Whether the resource owner must approve the request.
    #[serde(default)]
    pub is_resource_owner_consent_needed: bool,

    /// Script hook source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script: Option<String>,

    /// OpenID provider the requesting party should obtain claims from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openid_provider: Option<String>,
}
