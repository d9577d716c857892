//! Scope domain type.

use serde::{Deserialize, Serialize};

use crate::config::ScopeClaims;

/// A scope and the claim names it releases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scope {
    /// Scope name.
    pub name: String,

    /// Released claim names.
    #[serde(default)]
    pub claims: Vec<String>,

    /// Whether this is an OpenID Connect scope.
    #[serde(default)]
    pub is_openid_scope: bool,

    /// Whether the scope is advertised.
    #[serde(default)]
    pub is_exposed: bool,
}

impl From<&ScopeClaims> for Scope {
    fn from(value: &ScopeClaims) -> Self {
        Self {
            name: value.name.clone(),
            claims: value.claims.clone(),
            is_openid_scope: value.is_openid_scope,
            is_exposed: value.is_exposed,
        }
    }
}

/// Splits a space-delimited `scope` parameter, dropping duplicates.
#[must_use]
pub fn parse_scopes(scope: &str) -> Vec<String> {
    let mut scopes: Vec<String> = Vec::new();
    for part in scope.split_whitespace() {
        if !scopes.iter().any(|s| s == part) {
            scopes.push(part.to_string());
        }
    }
    scopes
}

/// Returns `true` when `scopes` allows a refresh token to be minted.
#[must_use]
pub fn has_offline_access<S: AsRef<str>>(scopes: &[S]) -> bool {
    scopes
        .iter()
        .any(|s| matches!(s.as_ref(), "offline_access" | "offline"))
}
