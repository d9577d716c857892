//! JWT payload model.
//!
//! `JwtPayload` is an ordered JSON object. Ordering keeps serialized tokens
//! deterministic, which the token store relies on when comparing payload
//! snapshots.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Registered and OpenID Connect claim names used by the core.
pub mod claim_names {
    pub const SUBJECT: &str = "sub";
    pub const ISSUER: &str = "iss";
    pub const AUDIENCE: &str = "aud";
    pub const EXPIRATION: &str = "exp";
    pub const ISSUED_AT: &str = "iat";
    pub const NOT_BEFORE: &str = "nbf";
    pub const JWT_ID: &str = "jti";
    pub const AUTH_TIME: &str = "auth_time";
    pub const NONCE: &str = "nonce";
    pub const ACR: &str = "acr";
    pub const AMR: &str = "amr";
    pub const AZP: &str = "azp";
    pub const AT_HASH: &str = "at_hash";
    pub const C_HASH: &str = "c_hash";
}

/// Claims computed by the server rather than taken from the principal.
pub const PROTOCOL_CLAIMS: &[&str] = &[
    claim_names::ISSUER,
    claim_names::AUDIENCE,
    claim_names::EXPIRATION,
    claim_names::ISSUED_AT,
    claim_names::AUTH_TIME,
    claim_names::NONCE,
    claim_names::ACR,
    claim_names::AMR,
    claim_names::AZP,
];

/// Claims that change on every issuance and are ignored by [`JwtPayload::is_equivalent`].
pub const TIME_DEPENDENT_CLAIMS: &[&str] = &[
    claim_names::ISSUED_AT,
    claim_names::EXPIRATION,
    claim_names::AUTH_TIME,
    claim_names::AT_HASH,
    claim_names::C_HASH,
];

/// An ordered set of JWT claims.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JwtPayload(BTreeMap<String, Value>);

impl JwtPayload {
    /// Creates an empty payload.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a claim, returning the previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(name.into(), value.into())
    }

    /// Removes a claim.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.0.remove(name)
    }

    /// Returns a claim.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Returns `true` if the claim is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Returns a string claim.
    #[must_use]
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(Value::as_str)
    }

    /// Returns an integer claim.
    #[must_use]
    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.0.get(name).and_then(Value::as_i64)
    }

    /// Returns the `sub` claim.
    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        self.get_str(claim_names::SUBJECT)
    }

    /// Returns the `iss` claim.
    #[must_use]
    pub fn issuer(&self) -> Option<&str> {
        self.get_str(claim_names::ISSUER)
    }

    /// Returns the `exp` claim.
    #[must_use]
    pub fn expiration(&self) -> Option<i64> {
        self.get_i64(claim_names::EXPIRATION)
    }

    /// Returns the `aud` claim, which may be a string or an array.
    #[must_use]
    pub fn audiences(&self) -> Vec<String> {
        string_values(self.get(claim_names::AUDIENCE))
    }

    /// Sets `aud`: a single audience is written as a string.
    pub fn set_audiences(&mut self, audiences: &[String]) {
        match audiences {
            [] => {
                self.remove(claim_names::AUDIENCE);
            }
            [single] => {
                self.insert(claim_names::AUDIENCE, single.clone());
            }
            many => {
                self.insert(claim_names::AUDIENCE, many.to_vec());
            }
        }
    }

    /// Iterates over the claims in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Returns the number of claims.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the payload has no claims.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns `true` when both payloads carry the same claims, ignoring
    /// [`TIME_DEPENDENT_CLAIMS`].
    #[must_use]
    pub fn is_equivalent(&self, other: &JwtPayload) -> bool {
        let strip = |payload: &JwtPayload| {
            payload
                .0
                .iter()
                .filter(|(k, _)| !TIME_DEPENDENT_CLAIMS.contains(&k.as_str()))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect::<BTreeMap<_, _>>()
        };
        strip(self) == strip(other)
    }

    /// Consumes the payload and returns the underlying map.
    #[must_use]
    pub fn into_inner(self) -> BTreeMap<String, Value> {
        self.0
    }
}

impl From<BTreeMap<String, Value>> for JwtPayload {
    fn from(value: BTreeMap<String, Value>) -> Self {
        Self(value)
    }
}

impl FromIterator<(String, Value)> for JwtPayload {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Reads a claim that may be a string or an array of strings.
#[must_use]
pub fn string_values(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::String(s)) => vec![s.clone()],
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect(),
        Some(Value::Null) | None => Vec::new(),
        Some(other) => vec![other.to_string()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_audiences_string_or_array() {
        let mut payload = JwtPayload::new();
        payload.set_audiences(&["client".to_string()]);
        assert_eq!(payload.get("aud"), Some(&json!("client")));
        assert_eq!(payload.audiences(), vec!["client"]);

        payload.set_audiences(&["a".to_string(), "b".to_string()]);
        assert_eq!(payload.get("aud"), Some(&json!(["a", "b"])));
        assert_eq!(payload.audiences(), vec!["a", "b"]);
    }

    #[test]
    fn test_insert_replaces() {
        let mut payload = JwtPayload::new();
        payload.insert("iat", 1);
        let previous = payload.insert("iat", 2);
        assert_eq!(previous, Some(json!(1)));
        assert_eq!(payload.len(), 1);
        assert_eq!(payload.get_i64("iat"), Some(2));
    }

    #[test]
    fn test_is_equivalent_ignores_time_claims() {
        let mut a = JwtPayload::new();
        a.insert("sub", "alice");
        a.insert("iat", 1);
        a.insert("at_hash", "x");
        let mut b = JwtPayload::new();
        b.insert("sub", "alice");
        b.insert("iat", 2);

        assert!(a.is_equivalent(&b));

        b.insert("email", "alice@example.com");
        assert!(!a.is_equivalent(&b));
    }

    #[test]
    fn test_serializes_as_plain_object() {
        let mut payload = JwtPayload::new();
        payload.insert("sub", "alice");
        payload.insert("aud", json!(["a"]));
        let json = serde_json::to_string(&payload).unwrap();
        assert_eq!(json, r#"{"aud":["a"],"sub":"alice"}"#);
    }
}
