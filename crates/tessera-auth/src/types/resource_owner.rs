//! Resource owners, their claims and recorded consents.

use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::AuthResult;
use crate::error::AuthError;
use crate::jwt::payload::{JwtPayload, claim_names};

/// Default authentication method reference for password logins.
pub const DEFAULT_AMR: &str = "pwd";

/// A single claim statement about a subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    /// Claim name.
    #[serde(rename = "type")]
    pub claim_type: String,
    /// Claim value.
    pub value: String,
}

impl Claim {
    /// Creates a claim.
    #[must_use]
    pub fn new(claim_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            claim_type: claim_type.into(),
            value: value.into(),
        }
    }
}

/// The set of claims known about an authenticated party.
///
/// A claim type may appear several times, in which case it is multi-valued.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClaimsPrincipal {
    claims: Vec<Claim>,
}

impl ClaimsPrincipal {
    /// Creates a principal from claims.
    #[must_use]
    pub fn new(claims: Vec<Claim>) -> Self {
        Self { claims }
    }

    /// Flattens a JWT payload into claims. Arrays become repeated claims.
    #[must_use]
    pub fn from_payload(payload: &JwtPayload) -> Self {
        let mut claims = Vec::new();
        for (name, value) in payload.iter() {
            match value {
                Value::Null => {}
                Value::Array(items) => {
                    claims.extend(items.iter().map(|item| Claim::new(name, value_to_string(item))));
                }
                other => claims.push(Claim::new(name, value_to_string(other))),
            }
        }
        Self { claims }
    }

    /// Returns all claims.
    #[must_use]
    pub fn claims(&self) -> &[Claim] {
        &self.claims
    }

    /// Returns the subject (`sub`).
    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        self.first(claim_names::SUBJECT)
    }

    /// Returns `true` when a subject is known.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.subject().is_some_and(|s| !s.is_empty())
    }

    /// Returns the first value of a claim.
    #[must_use]
    pub fn first(&self, claim_type: &str) -> Option<&str> {
        self.claims
            .iter()
            .find(|c| c.claim_type == claim_type)
            .map(|c| c.value.as_str())
    }

    /// Returns every value of a claim.
    #[must_use]
    pub fn values(&self, claim_type: &str) -> Vec<&str> {
        self.claims
            .iter()
            .filter(|c| c.claim_type == claim_type)
            .map(|c| c.value.as_str())
            .collect()
    }

    /// Returns the JSON representation of a claim.
    ///
    /// Several values become an array. Single values of the standard boolean,
    /// numeric and structured claims are converted to their JSON type.
    #[must_use]
    pub fn json_value(&self, claim_type: &str) -> Option<Value> {
        let values = self.values(claim_type);
        match values.as_slice() {
            [] => None,
            [single] => Some(typed_value(claim_type, single)),
            many => Some(Value::Array(
                many.iter().map(|v| Value::String((*v).to_string())).collect(),
            )),
        }
    }
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn typed_value(claim_type: &str, value: &str) -> Value {
    match claim_type {
        "email_verified" | "phone_number_verified" => value
            .parse::<bool>()
            .map(Value::Bool)
            .unwrap_or_else(|_| Value::String(value.to_string())),
        "updated_at" | claim_names::AUTH_TIME => value
            .parse::<i64>()
            .map(Value::from)
            .unwrap_or_else(|_| Value::String(value.to_string())),
        "address" => match serde_json::from_str::<Value>(value) {
            Ok(object @ Value::Object(_)) => object,
            _ => Value::String(value.to_string()),
        },
        _ => Value::String(value.to_string()),
    }
}

/// End user able to authorize access to protected resources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceOwner {
    /// Subject identifier.
    pub id: String,

    /// Argon2id hash of the password in PHC string format.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,

    /// Claims about the resource owner.
    #[serde(default)]
    pub claims: Vec<Claim>,

    /// Authentication method reference of the credential.
    #[serde(default = "default_amr")]
    pub amr: String,
}

fn default_amr() -> String {
    DEFAULT_AMR.to_string()
}

impl ResourceOwner {
    /// Creates a resource owner without a password.
    #[must_use]
    pub fn new(id: impl Into<String>, claims: Vec<Claim>) -> Self {
        Self {
            id: id.into(),
            password_hash: None,
            claims,
            amr: default_amr(),
        }
    }

    /// Creates a password-authenticated resource owner.
    ///
    /// # Errors
    ///
    /// Returns an internal error if hashing fails.
    pub fn with_password(
        id: impl Into<String>,
        password: &str,
        claims: Vec<Claim>,
    ) -> AuthResult<Self> {
        Ok(Self {
            password_hash: Some(Self::hash_password(password)?),
            ..Self::new(id, claims)
        })
    }

    /// Hashes a password with Argon2id and a random salt.
    ///
    /// # Errors
    ///
    /// Returns an internal error if hashing fails.
    pub fn hash_password(password: &str) -> AuthResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AuthError::internal(format!("password hashing failed: {}", e)))
    }

    /// Checks a password against the stored hash. A missing or malformed
    /// hash never matches.
    #[must_use]
    pub fn verify_password(&self, password: &str) -> bool {
        let Some(stored) = self.password_hash.as_deref() else {
            return false;
        };
        match PasswordHash::new(stored) {
            Ok(parsed) => Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(e) => {
                tracing::warn!(subject = %self.id, error = %e, "Stored password hash is malformed");
                false
            }
        }
    }

    /// Builds the principal of this resource owner.
    ///
    /// `sub` and `amr` are added when absent from the stored claims.
    #[must_use]
    pub fn to_principal(&self) -> ClaimsPrincipal {
        let mut claims = self.claims.clone();
        if !claims.iter().any(|c| c.claim_type == claim_names::SUBJECT) {
            claims.insert(0, Claim::new(claim_names::SUBJECT, &self.id));
        }
        if !claims.iter().any(|c| c.claim_type == claim_names::AMR) {
            claims.push(Claim::new(claim_names::AMR, &self.amr));
        }
        ClaimsPrincipal::new(claims)
    }
}

/// Consent given by a resource owner to a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Consent {
    /// Consent identifier.
    pub id: String,

    /// Subject of the resource owner.
    pub subject: String,

    /// Client the consent was given to.
    pub client_id: String,

    /// Consented scopes.
    #[serde(default)]
    pub scopes: Vec<String>,

    /// Consented claim names.
    #[serde(default)]
    pub claims: Vec<String>,
}

impl Consent {
    /// Returns `true` when this consent covers the request.
    ///
    /// A request carrying a `claims` parameter is covered when the consented
    /// claim set is identical; otherwise every requested scope must be
    /// consented.
    #[must_use]
    pub fn covers(&self, client_id: &str, scopes: &[String], claims: &[String]) -> bool {
        if self.client_id != client_id {
            return false;
        }
        if !claims.is_empty() {
            let mut consented = self.claims.clone();
            let mut requested = claims.to_vec();
            consented.sort();
            requested.sort();
            consented.dedup();
            requested.dedup();
            return consented == requested;
        }
        scopes.iter().all(|s| self.scopes.contains(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_password_verification() {
        let owner = ResourceOwner::with_password("alice", "p@ss", vec![]).unwrap();
        assert!(owner.verify_password("p@ss"));
        assert!(!owner.verify_password("wrong"));

        let no_password = ResourceOwner::new("bob", vec![]);
        assert!(!no_password.verify_password("p@ss"));

        let unsalted = ResourceOwner {
            password_hash: Some(crate::types::hash_token("p@ss")),
            ..ResourceOwner::new("carol", vec![])
        };
        assert!(!unsalted.verify_password("p@ss"));
    }

    #[test]
    fn test_password_hash_is_salted_phc_string() {
        let first = ResourceOwner::hash_password("p@ss").unwrap();
        let second = ResourceOwner::hash_password("p@ss").unwrap();
        assert!(first.starts_with("$argon2id$"));
        assert_ne!(first, second);
    }

    #[test]
    fn test_principal_adds_subject_and_amr() {
        let owner = ResourceOwner::new("alice", vec![Claim::new("email", "alice@example.com")]);
        let principal = owner.to_principal();
        assert_eq!(principal.subject(), Some("alice"));
        assert_eq!(principal.first("amr"), Some("pwd"));
        assert!(principal.is_authenticated());
    }

    #[test]
    fn test_json_value_types() {
        let principal = ClaimsPrincipal::new(vec![
            Claim::new("email_verified", "true"),
            Claim::new("updated_at", "1700000000"),
            Claim::new("role", "admin"),
            Claim::new("role", "user"),
            Claim::new("name", "Alice"),
        ]);
        assert_eq!(principal.json_value("email_verified"), Some(json!(true)));
        assert_eq!(principal.json_value("updated_at"), Some(json!(1_700_000_000)));
        assert_eq!(principal.json_value("role"), Some(json!(["admin", "user"])));
        assert_eq!(principal.json_value("name"), Some(json!("Alice")));
        assert_eq!(principal.json_value("missing"), None);
    }

    #[test]
    fn test_from_payload_flattens_arrays() {
        let mut payload = JwtPayload::new();
        payload.insert("sub", json!("bob"));
        payload.insert("role", json!(["a", "b"]));
        payload.insert("age", json!(42));
        let principal = ClaimsPrincipal::from_payload(&payload);
        assert_eq!(principal.values("role"), vec!["a", "b"]);
        assert_eq!(principal.first("age"), Some("42"));
        assert_eq!(principal.subject(), Some("bob"));
    }

    #[test]
    fn test_consent_covers() {
        let consent = Consent {
            id: "c1".to_string(),
            subject: "alice".to_string(),
            client_id: "web".to_string(),
            scopes: vec!["openid".to_string(), "profile".to_string()],
            claims: vec!["email".to_string()],
        };
        assert!(consent.covers("web", &["openid".to_string()], &[]));
        assert!(!consent.covers("web", &["api".to_string()], &[]));
        assert!(!consent.covers("other", &["openid".to_string()], &[]));
        assert!(consent.covers("web", &[], &["email".to_string()]));
        assert!(!consent.covers("web", &[], &["email".to_string(), "name".to_string()]));
    }
}
