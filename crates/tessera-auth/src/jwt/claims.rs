//! The OpenID Connect `claims` request parameter.
//!
//! Each requested claim carries a [`ClaimConstraint`]: whether it is
//! essential, and optionally the single value or the set of values it must
//! take. Produced claims are checked against the constraint before a payload
//! is released.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::AuthResult;
use crate::error::AuthError;

/// Constraints on one requested claim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimConstraint {
    /// The claim must be present.
    #[serde(default)]
    pub essential: bool,

    /// The claim must take this value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    /// The claim must take one of (or, when multi-valued, contain all of)
    /// these values.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<String>>,
}

impl ClaimConstraint {
    /// An essential constraint without value restrictions.
    #[must_use]
    pub fn essential() -> Self {
        Self {
            essential: true,
            ..Self::default()
        }
    }

    fn from_json(name: &str, value: &Value) -> AuthResult<Self> {
        let object = match value {
            Value::Null => return Ok(Self::default()),
            Value::Object(object) => object,
            _ => {
                return Err(AuthError::invalid_request(format!(
                    "the claims parameter entry '{}' is not an object",
                    name
                )));
            }
        };

        let essential = match object.get("essential") {
            None | Some(Value::Null) => false,
            Some(Value::Bool(b)) => *b,
            Some(_) => {
                return Err(AuthError::invalid_request(format!(
                    "essential of claim '{}' must be a boolean",
                    name
                )));
            }
        };

        let value = match object.get("value") {
            None | Some(Value::Null) => None,
            Some(v) => Some(scalar_to_string(v)),
        };

        let values = match object.get("values") {
            None | Some(Value::Null) => None,
            Some(Value::Array(items)) => Some(items.iter().map(scalar_to_string).collect()),
            Some(_) => {
                return Err(AuthError::invalid_request(format!(
                    "values of claim '{}' must be an array",
                    name
                )));
            }
        };

        Ok(Self {
            essential,
            value,
            values,
        })
    }

    fn to_json(&self) -> Value {
        if *self == Self::default() {
            return Value::Null;
        }
        let mut object = Map::new();
        if self.essential {
            object.insert("essential".to_string(), Value::Bool(true));
        }
        if let Some(value) = &self.value {
            object.insert("value".to_string(), Value::String(value.clone()));
        }
        if let Some(values) = &self.values {
            object.insert(
                "values".to_string(),
                Value::Array(values.iter().cloned().map(Value::String).collect()),
            );
        }
        Value::Object(object)
    }
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// A requested claim and its constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimParameter {
    /// Claim name.
    pub name: String,
    /// Constraint on the produced value.
    pub constraint: ClaimConstraint,
}

impl ClaimParameter {
    /// Creates a claim parameter.
    #[must_use]
    pub fn new(name: impl Into<String>, constraint: ClaimConstraint) -> Self {
        Self {
            name: name.into(),
            constraint,
        }
    }

    /// Returns `true` if the claim is essential.
    #[must_use]
    pub fn is_essential(&self) -> bool {
        self.constraint.essential
    }

    /// Checks a produced value against the constraint.
    ///
    /// An absent or empty value only fails when the claim is essential. A
    /// multi-valued claim must contain `value` and every member of `values`.
    #[must_use]
    pub fn is_satisfied_by(&self, produced: Option<&Value>) -> bool {
        let constraint = &self.constraint;
        match produced {
            None | Some(Value::Null) => !constraint.essential,
            Some(Value::String(s)) if s.is_empty() => !constraint.essential,
            Some(Value::Array(items)) => {
                let produced: Vec<String> = items.iter().map(scalar_to_string).collect();
                if produced.is_empty() {
                    return !constraint.essential;
                }
                if let Some(value) = &constraint.value
                    && !produced.contains(value)
                {
                    return false;
                }
                if let Some(values) = &constraint.values
                    && !values.iter().all(|v| produced.contains(v))
                {
                    return false;
                }
                true
            }
            Some(scalar) => {
                let produced = scalar_to_string(scalar);
                if let Some(value) = &constraint.value
                    && produced != *value
                {
                    return false;
                }
                if let Some(values) = &constraint.values
                    && !values.contains(&produced)
                {
                    return false;
                }
                true
            }
        }
    }
}

/// Parsed `claims` request parameter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimsParameter {
    /// Claims requested in the ID token.
    #[serde(default)]
    pub id_token: Vec<ClaimParameter>,

    /// Claims requested from the user info endpoint.
    #[serde(default)]
    pub userinfo: Vec<ClaimParameter>,
}

impl ClaimsParameter {
    /// Parses the JSON `claims` request parameter.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRequest` if the document is not valid JSON or does not
    /// follow the OpenID Connect claims request structure.
    pub fn parse(json: &str) -> AuthResult<Self> {
        let document: Value = serde_json::from_str(json)
            .map_err(|e| AuthError::invalid_request(format!("the claims parameter is not valid JSON: {}", e)))?;
        let Value::Object(root) = document else {
            return Err(AuthError::invalid_request(
                "the claims parameter must be a JSON object",
            ));
        };

        Ok(Self {
            id_token: parse_group(&root, "id_token")?,
            userinfo: parse_group(&root, "userinfo")?,
        })
    }

    /// Serializes back to the request parameter format.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let group = |params: &[ClaimParameter]| {
            Value::Object(
                params
                    .iter()
                    .map(|p| (p.name.clone(), p.constraint.to_json()))
                    .collect(),
            )
        };
        let mut root = Map::new();
        if !self.id_token.is_empty() {
            root.insert("id_token".to_string(), group(&self.id_token));
        }
        if !self.userinfo.is_empty() {
            root.insert("userinfo".to_string(), group(&self.userinfo));
        }
        Value::Object(root)
    }

    /// Returns `true` if no claim is requested.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.id_token.is_empty() && self.userinfo.is_empty()
    }

    /// Returns every requested claim name, without duplicates.
    #[must_use]
    pub fn claim_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for param in self.id_token.iter().chain(self.userinfo.iter()) {
            if !names.contains(&param.name) {
                names.push(param.name.clone());
            }
        }
        names
    }
}

fn parse_group(root: &Map<String, Value>, group: &str) -> AuthResult<Vec<ClaimParameter>> {
    match root.get(group) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Object(claims)) => claims
            .iter()
            .map(|(name, value)| {
                ClaimConstraint::from_json(name, value).map(|c| ClaimParameter::new(name, c))
            })
            .collect(),
        Some(_) => Err(AuthError::invalid_request(format!(
            "the claims parameter member '{}' must be an object",
            group
        ))),
    }
}
