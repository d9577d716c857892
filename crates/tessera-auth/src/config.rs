//! Token issuance configuration.
//!
//! This module provides the configuration types for the auth core: protocol
//! lifetimes, signing defaults, device flow settings, UMA defaults, remote
//! JWKS fetching and the default scope-to-claims table.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::jwt::keys::SigningAlgorithm;

/// Root configuration of the token issuance core.
///
/// # Example (TOML)
///
/// ```toml
/// issuer = "https://auth.example.com"
///
/// [oauth]
/// authorization_code_lifetime = "10m"
/// default_token_lifetime = "1h"
///
/// [device]
/// verification_uri = "https://auth.example.com/device"
/// interval = "5s"
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Issuer name placed in the `iss` claim and accepted as assertion audience.
    pub issuer: String,

    /// OAuth 2.0 lifetimes.
    pub oauth: OAuthConfig,

    /// Token signing configuration.
    pub signing: SigningConfig,

    /// Device authorization grant configuration.
    pub device: DeviceConfig,

    /// UMA configuration.
    pub uma: UmaConfig,

    /// Remote JWKS fetching configuration.
    pub jwks: JwksFetchConfig,

    /// Default scope-to-claims table.
    pub claims: ClaimsConfig,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            issuer: "http://localhost:5000".to_string(),
            oauth: OAuthConfig::default(),
            signing: SigningConfig::default(),
            device: DeviceConfig::default(),
            uma: UmaConfig::default(),
            jwks: JwksFetchConfig::default(),
            claims: ClaimsConfig::default(),
        }
    }
}

/// OAuth 2.0 configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OAuthConfig {
    /// Authorization code validity period.
    #[serde(with = "humantime_serde")]
    pub authorization_code_lifetime: Duration,

    /// Token lifetime used when the client does not register one.
    #[serde(with = "humantime_serde")]
    pub default_token_lifetime: Duration,
}

impl Default for OAuthConfig {
    fn default() -> Self {
        Self {
            authorization_code_lifetime: Duration::from_secs(600), // 10 minutes
            default_token_lifetime: Duration::from_secs(3600),     // 1 hour
        }
    }
}

/// Token signing configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SigningConfig {
    /// Algorithm used when a client registers no preference.
    pub default_algorithm: SigningAlgorithm,

    /// Asymmetric algorithms the in-memory key store generates keys for.
    pub algorithms: Vec<SigningAlgorithm>,

    /// Generate an RSA encryption key for JWE decryption.
    pub encryption_enabled: bool,
}

impl Default for SigningConfig {
    fn default() -> Self {
        Self {
            default_algorithm: SigningAlgorithm::RS256,
            algorithms: vec![SigningAlgorithm::RS256],
            encryption_enabled: true,
        }
    }
}

/// Device authorization grant configuration (RFC 8628).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Page where the end user enters the user code.
    pub verification_uri: String,

    /// Minimum polling interval announced to devices.
    #[serde(with = "humantime_serde")]
    pub interval: Duration,

    /// Lifetime of a device code.
    #[serde(with = "humantime_serde")]
    pub lifetime: Duration,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            verification_uri: "http://localhost:5000/device".to_string(),
            interval: Duration::from_secs(5),
            lifetime: Duration::from_secs(1800), // 30 minutes
        }
    }
}

/// UMA 2.0 configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UmaConfig {
    /// OpenID provider returned in `need_info` redirect hints when a rule
    /// names none.
    pub default_openid_provider: Option<String>,

    /// Default RPT lifetime.
    #[serde(with = "humantime_serde")]
    pub rpt_lifetime: Duration,
}

impl Default for UmaConfig {
    fn default() -> Self {
        Self {
            default_openid_provider: None,
            rpt_lifetime: Duration::from_secs(3600),
        }
    }
}

/// Remote JWKS fetching configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct JwksFetchConfig {
    /// How long a fetched key set stays cached.
    #[serde(with = "humantime_serde")]
    pub cache_ttl: Duration,

    /// HTTP request timeout.
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,

    /// Maximum accepted response size in bytes.
    pub max_response_size: usize,
}

impl Default for JwksFetchConfig {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(3600),
            request_timeout: Duration::from_secs(10),
            max_response_size: 1024 * 1024, // 1 MB
        }
    }
}

/// A scope and the claims it releases.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ScopeClaims {
    /// Scope name.
    pub name: String,

    /// Claim names released by the scope.
    #[serde(default)]
    pub claims: Vec<String>,

    /// Whether this is an OpenID Connect scope.
    #[serde(default)]
    pub is_openid_scope: bool,

    /// Whether the scope is advertised in discovery.
    #[serde(default = "default_true")]
    pub is_exposed: bool,
}

fn default_true() -> bool {
    true
}

/// Default scope table used to seed an empty scope store.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClaimsConfig {
    /// Scope definitions.
    pub scopes: Vec<ScopeClaims>,
}

impl Default for ClaimsConfig {
    fn default() -> Self {
        fn scope(name: &str, claims: &[&str]) -> ScopeClaims {
            ScopeClaims {
                name: name.to_string(),
                claims: claims.iter().map(|c| (*c).to_string()).collect(),
                is_openid_scope: true,
                is_exposed: true,
            }
        }

        Self {
            scopes: vec![
                scope("openid", &["sub"]),
                scope(
                    "profile",
                    &[
                        "name",
                        "family_name",
                        "given_name",
                        "middle_name",
                        "nickname",
                        "preferred_username",
                        "profile",
                        "picture",
                        "website",
                        "gender",
                        "birthdate",
                        "zoneinfo",
                        "locale",
                        "updated_at",
                    ],
                ),
                scope("email", &["email", "email_verified"]),
                scope("address", &["address"]),
                scope("phone", &["phone_number", "phone_number_verified"]),
                scope("role", &["role"]),
                scope("offline_access", &[]),
            ],
        }
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// An invalid configuration value was provided.
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),

    /// A required configuration value is missing.
    #[error("Missing required configuration: {0}")]
    Missing(String),

    /// The configuration document could not be parsed.
    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

impl AuthConfig {
    /// Parses and validates a TOML configuration document.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` for malformed TOML and any error
    /// reported by [`AuthConfig::validate`].
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(source).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if the issuer or the verification URI
    /// is empty, and `ConfigError::InvalidValue` if:
    /// - a lifetime or the polling interval is zero
    /// - the default algorithm is `none` or not covered by the key store
    /// - a default scope has an empty name
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.issuer.is_empty() {
            return Err(ConfigError::Missing("issuer".to_string()));
        }

        if self.oauth.authorization_code_lifetime.is_zero() {
            return Err(ConfigError::InvalidValue(
                "oauth.authorization_code_lifetime must be > 0".to_string(),
            ));
        }

        if self.oauth.default_token_lifetime.is_zero() {
            return Err(ConfigError::InvalidValue(
                "oauth.default_token_lifetime must be > 0".to_string(),
            ));
        }

        // Symmetric defaults sign with the client secret, everything else
        // needs a key in the store.
        let default_alg = self.signing.default_algorithm;
        if default_alg == SigningAlgorithm::None {
            return Err(ConfigError::InvalidValue(
                "signing.default_algorithm cannot be 'none'".to_string(),
            ));
        }
        if !default_alg.is_symmetric() && !self.signing.algorithms.contains(&default_alg) {
            return Err(ConfigError::InvalidValue(format!(
                "signing.default_algorithm '{}' is not listed in signing.algorithms",
                default_alg
            )));
        }
        for alg in &self.signing.algorithms {
            if alg.is_symmetric() || *alg == SigningAlgorithm::None {
                return Err(ConfigError::InvalidValue(format!(
                    "signing.algorithms cannot contain '{}'",
                    alg
                )));
            }
        }

        if self.device.verification_uri.is_empty() {
            return Err(ConfigError::Missing("device.verification_uri".to_string()));
        }
        if self.device.interval.is_zero() {
            return Err(ConfigError::InvalidValue(
                "device.interval must be > 0".to_string(),
            ));
        }
        if self.device.lifetime <= self.device.interval {
            return Err(ConfigError::InvalidValue(
                "device.lifetime must be greater than device.interval".to_string(),
            ));
        }

        if self.jwks.request_timeout.is_zero() {
            return Err(ConfigError::InvalidValue(
                "jwks.request_timeout must be > 0".to_string(),
            ));
        }

        if self.claims.scopes.iter().any(|s| s.name.is_empty()) {
            return Err(ConfigError::InvalidValue(
                "claims.scopes contains a scope without a name".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validates() {
        let config = AuthConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_issuer_fails_validation() {
        let mut config = AuthConfig::default();
        config.issuer = String::new();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Missing(_)));
    }

    #[test]
    fn test_none_algorithm_fails_validation() {
        let mut config = AuthConfig::default();
        config.signing.default_algorithm = SigningAlgorithm::None;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(_)));
    }

    #[test]
    fn test_default_algorithm_must_have_key() {
        let mut config = AuthConfig::default();
        config.signing.default_algorithm = SigningAlgorithm::ES384;
        assert!(config.validate().is_err());

        config.signing.algorithms.push(SigningAlgorithm::ES384);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_symmetric_default_needs_no_key() {
        let mut config = AuthConfig::default();
        config.signing.default_algorithm = SigningAlgorithm::HS256;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_interval_fails_validation() {
        let mut config = AuthConfig::default();
        config.device.interval = Duration::ZERO;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_default_claims_table() {
        let config = ClaimsConfig::default();
        let profile = config
            .scopes
            .iter()
            .find(|s| s.name == "profile")
            .unwrap();
        assert!(profile.claims.contains(&"given_name".to_string()));
        assert!(config.scopes.iter().any(|s| s.name == "offline_access"));
    }

    #[test]
    fn test_from_toml_str() {
        let config = AuthConfig::from_toml_str(
            r#"
            issuer = "https://auth.example.com"

            [oauth]
            authorization_code_lifetime = "5m"

            [device]
            interval = "10s"

            [[claims.scopes]]
            name = "api1"
            "#,
        )
        .unwrap();

        assert_eq!(config.issuer, "https://auth.example.com");
        assert_eq!(
            config.oauth.authorization_code_lifetime,
            Duration::from_secs(300)
        );
        assert_eq!(config.oauth.default_token_lifetime, Duration::from_secs(3600));
        assert_eq!(config.device.interval, Duration::from_secs(10));
        assert_eq!(config.claims.scopes.len(), 1);
        assert!(config.claims.scopes[0].is_exposed);
    }

    #[test]
    fn test_from_toml_str_rejects_garbage() {
        let err = AuthConfig::from_toml_str("issuer = [").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::InvalidValue("test error".to_string());
        assert_eq!(err.to_string(), "Invalid configuration value: test error");

        let err = ConfigError::Missing("required_field".to_string());
        assert_eq!(
            err.to_string(),
            "Missing required configuration: required_field"
        );
    }
}
