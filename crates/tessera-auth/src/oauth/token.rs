//! Token endpoint request and response types.
//!
//! # Supported Grant Types
//!
//! - `authorization_code` - Exchange authorization code for tokens
//! - `refresh_token` - Refresh an access token
//! - `client_credentials` - Machine-to-machine authentication
//! - `password` - Resource owner password credentials
//! - `urn:ietf:params:oauth:grant-type:device_code` - Device flow polling
//! - `urn:ietf:params:oauth:grant-type:uma-ticket` - UMA requesting party token

use serde::{Deserialize, Serialize};

use crate::oauth::client_auth::ClientAuthParameters;
use crate::types::GrantedToken;

/// Token request parameters.
///
/// This structure handles all grant types. Different fields are required
/// depending on the `grant_type`:
///
/// - `authorization_code`: code, redirect_uri, code_verifier
/// - `refresh_token`: refresh_token
/// - `client_credentials`: (optional) scope
/// - `password`: username, password, (optional) scope
/// - device code: device_code
/// - UMA ticket: ticket, (optional) claim_token, claim_token_format
///
/// # Client Authentication
///
/// Clients authenticate using one of:
/// - HTTP Basic Auth header (not in this struct)
/// - `client_id` + `client_secret` in body
/// - `client_assertion_type` + `client_assertion` (JWT)
/// - `client_id` only (public clients)
/// - a TLS client certificate (not in this struct)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenRequest {
    /// OAuth 2.0 grant type.
    pub grant_type: String,

    #[serde(flatten)]
    pub client: ClientAuthParameters,

    #[serde(default)]
    pub code: Option<String>,

    #[serde(default)]
    pub redirect_uri: Option<String>,

    #[serde(default)]
    pub code_verifier: Option<String>,

    #[serde(default)]
    pub refresh_token: Option<String>,

    #[serde(default)]
    pub scope: Option<String>,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub password: Option<String>,

    /// Authentication method reference selecting the password authenticator.
    #[serde(default)]
    pub amr_values: Option<String>,

    #[serde(default)]
    pub device_code: Option<String>,

    /// UMA permission ticket.
    #[serde(default)]
    pub ticket: Option<String>,

    #[serde(default)]
    pub claim_token: Option<String>,

    #[serde(default)]
    pub claim_token_format: Option<String>,
}

/// Successful token response.
///
/// # Example Response
///
/// ```json
/// {
///   "access_token": "2YotnFZFEjr1zCsicMWpAA",
///   "token_type": "bearer",
///   "expires_in": 3600,
///   "scope": "openid profile",
///   "refresh_token": "tGzv3JOkF0XG5Qx2TlKWIA",
///   "id_token": "eyJhbG..."
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,

    pub token_type: String,

    /// Access token lifetime in seconds.
    pub expires_in: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// Granted scopes (space-separated).
    pub scope: String,
}

impl From<&GrantedToken> for TokenResponse {
    fn from(token: &GrantedToken) -> Self {
        Self {
            access_token: token.access_token.clone(),
            id_token: token.id_token.clone(),
            token_type: token.token_type.clone(),
            expires_in: token.expires_in,
            refresh_token: token.refresh_token.clone(),
            scope: token.scope.clone(),
        }
    }
}

impl From<GrantedToken> for TokenResponse {
    fn from(token: GrantedToken) -> Self {
        Self {
            access_token: token.access_token,
            id_token: token.id_token,
            token_type: token.token_type,
            expires_in: token.expires_in,
            refresh_token: token.refresh_token,
            scope: token.scope,
        }
    }
}
