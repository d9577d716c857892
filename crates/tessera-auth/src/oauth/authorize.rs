//! Authorization endpoint types.
//!
//! This module provides the request and parameter types of the OAuth 2.0 /
//! OpenID Connect authorization endpoint and the redirect URL builder used
//! to return results to the client.
//!
//! # Workflows
//!
//! The requested `response_type` selects the workflow:
//!
//! - `code` - authorization code flow
//! - `token`, `id_token`, `id_token token` - implicit flow (requires `nonce`)
//! - `code id_token`, `code token`, `code id_token token` - hybrid flow
//!   (requires `nonce`)

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::AuthResult;
use crate::error::AuthError;
use crate::jwt::claims::ClaimsParameter;
use crate::oauth::pkce::PkceChallengeMethod;
use crate::types::{ResponseType, parse_scopes};

/// Authorization request as received on the endpoint (query or form).
///
/// # Example
///
/// ```ignore
/// GET /authorize?
///   response_type=code
///   &client_id=my-app
///   &redirect_uri=https://app.example.com/callback
///   &scope=openid profile
///   &state=abc123xyz
///   &code_challenge=E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM
///   &code_challenge_method=S256
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthorizationRequest {
    /// Space-separated response types.
    pub response_type: String,

    /// Client identifier issued during registration.
    pub client_id: String,

    /// Redirect URI where the response will be sent.
    #[serde(default)]
    pub redirect_uri: Option<String>,

    /// Requested scopes (space-separated).
    #[serde(default)]
    pub scope: Option<String>,

    /// Opaque value echoed back to the client.
    #[serde(default)]
    pub state: Option<String>,

    /// OpenID Connect nonce.
    #[serde(default)]
    pub nonce: Option<String>,

    /// Space-separated prompt values.
    #[serde(default)]
    pub prompt: Option<String>,

    /// JSON `claims` request parameter.
    #[serde(default)]
    pub claims: Option<String>,

    /// PKCE code challenge.
    #[serde(default)]
    pub code_challenge: Option<String>,

    /// PKCE code challenge method.
    #[serde(default)]
    pub code_challenge_method: Option<String>,

    /// Requested response mode.
    #[serde(default)]
    pub response_mode: Option<String>,

    /// Maximum authentication age in seconds.
    #[serde(default)]
    pub max_age: Option<u64>,

    /// Requested authentication context class references.
    #[serde(default)]
    pub acr_values: Option<String>,

    /// Login hint.
    #[serde(default)]
    pub login_hint: Option<String>,
}

impl AuthorizationRequest {
    /// Parses the raw request into a typed [`AuthorizationParameter`].
    ///
    /// # Errors
    ///
    /// Returns `InvalidRequest` (carrying `state`) for malformed values and
    /// `UnsupportedResponseType` for unknown response types.
    pub fn into_parameter(self) -> AuthResult<AuthorizationParameter> {
        let state = self.state.clone();
        self.parse()
            .map_err(|e| e.with_optional_state(state.as_deref()))
    }

    fn parse(self) -> AuthResult<AuthorizationParameter> {
        if self.client_id.is_empty() {
            return Err(AuthError::invalid_request("the parameter client_id is missing"));
        }
        if self.response_type.trim().is_empty() {
            return Err(AuthError::invalid_request(
                "the parameter response_type is missing",
            ));
        }

        let response_types = ResponseType::parse_list(&self.response_type)?;
        let prompts = match self.prompt.as_deref() {
            Some(prompt) => Prompt::parse_list(prompt)?,
            None => Vec::new(),
        };
        let claims = match self.claims.as_deref() {
            Some(claims) if !claims.trim().is_empty() => ClaimsParameter::parse(claims)?,
            _ => ClaimsParameter::default(),
        };
        let code_challenge_method = self
            .code_challenge_method
            .as_deref()
            .map(PkceChallengeMethod::parse)
            .transpose()?;
        let response_mode = self
            .response_mode
            .as_deref()
            .map(str::parse::<ResponseMode>)
            .transpose()?;

        Ok(AuthorizationParameter {
            client_id: self.client_id,
            redirect_uri: self.redirect_uri,
            scope: self.scope.unwrap_or_default(),
            response_types,
            state: self.state,
            nonce: self.nonce,
            prompts,
            claims,
            code_challenge: self.code_challenge,
            code_challenge_method,
            response_mode,
            max_age: self.max_age,
            acr_values: self.acr_values,
            login_hint: self.login_hint,
        })
    }
}

/// Typed authorization request.
///
/// Consumed by the authorization request processor and carried into the
/// claims generator.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthorizationParameter {
    /// Requesting client.
    pub client_id: String,
    /// Redirect URI.
    pub redirect_uri: Option<String>,
    /// Space-separated scopes.
    pub scope: String,
    /// Requested response types.
    pub response_types: Vec<ResponseType>,
    /// Request state.
    pub state: Option<String>,
    /// OpenID Connect nonce.
    pub nonce: Option<String>,
    /// Prompt values.
    pub prompts: Vec<Prompt>,
    /// Requested claims.
    pub claims: ClaimsParameter,
    /// PKCE code challenge.
    pub code_challenge: Option<String>,
    /// PKCE code challenge method.
    pub code_challenge_method: Option<PkceChallengeMethod>,
    /// Requested response mode.
    pub response_mode: Option<ResponseMode>,
    /// Maximum authentication age in seconds.
    pub max_age: Option<u64>,
    /// Requested ACR values.
    pub acr_values: Option<String>,
    /// Login hint.
    pub login_hint: Option<String>,
}

impl AuthorizationParameter {
    /// Returns the requested scopes.
    #[must_use]
    pub fn scopes(&self) -> Vec<String> {
        parse_scopes(&self.scope)
    }

    /// Returns `true` if the response type was requested.
    #[must_use]
    pub fn has_response_type(&self, response_type: ResponseType) -> bool {
        self.response_types.contains(&response_type)
    }

    /// Returns `true` if the prompt value was requested.
    #[must_use]
    pub fn has_prompt(&self, prompt: Prompt) -> bool {
        self.prompts.contains(&prompt)
    }

    /// Returns the response mode to use: the requested one, otherwise
    /// `query` for the pure code flow and `fragment` for everything else.
    #[must_use]
    pub fn effective_response_mode(&self) -> ResponseMode {
        self.response_mode.unwrap_or({
            if self.response_types == [ResponseType::Code] {
                ResponseMode::Query
            } else {
                ResponseMode::Fragment
            }
        })
    }

    /// Returns the `state` as a string slice.
    #[must_use]
    pub fn state(&self) -> Option<&str> {
        self.state.as_deref()
    }
}

/// OpenID Connect `prompt` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Prompt {
    /// No user interaction is allowed.
    None,
    /// Force re-authentication.
    Login,
    /// Force the consent screen.
    Consent,
    /// Let the user pick an account.
    SelectAccount,
}

impl Prompt {
    /// Returns the wire value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Login => "login",
            Self::Consent => "consent",
            Self::SelectAccount => "select_account",
        }
    }

    /// Parses a space-separated prompt list.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRequest` for unknown values or when `none` is combined
    /// with another value.
    pub fn parse_list(value: &str) -> AuthResult<Vec<Self>> {
        let mut prompts = Vec::new();
        for item in value.split_whitespace() {
            let prompt = item.parse::<Self>()?;
            if !prompts.contains(&prompt) {
                prompts.push(prompt);
            }
        }
        if prompts.contains(&Self::None) && prompts.len() > 1 {
            return Err(AuthError::invalid_request(
                "prompt none cannot be combined with other values",
            ));
        }
        Ok(prompts)
    }
}

impl FromStr for Prompt {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::None),
            "login" => Ok(Self::Login),
            "consent" => Ok(Self::Consent),
            "select_account" => Ok(Self::SelectAccount),
            other => Err(AuthError::invalid_request(format!(
                "the prompt '{}' is not supported",
                other
            ))),
        }
    }
}

impl fmt::Display for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How authorization response parameters reach the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseMode {
    /// Query string of the redirect URI.
    Query,
    /// Fragment of the redirect URI.
    Fragment,
    /// Auto-submitted HTML form.
    FormPost,
}

impl ResponseMode {
    /// Returns the wire value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Fragment => "fragment",
            Self::FormPost => "form_post",
        }
    }
}

impl FromStr for ResponseMode {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "query" => Ok(Self::Query),
            "fragment" => Ok(Self::Fragment),
            "form_post" => Ok(Self::FormPost),
            other => Err(AuthError::invalid_request(format!(
                "the response mode '{}' is not supported",
                other
            ))),
        }
    }
}

/// Builds the redirect URL carrying `parameters`.
///
/// `form_post` has no URL representation; parameters are appended to the
/// query so the boundary layer can still render them.
///
/// # Errors
///
/// Returns an error if the redirect URI is not a valid absolute URL.
pub fn build_redirect_url(
    redirect_uri: &str,
    parameters: &[(String, String)],
    mode: ResponseMode,
) -> Result<String, url::ParseError> {
    let mut url = url::Url::parse(redirect_uri)?;
    match mode {
        ResponseMode::Query | ResponseMode::FormPost => {
            let mut pairs = url.query_pairs_mut();
            for (name, value) in parameters {
                pairs.append_pair(name, value);
            }
        }
        ResponseMode::Fragment => {
            let fragment = url::form_urlencoded::Serializer::new(String::new())
                .extend_pairs(parameters.iter().map(|(k, v)| (k.as_str(), v.as_str())))
                .finish();
            url.set_fragment(Some(&fragment));
        }
    }
    Ok(url.to_string())
}
