//! Authorization request processing.
//!
//! Validates an [`AuthorizationParameter`] against the client registration
//! and decides where the user agent goes next: the login page, the consent
//! page, or back to the client with the issued artifacts.
//!
//! | response_type           | workflow           | callback parameters                    |
//! |-------------------------|--------------------|----------------------------------------|
//! | `code`                  | authorization code | `code`                                 |
//! | `token`, `id_token`     | implicit           | `access_token`, `id_token`             |
//! | `code` + any other      | hybrid             | `code` plus `access_token`, `id_token` |
//!
//! Implicit and hybrid requests must carry a `nonce`.

use std::sync::Arc;

use time::OffsetDateTime;

use crate::AuthResult;
use crate::error::AuthError;
use crate::grants::issuer::{IssueRequest, TokenIssuer};
use crate::jwt::payload::JwtPayload;
use crate::oauth::authorize::{AuthorizationParameter, Prompt, ResponseMode, build_redirect_url};
use crate::storage::{AuthorizationCodeStore, ClientStore, ConsentStore};
use crate::types::{AuthorizationCode, ClaimsPrincipal, Client, GrantType, ResponseType};

/// Where the authorization endpoint sends the user agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorizationOutcome {
    /// The end user must authenticate first.
    RedirectToLogin,
    /// The end user must approve the requested scopes or claims.
    RedirectToConsent,
    /// Return to the client.
    RedirectToCallback {
        redirect_uri: String,
        parameters: Vec<(String, String)>,
        response_mode: ResponseMode,
    },
}

impl AuthorizationOutcome {
    /// Returns the callback URL carrying the response parameters, `None`
    /// for login and consent.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRedirectUri` when the redirect URI is not absolute.
    pub fn callback_url(&self) -> AuthResult<Option<String>> {
        match self {
            Self::RedirectToCallback {
                redirect_uri,
                parameters,
                response_mode,
            } => build_redirect_url(redirect_uri, parameters, *response_mode)
                .map(Some)
                .map_err(|e| AuthError::invalid_redirect_uri(e.to_string())),
            _ => Ok(None),
        }
    }

    /// Returns the value of a callback parameter.
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&str> {
        match self {
            Self::RedirectToCallback { parameters, .. } => parameters
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.as_str()),
            _ => None,
        }
    }
}

/// Decides the outcome of authorization requests and issues codes and
/// implicit tokens.
pub struct AuthorizationProcessor {
    client_store: Arc<dyn ClientStore>,
    consent_store: Arc<dyn ConsentStore>,
    code_store: Arc<dyn AuthorizationCodeStore>,
    issuer: Arc<TokenIssuer>,
}

impl AuthorizationProcessor {
    #[must_use]
    pub fn new(
        client_store: Arc<dyn ClientStore>,
        consent_store: Arc<dyn ConsentStore>,
        code_store: Arc<dyn AuthorizationCodeStore>,
        issuer: Arc<TokenIssuer>,
    ) -> Self {
        Self {
            client_store,
            consent_store,
            code_store,
            issuer,
        }
    }

    /// Processes an authorization request for the authenticated `principal`,
    /// if any.
    ///
    /// `prompt=login` always yields [`AuthorizationOutcome::RedirectToLogin`];
    /// the login page resubmits the request without it.
    ///
    /// # Errors
    ///
    /// Every error carries the request `state`:
    ///
    /// - `InvalidClient` for an unknown client
    /// - `InvalidRedirectUri` for a missing or unregistered redirect URI
    /// - `UnsupportedResponseType` for a response type the client lacks
    /// - `InvalidRequest` for a missing nonce or PKCE challenge
    /// - `InvalidScope` for scopes the client is not allowed
    /// - `LoginRequired` / `InteractionRequired` for `prompt=none`
    /// - `InvalidGrant` when a requested claim does not satisfy its constraint
    pub async fn process(
        &self,
        params: &AuthorizationParameter,
        principal: Option<&ClaimsPrincipal>,
        issuer: &str,
    ) -> AuthResult<AuthorizationOutcome> {
        self.process_inner(params, principal, issuer)
            .await
            .map_err(|e| e.with_optional_state(params.state()))
    }

    async fn process_inner(
        &self,
        params: &AuthorizationParameter,
        principal: Option<&ClaimsPrincipal>,
        issuer: &str,
    ) -> AuthResult<AuthorizationOutcome> {
        // 1. Client
        let client = self
            .client_store
            .get_by_id(&params.client_id)
            .await?
            .ok_or_else(|| {
                tracing::debug!(client_id = %params.client_id, "Unknown client");
                AuthError::invalid_client("the client doesn't exist")
            })?;

        // 2. Redirect URI
        let redirect_uri = params
            .redirect_uri
            .as_deref()
            .filter(|uri| !uri.is_empty())
            .ok_or_else(|| AuthError::invalid_redirect_uri("the parameter redirect_uri is missing"))?;
        if !client.is_redirect_uri_allowed(redirect_uri) {
            tracing::warn!(client_id = %client.client_id, "Unregistered redirect_uri");
            return Err(AuthError::invalid_redirect_uri(format!(
                "the redirect_uri {redirect_uri} is not registered"
            )));
        }

        // 3. Response types and the grants they need
        validate_response_types(&client, params)?;

        // 4. Scopes
        let scopes = params.scopes();
        if let Some(scope) = scopes.iter().find(|s| !client.is_scope_allowed(s)) {
            return Err(AuthError::invalid_scope(format!(
                "the scope '{scope}' is not allowed for the client"
            )));
        }

        // 5. PKCE
        if client.require_pkce
            && params.has_response_type(ResponseType::Code)
            && params.code_challenge.as_deref().is_none_or(str::is_empty)
        {
            return Err(AuthError::invalid_request(format!(
                "the client {} requires PKCE",
                client.client_id
            )));
        }

        // 6. Session
        let principal = match principal.filter(|p| p.is_authenticated()) {
            Some(principal) if !params.has_prompt(Prompt::Login) => principal,
            _ if params.has_prompt(Prompt::None) => return Err(AuthError::LoginRequired),
            _ => return Ok(AuthorizationOutcome::RedirectToLogin),
        };

        // 7. Consent
        if params.has_prompt(Prompt::Consent) {
            return Ok(AuthorizationOutcome::RedirectToConsent);
        }
        if !self.has_consent(principal, params, &scopes).await? {
            if params.has_prompt(Prompt::None) {
                return Err(AuthError::interaction_required(
                    "the end user has not consented to the request",
                ));
            }
            return Ok(AuthorizationOutcome::RedirectToConsent);
        }

        // 8. Issue
        self.issue(&client, params, principal, scopes, redirect_uri, issuer)
            .await
    }

    async fn has_consent(
        &self,
        principal: &ClaimsPrincipal,
        params: &AuthorizationParameter,
        scopes: &[String],
    ) -> AuthResult<bool> {
        let Some(subject) = principal.subject() else {
            return Ok(false);
        };
        let claims = params.claims.claim_names();
        Ok(self
            .consent_store
            .get_consents(subject)
            .await?
            .iter()
            .any(|consent| consent.covers(&params.client_id, scopes, &claims)))
    }

    async fn issue(
        &self,
        client: &Client,
        params: &AuthorizationParameter,
        principal: &ClaimsPrincipal,
        scopes: Vec<String>,
        redirect_uri: &str,
        issuer: &str,
    ) -> AuthResult<AuthorizationOutcome> {
        let now = OffsetDateTime::now_utc();
        let (id_token_payload, user_info_payload) =
            self.payloads(params, principal, &scopes, issuer, now).await?;

        // Everything that can fail runs before the first write.
        let code = params.has_response_type(ResponseType::Code).then(|| AuthorizationCode {
            code: AuthorizationCode::generate_code(),
            client_id: client.client_id.clone(),
            redirect_uri: redirect_uri.to_string(),
            create_time: now,
            scopes: scopes.clone(),
            code_challenge: params.code_challenge.clone(),
            code_challenge_method: params.code_challenge_method,
            nonce: params.nonce.clone(),
            state: params.state.clone(),
            id_token_payload: id_token_payload.clone(),
            user_info_payload: Some(user_info_payload.clone()),
            claims: (!params.claims.is_empty()).then(|| params.claims.clone()),
        });
        let code_value = code.as_ref().map(|c| c.code.clone());

        let access_token = if params.has_response_type(ResponseType::Token) {
            let mut request = IssueRequest::new(client, GrantType::Implicit, scopes.clone());
            request.user_info_payload = Some(user_info_payload);
            Some(self.issuer.prepare(request).await?)
        } else {
            None
        };

        let id_token = match id_token_payload {
            Some(mut payload) if params.has_response_type(ResponseType::IdToken) => {
                let generator = self.issuer.generator();
                generator.update_payload_date(&mut payload, client, now);
                generator.fill_in_other_claims_identity_token_payload(
                    &mut payload,
                    code_value.as_deref(),
                    access_token.as_ref().map(|t| t.token().access_token.as_str()),
                    client,
                );
                Some(generator.sign_and_encrypt_id_token(&payload, client).await?)
            }
            _ => None,
        };

        let mut parameters: Vec<(String, String)> = Vec::new();

        if let Some(code) = code {
            self.code_store.add(code).await?;
        }
        if let Some(value) = code_value.as_ref() {
            parameters.push(("code".to_string(), value.clone()));
        }

        if let Some(prepared) = access_token {
            let token = match self.issuer.commit(prepared).await {
                Ok(token) => token,
                Err(err) => {
                    if let Some(value) = code_value.as_deref() {
                        self.code_store.remove(value).await?;
                    }
                    return Err(err);
                }
            };
            parameters.push(("access_token".to_string(), token.access_token));
            parameters.push(("token_type".to_string(), token.token_type));
            parameters.push(("expires_in".to_string(), token.expires_in.to_string()));
            parameters.push(("scope".to_string(), token.scope));
        }

        if let Some(id_token) = id_token {
            parameters.push(("id_token".to_string(), id_token));
        }

        if let Some(state) = params.state() {
            parameters.push(("state".to_string(), state.to_string()));
        }

        tracing::info!(
            client_id = %client.client_id,
            response_type = ?params.response_types,
            "Authorization granted"
        );

        Ok(AuthorizationOutcome::RedirectToCallback {
            redirect_uri: redirect_uri.to_string(),
            parameters,
            response_mode: params.effective_response_mode(),
        })
    }

    /// ID token payload (for `openid` requests) and user info payload,
    /// filtered by the `claims` parameter when present, by scope otherwise.
    async fn payloads(
        &self,
        params: &AuthorizationParameter,
        principal: &ClaimsPrincipal,
        scopes: &[String],
        issuer: &str,
        now: OffsetDateTime,
    ) -> AuthResult<(Option<JwtPayload>, JwtPayload)> {
        let generator = self.issuer.generator();

        let id_token_payload = if scopes.iter().any(|s| s == "openid") {
            let payload = if params.claims.id_token.is_empty() {
                generator
                    .generate_id_token_payload_for_scopes(principal, params, issuer, now)
                    .await?
            } else {
                generator
                    .generate_filtered_id_token_payload(
                        principal,
                        params,
                        &params.claims.id_token,
                        issuer,
                        now,
                    )
                    .await?
            };
            Some(payload)
        } else {
            None
        };

        let user_info_payload = if params.claims.userinfo.is_empty() {
            generator
                .generate_user_info_payload_for_scope(principal, params)
                .await?
        } else {
            generator.generate_filtered_user_info_payload(
                &params.claims.userinfo,
                principal,
                params,
            )?
        };

        Ok((id_token_payload, user_info_payload))
    }
}

fn validate_response_types(client: &Client, params: &AuthorizationParameter) -> AuthResult<()> {
    if params.response_types.is_empty() {
        return Err(AuthError::invalid_request("the parameter response_type is missing"));
    }
    if let Some(missing) = params
        .response_types
        .iter()
        .find(|r| !client.response_types.contains(r))
    {
        return Err(AuthError::unsupported_response_type(missing.as_str()));
    }

    let wants_code = params.has_response_type(ResponseType::Code);
    let wants_tokens = params.has_response_type(ResponseType::Token)
        || params.has_response_type(ResponseType::IdToken);

    if wants_code && !client.is_grant_type_allowed(GrantType::AuthorizationCode) {
        return Err(AuthError::invalid_request(format!(
            "the client {} doesn't support the grant type authorization_code",
            client.client_id
        )));
    }
    if wants_tokens && !wants_code && !client.is_grant_type_allowed(GrantType::Implicit) {
        return Err(AuthError::invalid_request(format!(
            "the client {} doesn't support the grant type implicit",
            client.client_id
        )));
    }
    if wants_tokens && params.nonce.as_deref().is_none_or(str::is_empty) {
        return Err(AuthError::invalid_request("the parameter nonce is missing"));
    }
    if params.has_response_type(ResponseType::IdToken) && !params.scopes().iter().any(|s| s == "openid") {
        return Err(AuthError::invalid_request(
            "the scope openid is required for the response type id_token",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    fn client() -> Client {
        let mut client = Client::new(
            "web",
            vec![GrantType::AuthorizationCode, GrantType::Implicit],
        );
        client.response_types = vec![ResponseType::Code, ResponseType::Token, ResponseType::IdToken];
        client.redirect_uris = vec!["https://web.example.com/cb".to_string()];
        client
    }

    fn params(response_types: Vec<ResponseType>) -> AuthorizationParameter {
        AuthorizationParameter {
            client_id: "web".to_string(),
            redirect_uri: Some("https://web.example.com/cb".to_string()),
            scope: "openid".to_string(),
            response_types,
            ..AuthorizationParameter::default()
        }
    }

    #[test]
    fn test_nonce_required_for_implicit_and_hybrid() {
        let client = client();
        assert!(validate_response_types(&client, &params(vec![ResponseType::Code])).is_ok());

        for types in [
            vec![ResponseType::IdToken],
            vec![ResponseType::Code, ResponseType::Token],
        ] {
            let err = validate_response_types(&client, &params(types.clone())).unwrap_err();
            assert_eq!(err.code(), ErrorCode::InvalidRequest);

            let mut with_nonce = params(types);
            with_nonce.nonce = Some("n-0S6".to_string());
            assert!(validate_response_types(&client, &with_nonce).is_ok());
        }
    }

    #[test]
    fn test_unregistered_response_type() {
        let mut client = client();
        client.response_types = vec![ResponseType::Code];
        let mut request = params(vec![ResponseType::Token]);
        request.nonce = Some("n".to_string());
        let err = validate_response_types(&client, &request).unwrap_err();
        assert_eq!(err.code(), ErrorCode::UnsupportedResponseType);
    }

    #[test]
    fn test_callback_parameter_lookup() {
        let outcome = AuthorizationOutcome::RedirectToCallback {
            redirect_uri: "https://web.example.com/cb".to_string(),
            parameters: vec![
                ("code".to_string(), "abc".to_string()),
                ("state".to_string(), "xyz".to_string()),
            ],
            response_mode: ResponseMode::Query,
        };
        assert_eq!(outcome.parameter("state"), Some("xyz"));
        assert_eq!(
            outcome.callback_url().unwrap().as_deref(),
            Some("https://web.example.com/cb?code=abc&state=xyz")
        );
        assert_eq!(AuthorizationOutcome::RedirectToLogin.callback_url().unwrap(), None);
    }
}
