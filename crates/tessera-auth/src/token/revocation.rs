//! Token revocation (RFC 7009)
//!
//! Removes an access or refresh token after re-authenticating the client
//! that owns it.
//!
//! # Lookup
//!
//! The `token_type_hint` selects the index searched first; the other index
//! is searched when the hinted one has no match. A token owned by another
//! client is never removed.
//!
//! # References
//!
//! - [RFC 7009 - OAuth 2.0 Token Revocation](https://tools.ietf.org/html/rfc7009)

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::AuthResult;
use crate::error::AuthError;
use crate::oauth::client_auth::{
    AuthenticateInstruction, ClientAuthParameters, ClientAuthenticator, ClientCertificate,
};
use crate::storage::TokenStore;
use crate::types::{GrantedToken, hash_token};

/// Token revocation request per RFC 7009.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RevocationRequest {
    /// The token to revoke.
    pub token: String,

    /// Optional hint about the token type.
    #[serde(default)]
    pub token_type_hint: Option<TokenTypeHint>,

    #[serde(flatten)]
    pub client: ClientAuthParameters,
}

/// Token type hint for revocation and introspection requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenTypeHint {
    /// The token is an access token.
    AccessToken,
    /// The token is a refresh token.
    RefreshToken,
}

impl TokenTypeHint {
    /// Returns the token type hint as a string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AccessToken => "access_token",
            Self::RefreshToken => "refresh_token",
        }
    }
}

impl std::fmt::Display for TokenTypeHint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Finds a token by `value`, searching the hinted index first.
///
/// Returns the token and the index it was found in.
pub(crate) async fn find_token(
    store: &dyn TokenStore,
    value: &str,
    hint: Option<TokenTypeHint>,
) -> AuthResult<Option<(GrantedToken, TokenTypeHint)>> {
    let order = match hint {
        Some(TokenTypeHint::RefreshToken) => [TokenTypeHint::RefreshToken, TokenTypeHint::AccessToken],
        _ => [TokenTypeHint::AccessToken, TokenTypeHint::RefreshToken],
    };
    for kind in order {
        let found = match kind {
            TokenTypeHint::AccessToken => store.get_access_token(value).await?,
            TokenTypeHint::RefreshToken => store.get_refresh_token(value).await?,
        };
        if let Some(token) = found {
            return Ok(Some((token, kind)));
        }
    }
    Ok(None)
}

/// Revokes access and refresh tokens.
pub struct RevocationAction {
    authenticator: Arc<ClientAuthenticator>,
    token_store: Arc<dyn TokenStore>,
}

impl RevocationAction {
    #[must_use]
    pub fn new(authenticator: Arc<ClientAuthenticator>, token_store: Arc<dyn TokenStore>) -> Self {
        Self {
            authenticator,
            token_store,
        }
    }

    /// # Errors
    ///
    /// - `InvalidRequest` when the token is missing
    /// - `InvalidClient` for failed authentication or a token owned by
    ///   another client
    /// - `InvalidToken` for an unknown token
    /// - `RevokeFailed` when the store removed nothing
    pub async fn execute(
        &self,
        request: &RevocationRequest,
        authorization_header: Option<&str>,
        certificate: Option<&ClientCertificate>,
        issuer: &str,
    ) -> AuthResult<()> {
        if request.token.is_empty() {
            return Err(AuthError::invalid_request("the parameter token is missing"));
        }

        let instruction =
            AuthenticateInstruction::new(&request.client, authorization_header, certificate);
        let client = self.authenticator.authenticate(&instruction, issuer).await?.client;

        let (token, kind) = find_token(self.token_store.as_ref(), &request.token, request.token_type_hint)
            .await?
            .ok_or_else(|| {
                tracing::debug!(
                    client_id = %client.client_id,
                    token_hash = %hash_token(&request.token),
                    "Revocation of an unknown token"
                );
                AuthError::invalid_token("the token doesn't exist")
            })?;

        if token.client_id != client.client_id {
            tracing::warn!(
                client_id = %client.client_id,
                owner = %token.client_id,
                "Revocation attempted by another client"
            );
            return Err(AuthError::invalid_client(
                "the token has not been issued to the client",
            ));
        }

        let removed = match kind {
            TokenTypeHint::AccessToken => self.token_store.remove_access_token(&request.token).await?,
            TokenTypeHint::RefreshToken => self.token_store.remove_refresh_token(&request.token).await?,
        };
        if !removed {
            return Err(AuthError::revoke_failed("the token cannot be revoked"));
        }

        tracing::info!(client_id = %client.client_id, token_id = %token.id, kind = %kind, "Token revoked");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_revocation_request_deserialize() {
        let json = r#"{"token":"abc","token_type_hint":"refresh_token","client_id":"app"}"#;
        let request: RevocationRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.token, "abc");
        assert_eq!(request.token_type_hint, Some(TokenTypeHint::RefreshToken));
        assert_eq!(request.client.client_id.as_deref(), Some("app"));
    }

    #[test]
    fn test_token_type_hint_display() {
        assert_eq!(TokenTypeHint::AccessToken.to_string(), "access_token");
        assert_eq!(TokenTypeHint::RefreshToken.to_string(), "refresh_token");
    }
}
