//! OpenID Connect user info endpoint.
//!
//! Returns the user info payload captured when the access token was issued,
//! as plain JSON or as a JWT when the client registered a signing or
//! encryption preference.

use std::sync::Arc;

use time::OffsetDateTime;

use crate::AuthResult;
use crate::error::AuthError;
use crate::jwt::JwtGenerator;
use crate::jwt::payload::JwtPayload;
use crate::storage::{ClientStore, TokenStore};

/// Body of a user info response.
#[derive(Debug, Clone, PartialEq)]
pub enum UserInfoResponse {
    /// `application/json`
    Json(JwtPayload),
    /// `application/jwt`
    Jwt(String),
}

impl UserInfoResponse {
    /// Returns the HTTP content type of the body.
    #[must_use]
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Json(_) => "application/json",
            Self::Jwt(_) => "application/jwt",
        }
    }
}

/// Extracts the token of an `Authorization: Bearer` header.
#[must_use]
pub fn bearer_token(header_value: &str) -> Option<&str> {
    let (scheme, token) = header_value.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

pub struct UserInfoAction {
    client_store: Arc<dyn ClientStore>,
    token_store: Arc<dyn TokenStore>,
    generator: Arc<JwtGenerator>,
}

impl UserInfoAction {
    #[must_use]
    pub fn new(
        client_store: Arc<dyn ClientStore>,
        token_store: Arc<dyn TokenStore>,
        generator: Arc<JwtGenerator>,
    ) -> Self {
        Self {
            client_store,
            token_store,
            generator,
        }
    }

    /// # Errors
    ///
    /// `InvalidToken` for an unknown or expired access token, or one issued
    /// without a resource owner.
    pub async fn execute(&self, access_token: &str) -> AuthResult<UserInfoResponse> {
        let token = self
            .token_store
            .get_access_token(access_token)
            .await?
            .filter(|t| !t.is_expired(OffsetDateTime::now_utc()))
            .ok_or_else(|| AuthError::invalid_token("the access token is not valid"))?;

        let payload = token
            .user_info_payload
            .ok_or_else(|| AuthError::invalid_token("the access token has no resource owner"))?;

        let client = self
            .client_store
            .get_by_id(&token.client_id)
            .await?
            .ok_or_else(|| AuthError::invalid_token("the client of the access token doesn't exist"))?;

        match self.generator.sign_and_encrypt_user_info(&payload, &client).await? {
            Some(jwt) => Ok(UserInfoResponse::Jwt(jwt)),
            None => Ok(UserInfoResponse::Json(payload)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(bearer_token("bearer  abc "), Some("abc"));
        assert_eq!(bearer_token("Basic abc"), None);
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token("Bearer"), None);
    }

    #[test]
    fn test_content_type() {
        assert_eq!(UserInfoResponse::Jwt("x".into()).content_type(), "application/jwt");
        assert_eq!(
            UserInfoResponse::Json(JwtPayload::new()).content_type(),
            "application/json"
        );
    }
}
