//! Granted token store trait.
//!
//! The token store is the only collaborator with transactional duties: it must
//! make removal atomic so a token can be revoked or rotated exactly once.

use async_trait::async_trait;

use crate::AuthResult;
use crate::jwt::payload::JwtPayload;
use crate::types::GrantedToken;

/// Persistence of granted tokens.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Finds an unexpired token issued to `client_id` for exactly `scopes`
    /// whose payload snapshots match the given ones.
    ///
    /// Time-dependent claims (`iat`, `exp`, `auth_time`, `at_hash`,
    /// `c_hash`) are ignored when comparing payloads.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn get_valid_granted_token(
        &self,
        scopes: &str,
        client_id: &str,
        id_token_payload: Option<&JwtPayload>,
        user_info_payload: Option<&JwtPayload>,
    ) -> AuthResult<Option<GrantedToken>>;

    /// Persists a newly minted token.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn add_token(&self, token: GrantedToken) -> AuthResult<()>;

    /// Finds a token by its access token.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn get_access_token(&self, access_token: &str) -> AuthResult<Option<GrantedToken>>;

    /// Finds a token by its refresh token.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn get_refresh_token(&self, refresh_token: &str) -> AuthResult<Option<GrantedToken>>;

    /// Removes the token holding `access_token`.
    ///
    /// Returns `false` if nothing was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn remove_access_token(&self, access_token: &str) -> AuthResult<bool>;

    /// Removes the token holding `refresh_token`.
    ///
    /// Returns `false` if nothing was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn remove_refresh_token(&self, refresh_token: &str) -> AuthResult<bool>;
}
