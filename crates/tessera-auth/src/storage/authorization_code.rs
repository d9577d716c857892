//! Authorization code store trait.

use async_trait::async_trait;

use crate::AuthResult;
use crate::types::AuthorizationCode;

/// Persistence of authorization codes.
///
/// `remove` is the synchronization point for code redemption: of several
/// concurrent removals of the same code, exactly one may return `true`.
#[async_trait]
pub trait AuthorizationCodeStore: Send + Sync {
    /// Persists a code.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn add(&self, code: AuthorizationCode) -> AuthResult<()>;

    /// Finds a code.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn get(&self, code: &str) -> AuthResult<Option<AuthorizationCode>>;

    /// Removes a code. Returns `false` if it was already gone.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn remove(&self, code: &str) -> AuthResult<bool>;
}
