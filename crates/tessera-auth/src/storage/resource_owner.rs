//! Resource owner store trait.

use async_trait::async_trait;

use crate::AuthResult;
use crate::types::ResourceOwner;

/// Read access to resource owners.
#[async_trait]
pub trait ResourceOwnerStore: Send + Sync {
    /// Finds a resource owner by subject.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn get_by_id(&self, id: &str) -> AuthResult<Option<ResourceOwner>>;

    /// Finds the resource owner whose login and password match.
    ///
    /// Returns `None` when the login is unknown or the password is wrong.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn get_by_credentials(
        &self,
        login: &str,
        password: &str,
    ) -> AuthResult<Option<ResourceOwner>>;
}
