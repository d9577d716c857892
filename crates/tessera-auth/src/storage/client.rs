//! Client store trait.
//!
//! Client registrations are created through dynamic registration elsewhere;
//! the token issuance core only reads them.

use async_trait::async_trait;

use crate::AuthResult;
use crate::types::Client;

// =============================================================================
// Client Store Trait
// =============================================================================

/// Read access to OAuth 2.0 client registrations.
///
/// # Example
///
/// ```ignore
/// use tessera_auth::storage::ClientStore;
///
/// async fn example(store: &impl ClientStore) -> tessera_auth::AuthResult<()> {
///     if let Some(client) = store.get_by_id("my-app").await? {
///         println!("Found client: {}", client.client_name);
///     }
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait ClientStore: Send + Sync {
    /// Finds a client by its client_id.
    ///
    /// Returns `None` if the client doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn get_by_id(&self, client_id: &str) -> AuthResult<Option<Client>>;

    /// Returns every registered client.
    ///
    /// Used to compute ID token audiences.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn get_all(&self) -> AuthResult<Vec<Client>>;
}
