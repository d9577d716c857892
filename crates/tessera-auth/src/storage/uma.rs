//! UMA resource set and ticket store traits.

use async_trait::async_trait;

use crate::AuthResult;
use crate::types::{ResourceSet, Ticket};

/// Read access to registered resource sets.
#[async_trait]
pub trait ResourceSetStore: Send + Sync {
    /// Returns the resource sets with the given ids. Unknown ids are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn get(&self, ids: &[String]) -> AuthResult<Vec<ResourceSet>>;
}

/// Persistence of permission tickets.
#[async_trait]
pub trait TicketStore: Send + Sync {
    /// Finds a ticket.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn get(&self, id: &str) -> AuthResult<Option<Ticket>>;

    /// Persists a ticket.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn add(&self, ticket: Ticket) -> AuthResult<()>;

    /// Removes a ticket. Returns `false` if it was already gone.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn remove(&self, id: &str) -> AuthResult<bool>;
}
