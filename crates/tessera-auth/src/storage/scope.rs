//! Scope store trait.

use async_trait::async_trait;

use crate::AuthResult;
use crate::types::Scope;

/// Read access to scope definitions.
#[async_trait]
pub trait ScopeStore: Send + Sync {
    /// Returns the scopes whose names are in `names`. Unknown names are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn search_by_names(&self, names: &[String]) -> AuthResult<Vec<Scope>>;
}
