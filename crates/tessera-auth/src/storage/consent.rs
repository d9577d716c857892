//! Consent store trait.
//!
//! Consents let the authorization processor skip the consent screen on
//! repeat authorizations for the same client and scopes.

use async_trait::async_trait;

use crate::AuthResult;
use crate::types::Consent;

/// Read access to consents given by resource owners.
#[async_trait]
pub trait ConsentStore: Send + Sync {
    /// Returns every consent recorded for `subject`.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn get_consents(&self, subject: &str) -> AuthResult<Vec<Consent>>;
}
