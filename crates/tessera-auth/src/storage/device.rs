//! Device authorization store trait.

use async_trait::async_trait;

use crate::AuthResult;
use crate::types::DeviceAuthorizationData;

/// Persistence of device authorization polling records.
#[async_trait]
pub trait DeviceAuthorizationStore: Send + Sync {
    /// Finds the record of `device_code` issued to `client_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn get(
        &self,
        client_id: &str,
        device_code: &str,
    ) -> AuthResult<Option<DeviceAuthorizationData>>;

    /// Finds a record by the code shown to the end user.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn get_by_user_code(&self, user_code: &str)
    -> AuthResult<Option<DeviceAuthorizationData>>;

    /// Inserts or replaces a record, keyed by device code.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn save(&self, record: DeviceAuthorizationData) -> AuthResult<()>;
}
