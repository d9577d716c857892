//! Device authorization grant records (RFC 8628).

use std::time::Duration;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Response of the device authorization endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceAuthorizationResponse {
    /// Device verification code.
    pub device_code: String,

    /// End-user verification code.
    pub user_code: String,

    /// Verification page.
    pub verification_uri: String,

    /// Verification page with the user code pre-filled.
    pub verification_uri_complete: String,

    /// Lifetime of the codes in seconds.
    pub expires_in: u64,

    /// Minimum polling interval in seconds.
    pub interval: u64,
}

/// Polling record of a pending device authorization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceAuthorizationData {
    /// Device verification code.
    pub device_code: String,

    /// End-user verification code.
    pub user_code: String,

    /// Client that started the flow.
    pub client_id: String,

    /// Requested scopes.
    pub scopes: Vec<String>,

    /// Minimum polling interval in seconds.
    pub interval: u64,

    /// Absolute expiry.
    #[serde(with = "time::serde::rfc3339")]
    pub expires: OffsetDateTime,

    /// Last time the device polled.
    #[serde(with = "time::serde::rfc3339")]
    pub last_polled: OffsetDateTime,

    /// Whether the end user approved the request.
    pub is_confirmed: bool,

    /// Subject of the approving end user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,

    /// Payload returned by the device authorization endpoint.
    pub response: DeviceAuthorizationResponse,
}

impl DeviceAuthorizationData {
    /// Returns `true` once `now` is past the absolute expiry.
    #[must_use]
    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        now > self.expires
    }

    /// Returns `true` if `now` is before `last_polled + interval`.
    #[must_use]
    pub fn is_polling_too_fast(&self, now: OffsetDateTime) -> bool {
        now < self.last_polled + Duration::from_secs(self.interval)
    }
}
