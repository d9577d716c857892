//! Device authorization endpoint (RFC 8628 section 3.1).
//!
//! Starts a device flow: authenticates the device's client, generates the
//! device and user codes and stores the polling record read later by the
//! device code grant. [`DeviceAuthorizationAction::confirm`] records the end
//! user's approval.

use std::sync::Arc;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::Rng;
use serde::Deserialize;
use time::OffsetDateTime;

use crate::AuthResult;
use crate::config::DeviceConfig;
use crate::error::AuthError;
use crate::grants::{authenticate_for_grant, resolve_scopes};
use crate::oauth::client_auth::{ClientAuthParameters, ClientAuthenticator, ClientCertificate};
use crate::storage::DeviceAuthorizationStore;
use crate::types::{DeviceAuthorizationData, DeviceAuthorizationResponse, GrantType};

/// Consonants only, so user codes never spell words or mix up 0/O and 1/I.
const USER_CODE_ALPHABET: &[u8] = b"BCDFGHJKLMNPQRSTVWXZ";
const USER_CODE_LENGTH: usize = 8;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeviceAuthorizationRequest {
    #[serde(flatten)]
    pub client: ClientAuthParameters,
    #[serde(default)]
    pub scope: Option<String>,
}

pub struct DeviceAuthorizationAction {
    authenticator: Arc<ClientAuthenticator>,
    device_store: Arc<dyn DeviceAuthorizationStore>,
    verification_uri: String,
    interval: Duration,
    lifetime: Duration,
}

impl DeviceAuthorizationAction {
    #[must_use]
    pub fn new(
        authenticator: Arc<ClientAuthenticator>,
        device_store: Arc<dyn DeviceAuthorizationStore>,
        config: &DeviceConfig,
    ) -> Self {
        Self {
            authenticator,
            device_store,
            verification_uri: config.verification_uri.clone(),
            interval: config.interval,
            lifetime: config.lifetime,
        }
    }

    /// Starts a device flow for the requesting client.
    ///
    /// # Errors
    ///
    /// - `InvalidClient` for failed client authentication
    /// - `InvalidGrant` when the client may not use the device code grant
    /// - `InvalidScope` for scopes the client is not allowed
    pub async fn execute(
        &self,
        request: &DeviceAuthorizationRequest,
        authorization_header: Option<&str>,
        certificate: Option<&ClientCertificate>,
        issuer: &str,
    ) -> AuthResult<DeviceAuthorizationResponse> {
        let client = authenticate_for_grant(
            &self.authenticator,
            &request.client,
            authorization_header,
            certificate,
            issuer,
            GrantType::DeviceCode,
        )
        .await?;
        let scopes = resolve_scopes(request.scope.as_deref(), &client)?;

        let now = OffsetDateTime::now_utc();
        let device_code = generate_device_code();
        let user_code = generate_user_code();
        let verification_uri_complete = verification_uri_complete(&self.verification_uri, &user_code)?;

        let response = DeviceAuthorizationResponse {
            device_code: device_code.clone(),
            user_code: user_code.clone(),
            verification_uri: self.verification_uri.clone(),
            verification_uri_complete,
            expires_in: self.lifetime.as_secs(),
            interval: self.interval.as_secs(),
        };

        self.device_store
            .save(DeviceAuthorizationData {
                device_code,
                user_code,
                client_id: client.client_id.clone(),
                scopes,
                interval: self.interval.as_secs(),
                expires: now + self.lifetime,
                // The first poll may come right away.
                last_polled: now - self.interval,
                is_confirmed: false,
                subject: None,
                response: response.clone(),
            })
            .await?;

        tracing::info!(client_id = %client.client_id, "Device authorization started");
        Ok(response)
    }

    /// Records the approval of the end user `subject` for `user_code`.
    ///
    /// # Errors
    ///
    /// - `InvalidGrant` for an unknown or already approved user code
    /// - `ExpiredToken` past the device code lifetime
    pub async fn confirm(&self, user_code: &str, subject: &str) -> AuthResult<()> {
        let normalized = normalize_user_code(user_code);
        let mut record = self
            .device_store
            .get_by_user_code(&normalized)
            .await?
            .ok_or_else(|| AuthError::invalid_grant("the user code is not valid"))?;

        if record.is_expired(OffsetDateTime::now_utc()) {
            return Err(AuthError::ExpiredToken);
        }
        if record.is_confirmed {
            return Err(AuthError::invalid_grant("the user code has already been used"));
        }

        record.is_confirmed = true;
        record.subject = Some(subject.to_string());
        let client_id = record.client_id.clone();
        self.device_store.save(record).await?;

        tracing::info!(client_id = %client_id, "Device authorization approved");
        Ok(())
    }
}

/// 32 random bytes, base64url without padding.
fn generate_device_code() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// `XXXX-XXXX` over [`USER_CODE_ALPHABET`].
fn generate_user_code() -> String {
    let mut rng = rand::thread_rng();
    let mut code = String::with_capacity(USER_CODE_LENGTH + 1);
    for i in 0..USER_CODE_LENGTH {
        if i == USER_CODE_LENGTH / 2 {
            code.push('-');
        }
        let index = rng.gen_range(0..USER_CODE_ALPHABET.len());
        code.push(char::from(USER_CODE_ALPHABET[index]));
    }
    code
}

/// Accepts user input in any case, with or without the dash.
fn normalize_user_code(input: &str) -> String {
    let compact: String = input
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_uppercase())
        .collect();
    if compact.len() == USER_CODE_LENGTH {
        format!("{}-{}", &compact[..USER_CODE_LENGTH / 2], &compact[USER_CODE_LENGTH / 2..])
    } else {
        compact
    }
}

fn verification_uri_complete(verification_uri: &str, user_code: &str) -> AuthResult<String> {
    let mut url = url::Url::parse(verification_uri).map_err(|e| {
        AuthError::configuration(format!("invalid device verification_uri: {}", e))
    })?;
    url.query_pairs_mut().append_pair("user_code", user_code);
    Ok(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_code_format() {
        for _ in 0..20 {
            let code = generate_user_code();
            assert_eq!(code.len(), 9);
            assert_eq!(code.as_bytes()[4], b'-');
            assert!(
                code.chars()
                    .filter(|c| *c != '-')
                    .all(|c| USER_CODE_ALPHABET.contains(&(c as u8)))
            );
        }
    }

    #[test]
    fn test_device_code_is_random() {
        let code = generate_device_code();
        assert_eq!(code.len(), 43);
        assert_ne!(code, generate_device_code());
    }

    #[test]
    fn test_normalize_user_code() {
        assert_eq!(normalize_user_code("bcdf ghjk"), "BCDF-GHJK");
        assert_eq!(normalize_user_code("BCDF-GHJK"), "BCDF-GHJK");
        assert_eq!(normalize_user_code("bcd"), "BCD");
    }

    #[test]
    fn test_verification_uri_complete() {
        assert_eq!(
            verification_uri_complete("https://auth.example.com/device", "BCDF-GHJK").unwrap(),
            "https://auth.example.com/device?user_code=BCDF-GHJK"
        );
        assert!(verification_uri_complete("not a url", "BCDF-GHJK").is_err());
    }
}
