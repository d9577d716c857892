//! Authentication and authorization error types.
//!
//! Every grant action, the authorization request processor and the UMA
//! policy evaluator report failures as [`AuthError`] values. The error carries
//! a machine-readable [`ErrorCode`], an HTTP-status equivalent and a
//! human-readable detail string. Authorization-flow errors can additionally
//! carry the request `state` so the boundary layer can echo it back.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::uma::NeedInfoDetails;

/// Errors that can occur during authentication and authorization operations.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The client credentials are invalid or the client is not registered.
    #[error("Invalid client: {message}")]
    InvalidClient {
        /// Description of why the client is invalid.
        message: String,
    },

    /// The authorization grant or refresh token is invalid, expired, or revoked.
    #[error("Invalid grant: {message}")]
    InvalidGrant {
        /// Description of why the grant is invalid.
        message: String,
    },

    /// The request is missing a parameter or is otherwise malformed.
    #[error("Invalid request: {message}")]
    InvalidRequest {
        /// Description of why the request is invalid.
        message: String,
    },

    /// The requested scope is invalid, unknown, or malformed.
    #[error("Invalid scope: {message}")]
    InvalidScope {
        /// Description of why the scope is invalid.
        message: String,
    },

    /// The token is invalid, malformed, or unknown.
    #[error("Invalid token: {message}")]
    InvalidToken {
        /// Description of why the token is invalid.
        message: String,
    },

    /// The redirect URI is not registered for the client.
    #[error("Invalid redirect uri: {message}")]
    InvalidRedirectUri {
        /// Description of the redirect URI mismatch.
        message: String,
    },

    /// The client is not allowed to use the requested response type.
    #[error("Invalid response: {message}")]
    InvalidResponse {
        /// Description of why the response type is rejected.
        message: String,
    },

    /// The authorization code exists but its validity period has elapsed.
    #[error("The authorization code has expired")]
    ExpiredAuthorizationCode,

    /// The device code (or another short-lived artifact) has expired.
    #[error("Token expired")]
    ExpiredToken,

    /// The device is polling faster than the advertised interval.
    #[error("Slow down: polling interval not respected")]
    SlowDown,

    /// The end user has not yet approved the device authorization request.
    #[error("Authorization pending")]
    AuthorizationPending,

    /// The token could not be revoked.
    #[error("Revoke failed: {message}")]
    RevokeFailed {
        /// Description of the revocation failure.
        message: String,
    },

    /// The authorization server does not support the requested grant type.
    #[error("Unsupported grant type: {grant_type}")]
    UnsupportedGrantType {
        /// The unsupported grant type.
        grant_type: String,
    },

    /// The authorization server does not support the requested response type.
    #[error("Unsupported response type: {response_type}")]
    UnsupportedResponseType {
        /// The unsupported response type.
        response_type: String,
    },

    /// `prompt=none` was requested but the end user is not authenticated.
    #[error("Login required")]
    LoginRequired,

    /// `prompt=none` was requested but user interaction is needed.
    #[error("Interaction required: {message}")]
    InteractionRequired {
        /// Description of the required interaction.
        message: String,
    },

    /// The resource owner or the server denied the request.
    #[error("Access denied: {message}")]
    AccessDenied {
        /// Description of why access was denied.
        message: String,
    },

    /// The UMA request was submitted to the resource owner for approval.
    #[error("The request has been submitted to the resource owner")]
    RequestSubmitted,

    /// The UMA policy needs more claims about the requesting party.
    #[error("Need info: the requesting party must provide more claims")]
    NeedInfo {
        /// Required claims and redirect hint.
        details: Box<NeedInfoDetails>,
    },

    /// The UMA policy rejected the request.
    #[error("Not authorized: {message}")]
    NotAuthorized {
        /// Description of the rejected rule.
        message: String,
    },

    /// An error occurred while storing or retrieving auth data.
    #[error("Storage error: {message}")]
    Storage {
        /// Description of the storage error.
        message: String,
    },

    /// The auth configuration is invalid.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration error.
        message: String,
    },

    /// An unexpected internal error occurred.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },

    /// An error raised while processing a request that carried a `state`.
    #[error("{source}")]
    WithState {
        /// The `state` parameter of the originating request.
        state: String,
        /// The underlying error.
        #[source]
        source: Box<AuthError>,
    },
}

impl AuthError {
    /// Creates a new `InvalidClient` error.
    #[must_use]
    pub fn invalid_client(message: impl Into<String>) -> Self {
        Self::InvalidClient {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidGrant` error.
    #[must_use]
    pub fn invalid_grant(message: impl Into<String>) -> Self {
        Self::InvalidGrant {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidRequest` error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidScope` error.
    #[must_use]
    pub fn invalid_scope(message: impl Into<String>) -> Self {
        Self::InvalidScope {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidToken` error.
    #[must_use]
    pub fn invalid_token(message: impl Into<String>) -> Self {
        Self::InvalidToken {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidRedirectUri` error.
    #[must_use]
    pub fn invalid_redirect_uri(message: impl Into<String>) -> Self {
        Self::InvalidRedirectUri {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidResponse` error.
    #[must_use]
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            message: message.into(),
        }
    }

    /// Creates a new `RevokeFailed` error.
    #[must_use]
    pub fn revoke_failed(message: impl Into<String>) -> Self {
        Self::RevokeFailed {
            message: message.into(),
        }
    }

    /// Creates a new `UnsupportedGrantType` error.
    #[must_use]
    pub fn unsupported_grant_type(grant_type: impl Into<String>) -> Self {
        Self::UnsupportedGrantType {
            grant_type: grant_type.into(),
        }
    }

    /// Creates a new `UnsupportedResponseType` error.
    #[must_use]
    pub fn unsupported_response_type(response_type: impl Into<String>) -> Self {
        Self::UnsupportedResponseType {
            response_type: response_type.into(),
        }
    }

    /// Creates a new `InteractionRequired` error.
    #[must_use]
    pub fn interaction_required(message: impl Into<String>) -> Self {
        Self::InteractionRequired {
            message: message.into(),
        }
    }

    /// Creates a new `AccessDenied` error.
    #[must_use]
    pub fn access_denied(message: impl Into<String>) -> Self {
        Self::AccessDenied {
            message: message.into(),
        }
    }

    /// Creates a new `NeedInfo` error.
    #[must_use]
    pub fn need_info(details: NeedInfoDetails) -> Self {
        Self::NeedInfo {
            details: Box::new(details),
        }
    }

    /// Creates a new `NotAuthorized` error.
    #[must_use]
    pub fn not_authorized(message: impl Into<String>) -> Self {
        Self::NotAuthorized {
            message: message.into(),
        }
    }

    /// Creates a new `Storage` error.
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Creates a new `Configuration` error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates a new `Internal` error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Attaches the request `state` to this error.
    ///
    /// An error that already carries a state keeps the original one.
    #[must_use]
    pub fn with_state(self, state: impl Into<String>) -> Self {
        match self {
            Self::WithState { .. } => self,
            other => Self::WithState {
                state: state.into(),
                source: Box::new(other),
            },
        }
    }

    /// Attaches the request `state` when one is present.
    #[must_use]
    pub fn with_optional_state(self, state: Option<&str>) -> Self {
        match state {
            Some(state) if !state.is_empty() => self.with_state(state),
            _ => self,
        }
    }

    /// Returns the `state` carried by this error, if any.
    #[must_use]
    pub fn state(&self) -> Option<&str> {
        match self {
            Self::WithState { state, .. } => Some(state.as_str()),
            _ => None,
        }
    }

    /// Returns the innermost error, skipping any `state` wrapper.
    #[must_use]
    pub fn inner(&self) -> &AuthError {
        match self {
            Self::WithState { source, .. } => source.inner(),
            other => other,
        }
    }

    /// Returns the machine-readable code of this error.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidClient { .. } => ErrorCode::InvalidClient,
            Self::InvalidGrant { .. } => ErrorCode::InvalidGrant,
            Self::InvalidRequest { .. } => ErrorCode::InvalidRequest,
            Self::InvalidScope { .. } => ErrorCode::InvalidScope,
            Self::InvalidToken { .. } => ErrorCode::InvalidToken,
            Self::InvalidRedirectUri { .. } => ErrorCode::InvalidRedirectUri,
            Self::InvalidResponse { .. } => ErrorCode::InvalidResponse,
            Self::ExpiredAuthorizationCode => ErrorCode::ExpiredAuthorizationCode,
            Self::ExpiredToken => ErrorCode::ExpiredToken,
            Self::SlowDown => ErrorCode::SlowDown,
            Self::AuthorizationPending => ErrorCode::AuthorizationPending,
            Self::RevokeFailed { .. } => ErrorCode::RevokeFailed,
            Self::UnsupportedGrantType { .. } => ErrorCode::UnsupportedGrantType,
            Self::UnsupportedResponseType { .. } => ErrorCode::UnsupportedResponseType,
            Self::LoginRequired => ErrorCode::LoginRequired,
            Self::InteractionRequired { .. } => ErrorCode::InteractionRequired,
            Self::AccessDenied { .. } => ErrorCode::AccessDenied,
            Self::RequestSubmitted => ErrorCode::RequestSubmitted,
            Self::NeedInfo { .. } => ErrorCode::NeedInfo,
            Self::NotAuthorized { .. } => ErrorCode::NotAuthorized,
            Self::Storage { .. } | Self::Configuration { .. } | Self::Internal { .. } => {
                ErrorCode::ServerError
            }
            Self::WithState { source, .. } => source.code(),
        }
    }

    /// Returns the OAuth 2.0 error code for this error.
    #[must_use]
    pub fn oauth_error_code(&self) -> &'static str {
        self.code().as_str()
    }

    /// Returns the HTTP status code equivalent of this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self.code() {
            ErrorCode::InvalidClient => 401,
            ErrorCode::AccessDenied
            | ErrorCode::RequestSubmitted
            | ErrorCode::NeedInfo
            | ErrorCode::NotAuthorized => 403,
            ErrorCode::ServerError => 500,
            _ => 400,
        }
    }

    /// Returns `true` if this is a client error (4xx category).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code())
    }

    /// Returns `true` if this is a server error (5xx category).
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.status_code() >= 500
    }

    /// Returns `true` if the caller is expected to retry later.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.code(),
            ErrorCode::SlowDown | ErrorCode::AuthorizationPending
        )
    }

    /// Returns the error category for logging/monitoring purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self.code() {
            ErrorCode::InvalidClient | ErrorCode::InvalidGrant | ErrorCode::LoginRequired => {
                ErrorCategory::Authentication
            }
            ErrorCode::InvalidScope
            | ErrorCode::AccessDenied
            | ErrorCode::InteractionRequired
            | ErrorCode::RequestSubmitted
            | ErrorCode::NeedInfo
            | ErrorCode::NotAuthorized => ErrorCategory::Authorization,
            ErrorCode::InvalidToken
            | ErrorCode::ExpiredAuthorizationCode
            | ErrorCode::ExpiredToken
            | ErrorCode::RevokeFailed => ErrorCategory::Token,
            ErrorCode::SlowDown | ErrorCode::AuthorizationPending => ErrorCategory::DeviceFlow,
            ErrorCode::InvalidRequest
            | ErrorCode::InvalidRedirectUri
            | ErrorCode::InvalidResponse
            | ErrorCode::UnsupportedGrantType
            | ErrorCode::UnsupportedResponseType => ErrorCategory::Validation,
            ErrorCode::ServerError => match self.inner() {
                Self::Storage { .. } => ErrorCategory::Infrastructure,
                Self::Configuration { .. } => ErrorCategory::Configuration,
                _ => ErrorCategory::Internal,
            },
        }
    }

    /// Builds the wire representation of this error.
    #[must_use]
    pub fn to_details(&self) -> ErrorDetails {
        let error_details = match self.inner() {
            Self::NeedInfo { details } => Some(details.as_ref().clone()),
            _ => None,
        };
        ErrorDetails {
            error: self.oauth_error_code().to_string(),
            error_description: Some(self.inner().to_string()),
            state: self.state().map(str::to_string),
            error_details,
        }
    }
}

/// Machine-readable error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    InvalidClient,
    InvalidGrant,
    InvalidRequest,
    InvalidScope,
    InvalidToken,
    InvalidRedirectUri,
    InvalidResponse,
    ExpiredAuthorizationCode,
    ExpiredToken,
    SlowDown,
    AuthorizationPending,
    RevokeFailed,
    UnsupportedGrantType,
    UnsupportedResponseType,
    LoginRequired,
    InteractionRequired,
    AccessDenied,
    RequestSubmitted,
    NeedInfo,
    NotAuthorized,
    ServerError,
}

impl ErrorCode {
    /// Returns the wire value of this code.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidClient => "invalid_client",
            Self::InvalidGrant => "invalid_grant",
            Self::InvalidRequest => "invalid_request",
            Self::InvalidScope => "invalid_scope",
            Self::InvalidToken => "invalid_token",
            Self::InvalidRedirectUri => "invalid_redirect_uri",
            Self::InvalidResponse => "invalid_response",
            Self::ExpiredAuthorizationCode => "expired_authorization_code",
            Self::ExpiredToken => "expired_token",
            Self::SlowDown => "slow_down",
            Self::AuthorizationPending => "authorization_pending",
            Self::RevokeFailed => "revoke_failed",
            Self::UnsupportedGrantType => "unsupported_grant_type",
            Self::UnsupportedResponseType => "unsupported_response_type",
            Self::LoginRequired => "login_required",
            Self::InteractionRequired => "interaction_required",
            Self::AccessDenied => "access_denied",
            Self::RequestSubmitted => "request_submitted",
            Self::NeedInfo => "need_info",
            Self::NotAuthorized => "not_authorized",
            Self::ServerError => "server_error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error response body returned to protocol clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorDetails {
    /// Machine-readable error code.
    pub error: String,

    /// Human-readable description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,

    /// Echoed `state` of the originating request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    /// UMA `need_info` details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_details: Option<NeedInfoDetails>,
}

/// Categories of authentication/authorization errors for logging and monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Authentication-related errors (identity verification).
    Authentication,
    /// Authorization-related errors (permission checks).
    Authorization,
    /// Token-related errors (validation, expiration).
    Token,
    /// Device flow polling signals.
    DeviceFlow,
    /// Request validation errors.
    Validation,
    /// Infrastructure/storage errors.
    Infrastructure,
    /// Configuration errors.
    Configuration,
    /// Internal server errors.
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Authentication => write!(f, "authentication"),
            Self::Authorization => write!(f, "authorization"),
            Self::Token => write!(f, "token"),
            Self::DeviceFlow => write!(f, "device_flow"),
            Self::Validation => write!(f, "validation"),
            Self::Infrastructure => write!(f, "infrastructure"),
            Self::Configuration => write!(f, "configuration"),
            Self::Internal => write!(f, "internal"),
        }
    }
}
