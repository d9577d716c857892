//! # tessera-auth
//!
//! Token issuance core of an OAuth 2.0 / OpenID Connect / UMA 2.0
//! authorization server.
//!
//! This crate provides:
//! - Client authentication (secrets, JWT assertions, mutual TLS)
//! - The authorization endpoint (code, implicit and hybrid flows)
//! - Token grants: authorization code, refresh token, client credentials,
//!   resource owner password, device code and UMA ticket
//! - ID token and user info generation with JWS signing and JWE encryption
//! - UMA authorization policy evaluation
//! - Token revocation, introspection and user info
//!
//! ## Overview
//!
//! Everything is wired together by [`server::AuthServer`]. Persistence is
//! abstracted behind the traits in [`storage`]; [`storage::memory`] ships
//! in-memory implementations. The HTTP layer is left to the embedding
//! application: every operation returns either a typed response or an
//! [`AuthError`] that maps onto the OAuth error response body.
//!
//! ## Modules
//!
//! - [`config`] - Server configuration
//! - [`error`] - OAuth error codes and the crate error type
//! - [`events`] - Token issuance events
//! - [`grants`] - Token endpoint grant handlers
//! - [`jwt`] - Keys, signing, encryption and token payload generation
//! - [`oauth`] - Authorization endpoint, client authentication and PKCE
//! - [`observability`] - Tracing setup
//! - [`server`] - Composition root
//! - [`storage`] - Storage traits and in-memory stores
//! - [`token`] - Revocation, introspection and user info
//! - [`types`] - Domain records
//! - [`uma`] - UMA authorization policies

pub mod config;
pub mod error;
pub mod events;
pub mod grants;
pub mod jwt;
pub mod oauth;
pub mod observability;
pub mod server;
pub mod storage;
pub mod token;
pub mod types;
pub mod uma;

pub use config::{AuthConfig, ConfigError};
pub use error::{AuthError, ErrorCategory, ErrorCode, ErrorDetails};
pub use events::{AuthEvent, EventBroadcaster, EventPublisher, TracingEventPublisher};
pub use server::{AuthServer, AuthServerBuilder};
pub use storage::Stores;
pub use types::{Client, ClientValidationError, GrantType, GrantedToken, ResponseType};

/// Type alias for authentication/authorization results.
pub type AuthResult<T> = Result<T, AuthError>;

/// Prelude module for convenient imports.
///
/// ```ignore
/// use tessera_auth::prelude::*;
/// ```
pub mod prelude {
    pub use crate::AuthResult;
    pub use crate::config::{AuthConfig, ConfigError};
    pub use crate::error::{AuthError, ErrorCategory, ErrorCode, ErrorDetails};
    pub use crate::events::{AuthEvent, EventPublisher};
    pub use crate::jwt::{InMemoryKeyStore, JwtPayload, KeyStore, SigningAlgorithm};
    pub use crate::oauth::{
        AuthorizationOutcome, AuthorizationParameter, ClientAuthParameters, ClientCertificate,
        DeviceAuthorizationRequest, TokenRequest, TokenResponse,
    };
    pub use crate::server::{AuthServer, AuthServerBuilder};
    pub use crate::storage::Stores;
    pub use crate::storage::memory::InMemoryStores;
    pub use crate::token::{IntrospectionRequest, IntrospectionResponse, RevocationRequest, UserInfoResponse};
    pub use crate::types::{
        Claim, ClaimsPrincipal, Client, GrantType, GrantedToken, ResourceOwner, ResponseType,
        TokenEndpointAuthMethod,
    };
    pub use crate::uma::{AuthorizationPolicyResult, NeedInfoDetails};
}
