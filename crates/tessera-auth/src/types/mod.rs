//! Domain types shared by the grant actions, the authorization processor and
//! the storage traits.
//!
//! ## Domain Types
//!
//! - [`Client`] - OAuth 2.0 / OpenID Connect client registration
//! - [`AuthorizationCode`] - Single-use code from the authorization endpoint
//! - [`GrantedToken`] - Issuance record of an access token
//! - [`DeviceAuthorizationData`] - Device flow polling record
//! - [`Ticket`], [`ResourceSet`], [`PolicyRule`] - UMA permissions and policies
//! - [`Scope`], [`ResourceOwner`], [`Consent`], [`Claim`] - Identity data

pub mod authorization_code;
pub mod client;
pub mod device;
pub mod granted_token;
pub mod resource_owner;
pub mod scope;
pub mod uma;

pub use authorization_code::AuthorizationCode;
pub use client::{
    Client, ClientSecret, ClientSecretType, ClientValidationError, GrantType, ResponseType,
    TokenEndpointAuthMethod,
};
pub use device::{DeviceAuthorizationData, DeviceAuthorizationResponse};
pub use granted_token::{BEARER_TOKEN_TYPE, GrantedToken, generate_token, hash_token};
pub use resource_owner::{Claim, ClaimsPrincipal, Consent, DEFAULT_AMR, ResourceOwner};
pub use scope::{Scope, has_offline_access, parse_scopes};
pub use uma::{Policy, PolicyRule, RequiredClaim, ResourceSet, Ticket, TicketLine};
