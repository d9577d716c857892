//! OAuth 2.0 / OpenID Connect endpoint logic.
//!
//! - [`authorize`] - authorization request parsing and redirect URLs
//! - [`authorization`] - login/consent/callback decisions, codes and
//!   implicit tokens
//! - [`client_auth`] - token endpoint client authentication
//! - [`client_assertion`] - `client_secret_jwt` / `private_key_jwt` claims
//! - [`device`] - device authorization endpoint
//! - [`pkce`] - PKCE challenge and verifier
//! - [`token`] - token endpoint request and response types
//!
//! # Example
//!
//! ```ignore
//! use tessera_auth::oauth::{AuthorizationOutcome, AuthorizationRequest};
//!
//! let params = AuthorizationRequest { /* from the query string */ }.into_parameter()?;
//! match processor.process(&params, session.principal(), issuer).await? {
//!     AuthorizationOutcome::RedirectToLogin => { /* show login */ }
//!     AuthorizationOutcome::RedirectToConsent => { /* show consent */ }
//!     outcome @ AuthorizationOutcome::RedirectToCallback { .. } => {
//!         let url = outcome.callback_url()?;
//!     }
//! }
//! ```

pub mod authorization;
pub mod authorize;
pub mod client_assertion;
pub mod client_auth;
pub mod device;
pub mod pkce;
pub mod token;

pub use authorization::{AuthorizationOutcome, AuthorizationProcessor};
pub use authorize::{
    AuthorizationParameter, AuthorizationRequest, Prompt, ResponseMode, build_redirect_url,
};
pub use client_assertion::{CLIENT_ASSERTION_TYPE_JWT_BEARER, ClientAssertionClaims};
pub use client_auth::{
    AuthenticateInstruction, AuthenticatedClient, ClientAuthParameters, ClientAuthenticator,
    ClientCertificate, parse_basic_auth,
};
pub use device::{DeviceAuthorizationAction, DeviceAuthorizationRequest};
pub use pkce::{PkceChallenge, PkceChallengeMethod, PkceError, PkceVerifier, check_code_verifier};
pub use token::{TokenRequest, TokenResponse};
