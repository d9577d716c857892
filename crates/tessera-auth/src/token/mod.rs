//! Endpoints operating on issued tokens.
//!
//! - [`revocation`] - RFC 7009 revocation
//! - [`introspection`] - RFC 7662 introspection (OAuth and UMA variants)
//! - [`userinfo`] - OpenID Connect user info

pub mod introspection;
pub mod revocation;
pub mod userinfo;

pub use introspection::{
    IntrospectionAction, IntrospectionRequest, IntrospectionResponse, IntrospectionScope,
};
pub use revocation::{RevocationAction, RevocationRequest, TokenTypeHint};
pub use userinfo::{UserInfoAction, UserInfoResponse, bearer_token};
