//! UMA 2.0 authorization policies.
//!
//! See [`policy`] for the evaluation rules. Permission tickets and resource
//! sets are registered outside this crate and read through
//! [`TicketStore`](crate::storage::TicketStore) and
//! [`ResourceSetStore`](crate::storage::ResourceSetStore).

pub mod policy;

pub use policy::{
    AuthorizationPolicyResult, AuthorizationPolicyValidator, ClaimTokenParameter,
    ID_TOKEN_CLAIM_TOKEN_FORMAT, NeedInfoDetails, RequestingPartyClaims, RequiredClaimDetails,
};
