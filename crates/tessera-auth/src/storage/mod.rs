//! Storage traits for the collaborators of the token issuance core.
//!
//! This module defines storage interfaces for:
//!
//! - OAuth client registrations and scopes
//! - Authorization codes and device authorization records
//! - Granted tokens
//! - Resource owners and their consents
//! - UMA resource sets and permission tickets
//!
//! # Implementations
//!
//! [`memory`] provides `dashmap`-backed implementations used by tests and
//! single-node deployments. Database backends live outside this crate.

pub mod authorization_code;
pub mod client;
pub mod consent;
pub mod device;
pub mod memory;
pub mod resource_owner;
pub mod scope;
pub mod token;
pub mod uma;

pub use authorization_code::AuthorizationCodeStore;
pub use client::ClientStore;
pub use consent::ConsentStore;
pub use device::DeviceAuthorizationStore;
pub use resource_owner::ResourceOwnerStore;
pub use scope::ScopeStore;
pub use token::TokenStore;
pub use uma::{ResourceSetStore, TicketStore};

use std::sync::Arc;

/// The collaborators the core reads and writes.
#[derive(Clone)]
pub struct Stores {
    pub clients: Arc<dyn ClientStore>,
    pub scopes: Arc<dyn ScopeStore>,
    pub tokens: Arc<dyn TokenStore>,
    pub authorization_codes: Arc<dyn AuthorizationCodeStore>,
    pub device_authorizations: Arc<dyn DeviceAuthorizationStore>,
    pub resource_owners: Arc<dyn ResourceOwnerStore>,
    pub consents: Arc<dyn ConsentStore>,
    pub resource_sets: Arc<dyn ResourceSetStore>,
    pub tickets: Arc<dyn TicketStore>,
}
