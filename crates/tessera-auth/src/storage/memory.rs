//! In-memory storage backends.
//!
//! Each store wraps a [`DashMap`], so it can be shared between tasks behind
//! an `Arc` without extra locking. Nothing is persisted.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use time::OffsetDateTime;

use crate::AuthResult;
use crate::config::ClaimsConfig;
use crate::jwt::payload::JwtPayload;
use crate::storage::{
    AuthorizationCodeStore, ClientStore, ConsentStore, DeviceAuthorizationStore,
    ResourceOwnerStore, ResourceSetStore, ScopeStore, Stores, TicketStore, TokenStore,
};
use crate::types::{
    AuthorizationCode, Client, Consent, DeviceAuthorizationData, GrantedToken, ResourceOwner,
    ResourceSet, Scope, Ticket,
};

// =============================================================================
// Clients and scopes
// =============================================================================

/// Client registrations keyed by `client_id`.
#[derive(Debug, Default)]
pub struct InMemoryClientStore {
    clients: DashMap<String, Client>,
}

impl InMemoryClientStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a registration.
    pub fn insert(&self, client: Client) {
        self.clients.insert(client.client_id.clone(), client);
    }
}

#[async_trait]
impl ClientStore for InMemoryClientStore {
    async fn get_by_id(&self, client_id: &str) -> AuthResult<Option<Client>> {
        Ok(self.clients.get(client_id).map(|c| c.value().clone()))
    }

    /// Clients are returned ordered by `client_id`.
    async fn get_all(&self) -> AuthResult<Vec<Client>> {
        let mut clients: Vec<Client> = self.clients.iter().map(|c| c.value().clone()).collect();
        clients.sort_by(|a, b| a.client_id.cmp(&b.client_id));
        Ok(clients)
    }
}

/// Scope definitions keyed by name.
#[derive(Debug, Default)]
pub struct InMemoryScopeStore {
    scopes: DashMap<String, Scope>,
}

impl InMemoryScopeStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, scope: Scope) {
        self.scopes.insert(scope.name.clone(), scope);
    }

    /// Loads the configured scope definitions unless scopes already exist.
    pub fn seed_if_empty(&self, config: &ClaimsConfig) {
        if !self.scopes.is_empty() {
            return;
        }
        for scope in &config.scopes {
            self.insert(Scope {
                name: scope.name.clone(),
                claims: scope.claims.clone(),
                is_openid_scope: scope.is_openid_scope,
                is_exposed: scope.is_exposed,
            });
        }
        tracing::debug!(count = self.scopes.len(), "Seeded scope definitions");
    }
}

#[async_trait]
impl ScopeStore for InMemoryScopeStore {
    async fn search_by_names(&self, names: &[String]) -> AuthResult<Vec<Scope>> {
        Ok(names
            .iter()
            .filter_map(|name| self.scopes.get(name).map(|s| s.value().clone()))
            .collect())
    }
}

// =============================================================================
// Codes and device records
// =============================================================================

#[derive(Debug, Default)]
pub struct InMemoryAuthorizationCodeStore {
    codes: DashMap<String, AuthorizationCode>,
}

impl InMemoryAuthorizationCodeStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored codes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

#[async_trait]
impl AuthorizationCodeStore for InMemoryAuthorizationCodeStore {
    async fn add(&self, code: AuthorizationCode) -> AuthResult<()> {
        self.codes.insert(code.code.clone(), code);
        Ok(())
    }

    async fn get(&self, code: &str) -> AuthResult<Option<AuthorizationCode>> {
        Ok(self.codes.get(code).map(|c| c.value().clone()))
    }

    async fn remove(&self, code: &str) -> AuthResult<bool> {
        Ok(self.codes.remove(code).is_some())
    }
}

/// Device authorization records keyed by device code.
#[derive(Debug, Default)]
pub struct InMemoryDeviceAuthorizationStore {
    records: DashMap<String, DeviceAuthorizationData>,
}

impl InMemoryDeviceAuthorizationStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DeviceAuthorizationStore for InMemoryDeviceAuthorizationStore {
    async fn get(
        &self,
        client_id: &str,
        device_code: &str,
    ) -> AuthResult<Option<DeviceAuthorizationData>> {
        Ok(self
            .records
            .get(device_code)
            .filter(|r| r.client_id == client_id)
            .map(|r| r.value().clone()))
    }

    async fn get_by_user_code(
        &self,
        user_code: &str,
    ) -> AuthResult<Option<DeviceAuthorizationData>> {
        Ok(self
            .records
            .iter()
            .find(|r| r.user_code == user_code)
            .map(|r| r.value().clone()))
    }

    async fn save(&self, record: DeviceAuthorizationData) -> AuthResult<()> {
        self.records.insert(record.device_code.clone(), record);
        Ok(())
    }
}

// =============================================================================
// Tokens
// =============================================================================

/// Granted tokens keyed by id, with lookups by access and refresh token.
#[derive(Debug, Default)]
pub struct InMemoryTokenStore {
    tokens: DashMap<String, GrantedToken>,
    by_access_token: DashMap<String, String>,
    by_refresh_token: DashMap<String, String>,
}

impl InMemoryTokenStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored tokens.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    fn remove_by_id(&self, id: &str) -> bool {
        let Some((_, token)) = self.tokens.remove(id) else {
            return false;
        };
        self.by_access_token.remove(&token.access_token);
        if let Some(refresh_token) = &token.refresh_token {
            self.by_refresh_token.remove(refresh_token);
        }
        true
    }

    /// Drops expired tokens that carry no refresh token. Expired tokens with
    /// a refresh token stay until they are refreshed or revoked.
    fn prune_expired(&self, now: OffsetDateTime) {
        let expired: Vec<String> = self
            .tokens
            .iter()
            .filter(|t| t.refresh_token.is_none() && t.is_expired(now))
            .map(|t| t.key().clone())
            .collect();
        if expired.is_empty() {
            return;
        }
        for id in &expired {
            self.remove_by_id(id);
        }
        tracing::debug!(count = expired.len(), "Pruned expired tokens");
    }
}

fn same_snapshot(stored: Option<&JwtPayload>, requested: Option<&JwtPayload>) -> bool {
    match (stored, requested) {
        (None, None) => true,
        (Some(a), Some(b)) => a.is_equivalent(b),
        _ => false,
    }
}

#[async_trait]
impl TokenStore for InMemoryTokenStore {
    async fn get_valid_granted_token(
        &self,
        scopes: &str,
        client_id: &str,
        id_token_payload: Option<&JwtPayload>,
        user_info_payload: Option<&JwtPayload>,
    ) -> AuthResult<Option<GrantedToken>> {
        let now = OffsetDateTime::now_utc();
        Ok(self
            .tokens
            .iter()
            .find(|t| {
                t.client_id == client_id
                    && t.scope == scopes
                    && !t.is_expired(now)
                    && same_snapshot(t.id_token_payload.as_ref(), id_token_payload)
                    && same_snapshot(t.user_info_payload.as_ref(), user_info_payload)
            })
            .map(|t| t.value().clone()))
    }

    async fn add_token(&self, token: GrantedToken) -> AuthResult<()> {
        self.prune_expired(OffsetDateTime::now_utc());
        self.by_access_token
            .insert(token.access_token.clone(), token.id.clone());
        if let Some(refresh_token) = &token.refresh_token {
            self.by_refresh_token
                .insert(refresh_token.clone(), token.id.clone());
        }
        self.tokens.insert(token.id.clone(), token);
        Ok(())
    }

    async fn get_access_token(&self, access_token: &str) -> AuthResult<Option<GrantedToken>> {
        let Some(id) = self.by_access_token.get(access_token).map(|id| id.clone()) else {
            return Ok(None);
        };
        Ok(self.tokens.get(&id).map(|t| t.value().clone()))
    }

    async fn get_refresh_token(&self, refresh_token: &str) -> AuthResult<Option<GrantedToken>> {
        let Some(id) = self.by_refresh_token.get(refresh_token).map(|id| id.clone()) else {
            return Ok(None);
        };
        Ok(self.tokens.get(&id).map(|t| t.value().clone()))
    }

    async fn remove_access_token(&self, access_token: &str) -> AuthResult<bool> {
        let Some(id) = self.by_access_token.get(access_token).map(|id| id.clone()) else {
            return Ok(false);
        };
        Ok(self.remove_by_id(&id))
    }

    async fn remove_refresh_token(&self, refresh_token: &str) -> AuthResult<bool> {
        let Some(id) = self.by_refresh_token.get(refresh_token).map(|id| id.clone()) else {
            return Ok(false);
        };
        Ok(self.remove_by_id(&id))
    }
}

// =============================================================================
// Resource owners and consents
// =============================================================================

#[derive(Debug, Default)]
pub struct InMemoryResourceOwnerStore {
    owners: DashMap<String, ResourceOwner>,
}

impl InMemoryResourceOwnerStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, owner: ResourceOwner) {
        self.owners.insert(owner.id.clone(), owner);
    }
}

#[async_trait]
impl ResourceOwnerStore for InMemoryResourceOwnerStore {
    async fn get_by_id(&self, id: &str) -> AuthResult<Option<ResourceOwner>> {
        Ok(self.owners.get(id).map(|o| o.value().clone()))
    }

    async fn get_by_credentials(
        &self,
        login: &str,
        password: &str,
    ) -> AuthResult<Option<ResourceOwner>> {
        Ok(self
            .owners
            .get(login)
            .filter(|o| o.verify_password(password))
            .map(|o| o.value().clone()))
    }
}

/// Consents grouped by subject.
#[derive(Debug, Default)]
pub struct InMemoryConsentStore {
    consents: DashMap<String, Vec<Consent>>,
}

impl InMemoryConsentStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, consent: Consent) {
        self.consents
            .entry(consent.subject.clone())
            .or_default()
            .push(consent);
    }
}

#[async_trait]
impl ConsentStore for InMemoryConsentStore {
    async fn get_consents(&self, subject: &str) -> AuthResult<Vec<Consent>> {
        Ok(self
            .consents
            .get(subject)
            .map(|c| c.value().clone())
            .unwrap_or_default())
    }
}

// =============================================================================
// UMA
// =============================================================================

#[derive(Debug, Default)]
pub struct InMemoryResourceSetStore {
    resource_sets: DashMap<String, ResourceSet>,
}

impl InMemoryResourceSetStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, resource_set: ResourceSet) {
        self.resource_sets
            .insert(resource_set.id.clone(), resource_set);
    }
}

#[async_trait]
impl ResourceSetStore for InMemoryResourceSetStore {
    async fn get(&self, ids: &[String]) -> AuthResult<Vec<ResourceSet>> {
        Ok(ids
            .iter()
            .filter_map(|id| self.resource_sets.get(id).map(|r| r.value().clone()))
            .collect())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryTicketStore {
    tickets: DashMap<String, Ticket>,
}

impl InMemoryTicketStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TicketStore for InMemoryTicketStore {
    async fn get(&self, id: &str) -> AuthResult<Option<Ticket>> {
        Ok(self.tickets.get(id).map(|t| t.value().clone()))
    }

    async fn add(&self, ticket: Ticket) -> AuthResult<()> {
        self.tickets.insert(ticket.id.clone(), ticket);
        Ok(())
    }

    async fn remove(&self, id: &str) -> AuthResult<bool> {
        Ok(self.tickets.remove(id).is_some())
    }
}

// =============================================================================
// Bundle
// =============================================================================

/// One in-memory instance of every store, keeping the concrete handles so
/// callers can seed data.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStores {
    pub clients: Arc<InMemoryClientStore>,
    pub scopes: Arc<InMemoryScopeStore>,
    pub tokens: Arc<InMemoryTokenStore>,
    pub authorization_codes: Arc<InMemoryAuthorizationCodeStore>,
    pub device_authorizations: Arc<InMemoryDeviceAuthorizationStore>,
    pub resource_owners: Arc<InMemoryResourceOwnerStore>,
    pub consents: Arc<InMemoryConsentStore>,
    pub resource_sets: Arc<InMemoryResourceSetStore>,
    pub tickets: Arc<InMemoryTicketStore>,
}

impl InMemoryStores {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the stores as trait objects.
    #[must_use]
    pub fn stores(&self) -> Stores {
        Stores {
            clients: self.clients.clone(),
            scopes: self.scopes.clone(),
            tokens: self.tokens.clone(),
            authorization_codes: self.authorization_codes.clone(),
            device_authorizations: self.device_authorizations.clone(),
            resource_owners: self.resource_owners.clone(),
            consents: self.consents.clone(),
            resource_sets: self.resource_sets.clone(),
            tickets: self.tickets.clone(),
        }
    }
}
