//! Domain events published after a token is minted.
//!
//! Publication is fire-and-forget: a failing or absent subscriber never
//! fails the grant that produced the event.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tokio::sync::broadcast;

use crate::types::GrantType;

const DEFAULT_BUFFER_SIZE: usize = 256;

/// Events emitted by the token issuance core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthEvent {
    /// A token was issued on behalf of a resource owner.
    TokenGranted {
        /// Identifier of the granted token.
        id: String,
        /// Resource owner subject.
        subject: Option<String>,
        client_id: String,
        scopes: Vec<String>,
        grant_type: GrantType,
        #[serde(with = "time::serde::rfc3339")]
        timestamp: OffsetDateTime,
    },

    /// A token was issued to a client acting for itself.
    AccessToClientGranted {
        id: String,
        client_id: String,
        scopes: Vec<String>,
        grant_type: GrantType,
        #[serde(with = "time::serde::rfc3339")]
        timestamp: OffsetDateTime,
    },
}

impl AuthEvent {
    /// Identifier of the granted token.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::TokenGranted { id, .. } | Self::AccessToClientGranted { id, .. } => id,
        }
    }

    #[must_use]
    pub fn client_id(&self) -> &str {
        match self {
            Self::TokenGranted { client_id, .. } | Self::AccessToClientGranted { client_id, .. } => {
                client_id
            }
        }
    }

    #[must_use]
    pub fn grant_type(&self) -> GrantType {
        match self {
            Self::TokenGranted { grant_type, .. }
            | Self::AccessToClientGranted { grant_type, .. } => *grant_type,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::TokenGranted { .. } => "token_granted",
            Self::AccessToClientGranted { .. } => "access_to_client_granted",
        }
    }
}

/// Sink for [`AuthEvent`]s.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publishes an event. Never fails.
    async fn publish(&self, event: AuthEvent);
}

/// Publisher that only logs.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventPublisher;

#[async_trait]
impl EventPublisher for TracingEventPublisher {
    async fn publish(&self, event: AuthEvent) {
        tracing::info!(
            event = event.name(),
            token_id = %event.id(),
            client_id = %event.client_id(),
            grant_type = %event.grant_type(),
            "Auth event"
        );
    }
}

/// Broadcasts events to in-process subscribers over a tokio channel.
///
/// Events sent while nobody is subscribed are dropped. Slow receivers lose
/// the oldest events once the buffer is full.
#[derive(Clone)]
pub struct EventBroadcaster {
    sender: broadcast::Sender<AuthEvent>,
}

impl EventBroadcaster {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_BUFFER_SIZE)
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    #[must_use]
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Receives every event broadcast after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.sender.subscribe()
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBroadcaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBroadcaster")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

#[async_trait]
impl EventPublisher for EventBroadcaster {
    async fn publish(&self, event: AuthEvent) {
        tracing::info!(
            event = event.name(),
            token_id = %event.id(),
            client_id = %event.client_id(),
            "Auth event"
        );
        let delivered = self.sender.send(event).unwrap_or_default();
        tracing::trace!(delivered, "Auth event broadcast");
    }
}
