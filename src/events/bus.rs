use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::values::{AccountId, OrganizationId, Timestamp, WorkspaceId};

/// Who an event is about, for routing and filtering.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum EventScope {
    Global,
    Account(AccountId),
    Organization(OrganizationId),
    Workspace(WorkspaceId),
}

impl fmt::Display for EventScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Global => f.write_str("global"),
            Self::Account(id) => write!(f, "account:{id}"),
            Self::Organization(id) => write!(f, "organization:{id}"),
            Self::Workspace(id) => write!(f, "workspace:{id}"),
        }
    }
}

/// The transport-agnostic shape every event takes on the bus.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BusMessage {
    /// Dot-separated name, e.g. `workspace.archived` or `team.failed`.
    pub event_type: String,
    pub payload: serde_json::Value,
    pub scope: EventScope,
    pub timestamp: Timestamp,
    /// Component that emitted the message.
    pub producer: &'static str,
}

impl BusMessage {
    pub fn new(
        event_type: impl Into<String>,
        payload: serde_json::Value,
        scope: EventScope,
        producer: &'static str,
    ) -> Self {
        Self {
            event_type: event_type.into(),
            payload,
            scope,
            timestamp: Timestamp::now(),
            producer,
        }
    }
}

/// Outbound event channel.
///
/// Emission is fire-and-forget: implementations log their own delivery
/// failures instead of returning them.
#[async_trait]
pub trait EventBus: Send + Sync {
    async fn emit(&self, message: BusMessage);
}

#[async_trait]
impl<T: EventBus + ?Sized> EventBus for Arc<T> {
    async fn emit(&self, message: BusMessage) {
        (**self).emit(message).await;
    }
}

#[async_trait]
impl<T: EventBus + ?Sized> EventBus for &T {
    async fn emit(&self, message: BusMessage) {
        (**self).emit(message).await;
    }
}
