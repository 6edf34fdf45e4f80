use std::fmt::Debug;

use serde::{Deserialize, Serialize};

use super::message::{Message, WorkspaceScope};
use crate::events::{BusMessage, EventScope};
use crate::values::{AccountId, CorrelationId, EventId, MessageId, Timestamp, WorkspaceId};

/// Typed body of a domain event.
pub trait EventPayload: Clone + Debug + Serialize + Send + Sync + 'static {
    /// Dot-separated event name, e.g. `workspace.archived`.
    fn event_type(&self) -> &'static str;
}

/// Something that happened, with audit metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainEvent<P, S = Option<WorkspaceId>> {
    event_id: EventId,
    occurred_at: Timestamp,
    version: u32,
    workspace_id: S,
    actor_id: Option<AccountId>,
    correlation_id: Option<CorrelationId>,
    causation_id: Option<MessageId>,
    payload: P,
}

impl<P, S> DomainEvent<P, S> {
    /// Schema version given to new events.
    pub const INITIAL_VERSION: u32 = 1;

    pub fn new(workspace_id: S, payload: P) -> Self {
        Self {
            event_id: EventId::generate(),
            occurred_at: Timestamp::now(),
            version: Self::INITIAL_VERSION,
            workspace_id,
            actor_id: None,
            correlation_id: None,
            causation_id: None,
            payload,
        }
    }
}

impl<P: EventPayload, S: WorkspaceScope> DomainEvent<P, S> {
    pub fn event_id(&self) -> &EventId {
        &self.event_id
    }

    pub fn occurred_at(&self) -> Timestamp {
        self.occurred_at
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn scope(&self) -> &S {
        &self.workspace_id
    }

    pub fn workspace_id(&self) -> Option<&WorkspaceId> {
        self.workspace_id.workspace_id()
    }

    pub fn actor_id(&self) -> Option<&AccountId> {
        self.actor_id.as_ref()
    }

    pub fn correlation_id(&self) -> Option<&CorrelationId> {
        self.correlation_id.as_ref()
    }

    pub fn causation_id(&self) -> Option<&MessageId> {
        self.causation_id.as_ref()
    }

    pub fn payload(&self) -> &P {
        &self.payload
    }

    pub fn event_type(&self) -> &'static str {
        self.payload.event_type()
    }

    #[must_use]
    pub fn with_actor(self, actor_id: AccountId) -> Self {
        Self {
            actor_id: Some(actor_id),
            ..self
        }
    }

    #[must_use]
    pub fn with_version(self, version: u32) -> Self {
        Self { version, ..self }
    }

    #[must_use]
    pub fn with_correlation_id(self, correlation_id: CorrelationId) -> Self {
        Self {
            correlation_id: Some(correlation_id),
            ..self
        }
    }

    /// Stamp the actor, correlation and causation of the message that caused
    /// this event.
    #[must_use]
    pub fn caused_by<Q, T: WorkspaceScope>(self, message: &Message<Q, T>) -> Self {
        Self {
            actor_id: Some(message.actor_id().clone()),
            correlation_id: Some(message.effective_correlation_id()),
            causation_id: Some(message.id().clone()),
            ..self
        }
    }

    /// Convert to the transport shape understood by an
    /// [`EventBus`](crate::events::EventBus).
    pub fn to_bus_message(&self, producer: &'static str) -> BusMessage
    where
        S: Serialize,
    {
        let scope = self
            .workspace_id()
            .map_or(EventScope::Global, |id| EventScope::Workspace(id.clone()));

        BusMessage {
            event_type: self.event_type().to_owned(),
            payload: serde_json::to_value(self).unwrap_or_default(),
            scope,
            timestamp: self.occurred_at,
            producer,
        }
    }
}
