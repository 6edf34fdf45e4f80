use std::fmt::Debug;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::values::{AccountId, CorrelationId, MessageId, Timestamp, WorkspaceId};

/// Distinguishes state-changing requests from reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Command,
    Query,
}

/// How an envelope refers to a workspace.
pub trait WorkspaceScope: Clone + Debug + Send + Sync + 'static {
    fn workspace_id(&self) -> Option<&WorkspaceId>;
}

impl WorkspaceScope for Option<WorkspaceId> {
    fn workspace_id(&self) -> Option<&WorkspaceId> {
        self.as_ref()
    }
}

impl WorkspaceScope for WorkspaceId {
    fn workspace_id(&self) -> Option<&WorkspaceId> {
        Some(self)
    }
}

/// A command or query issued by an account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message<P, S = Option<WorkspaceId>> {
    kind: MessageKind,
    id: MessageId,
    created_at: Timestamp,
    actor_id: AccountId,
    workspace_id: S,
    correlation_id: Option<CorrelationId>,
    payload: P,
}

pub type Command<P> = Message<P>;
pub type Query<P> = Message<P>;
pub type WorkspaceCommand<P> = Message<P, WorkspaceId>;
pub type WorkspaceQuery<P> = Message<P, WorkspaceId>;

impl<P, S> Message<P, S> {
    fn build(kind: MessageKind, actor_id: AccountId, workspace_id: S, payload: P) -> Self {
        Self {
            kind,
            id: MessageId::generate(),
            created_at: Timestamp::now(),
            actor_id,
            workspace_id,
            correlation_id: None,
            payload,
        }
    }
}

impl<P> Message<P, Option<WorkspaceId>> {
    pub fn command(actor_id: AccountId, payload: P) -> Self {
        Self::build(MessageKind::Command, actor_id, None, payload)
    }

    pub fn query(actor_id: AccountId, payload: P) -> Self {
        Self::build(MessageKind::Query, actor_id, None, payload)
    }

    #[must_use]
    pub fn with_workspace(self, workspace_id: WorkspaceId) -> Self {
        Self {
            workspace_id: Some(workspace_id),
            ..self
        }
    }

    pub fn workspace_id(&self) -> Option<&WorkspaceId> {
        self.workspace_id.as_ref()
    }
}

impl<P> Message<P, WorkspaceId> {
    pub fn workspace_command(actor_id: AccountId, workspace_id: WorkspaceId, payload: P) -> Self {
        Self::build(MessageKind::Command, actor_id, workspace_id, payload)
    }

    pub fn workspace_query(actor_id: AccountId, workspace_id: WorkspaceId, payload: P) -> Self {
        Self::build(MessageKind::Query, actor_id, workspace_id, payload)
    }

    /// Build a workspace-scoped command from a raw id, failing on an empty one.
    pub fn try_workspace_command(
        actor_id: AccountId,
        workspace_id: impl AsRef<str>,
        payload: P,
    ) -> Result<Self> {
        let workspace_id = WorkspaceId::parse(workspace_id)?;
        Ok(Self::workspace_command(actor_id, workspace_id, payload))
    }

    pub fn workspace_id(&self) -> &WorkspaceId {
        &self.workspace_id
    }
}

impl<P, S: WorkspaceScope> Message<P, S> {
    pub fn kind(&self) -> MessageKind {
        self.kind
    }

    pub fn id(&self) -> &MessageId {
        &self.id
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn actor_id(&self) -> &AccountId {
        &self.actor_id
    }

    pub fn scope(&self) -> &S {
        &self.workspace_id
    }

    pub fn correlation_id(&self) -> Option<&CorrelationId> {
        self.correlation_id.as_ref()
    }

    pub fn payload(&self) -> &P {
        &self.payload
    }

    pub fn into_payload(self) -> P {
        self.payload
    }

    #[must_use]
    pub fn with_correlation_id(self, correlation_id: CorrelationId) -> Self {
        Self {
            correlation_id: Some(correlation_id),
            ..self
        }
    }

    /// The correlation id to propagate to anything this message causes.
    ///
    /// Falls back to the message id when none was set, so the message starts
    /// a new chain.
    pub fn effective_correlation_id(&self) -> CorrelationId {
        self.correlation_id.clone().unwrap_or_else(|| {
            CorrelationId::parse(self.id.as_str()).unwrap_or_else(|_| CorrelationId::generate())
        })
    }
}
