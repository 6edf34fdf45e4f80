use serde::Serialize;

use super::WorkspaceType;
use crate::messages::EventPayload;
use crate::values::{AccountId, Slug};

/// What happened to a workspace.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkspaceEvent {
    Created {
        name: String,
        slug: Slug,
        workspace_type: WorkspaceType,
        owner_id: AccountId,
        #[serde(skip_serializing_if = "Option::is_none")]
        account_id: Option<AccountId>,
        #[serde(skip_serializing_if = "Option::is_none")]
        context_id: Option<String>,
    },
    /// `changes` names the fields that were replaced.
    Updated { changes: Vec<&'static str> },
    Archived,
    Deleted,
    MemberJoined { member_count: u64 },
    MemberLeft { member_count: u64 },
    OwnershipTransferred {
        previous_owner: AccountId,
        new_owner: AccountId,
    },
}

impl EventPayload for WorkspaceEvent {
    fn event_type(&self) -> &'static str {
        match self {
            Self::Created { .. } => "workspace.created",
            Self::Updated { .. } => "workspace.updated",
            Self::Archived => "workspace.archived",
            Self::Deleted => "workspace.deleted",
            Self::MemberJoined { .. } => "workspace.member_joined",
            Self::MemberLeft { .. } => "workspace.member_left",
            Self::OwnershipTransferred { .. } => "workspace.ownership_transferred",
        }
    }
}
