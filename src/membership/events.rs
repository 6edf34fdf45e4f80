use serde::Serialize;

use super::Role;
use crate::messages::EventPayload;
use crate::permissions::Permissions;
use crate::values::{AccountId, MembershipId, WorkspaceId};

/// What happened to a membership.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "change", rename_all = "snake_case")]
pub enum MembershipChange {
    Invited { role: Role, invited_by: AccountId },
    Joined { role: Role },
    RoleChanged { from: Role, to: Role },
    PermissionsChanged { from: Permissions, to: Permissions },
    Activated,
    Suspended,
    Left,
    Removed,
}

/// Domain event raised by [`Membership`](super::Membership) mutators.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MembershipEvent {
    pub membership_id: MembershipId,
    pub workspace_id: WorkspaceId,
    pub account_id: AccountId,
    #[serde(flatten)]
    pub change: MembershipChange,
}

impl EventPayload for MembershipEvent {
    fn event_type(&self) -> &'static str {
        match self.change {
            MembershipChange::Invited { .. } => "membership.invited",
            MembershipChange::Joined { .. } => "membership.joined",
            MembershipChange::RoleChanged { .. } => "membership.role_changed",
            MembershipChange::PermissionsChanged { .. } => "membership.permissions_changed",
            MembershipChange::Activated => "membership.activated",
            MembershipChange::Suspended => "membership.suspended",
            MembershipChange::Left => "membership.left",
            MembershipChange::Removed => "membership.removed",
        }
    }
}
