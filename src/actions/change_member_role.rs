use crate::error::{Error, Result};
use crate::events::EventBus;
use crate::guards::{Denial, PermissionChecker};
use crate::membership::{Membership, MembershipRepository, Role};
use crate::messages::WorkspaceCommand;
use crate::permissions::Permission;
use crate::values::AccountId;
use crate::workspace::WorkspaceRepository;

use super::{ensure_outranks, publish};

#[derive(Debug, Clone)]
pub struct ChangeMemberRoleInput {
    pub account_id: AccountId,
    pub role: Role,
}

/// Moves a member to another role and resets their permissions to that
/// role's defaults.
///
/// The actor needs `permissions:manage` and must outrank both the member's
/// current role and the new one.
pub struct ChangeMemberRoleAction<W, M, B>
where
    W: WorkspaceRepository,
    M: MembershipRepository,
    B: EventBus,
{
    workspaces: W,
    memberships: M,
    bus: B,
}

impl<W, M, B> ChangeMemberRoleAction<W, M, B>
where
    W: WorkspaceRepository,
    M: MembershipRepository,
    B: EventBus,
{
    pub fn new(workspaces: W, memberships: M, bus: B) -> Self {
        Self {
            workspaces,
            memberships,
            bus,
        }
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "change_member_role", skip_all, err)
    )]
    pub async fn execute(
        &self,
        command: WorkspaceCommand<ChangeMemberRoleInput>,
    ) -> Result<Membership> {
        let workspace_id = command.workspace_id();
        let actor_id = command.actor_id();
        let input = command.payload();

        let workspace = self
            .workspaces
            .find_by_id(workspace_id)
            .await?
            .ok_or_else(|| Error::not_found("workspace", workspace_id))?;
        if workspace.is_deleted() {
            return Err(Denial::WorkspaceDeleted {
                workspace_id: workspace_id.clone(),
            }
            .into_error());
        }

        let actor = PermissionChecker::new(&self.memberships)
            .require_permission(workspace_id, actor_id, Permission::ManagePermissions)
            .await?;

        let mut membership = self
            .memberships
            .find_by_workspace_and_account(workspace_id, &input.account_id)
            .await?
            .filter(|m| !m.is_terminated())
            .ok_or_else(|| {
                Error::not_found("membership", &input.account_id)
                    .with_context("workspace_id", workspace_id)
            })?;

        ensure_outranks(&actor, membership.role())?;
        ensure_outranks(&actor, input.role)?;

        let from = membership.role();
        membership.update_role(input.role)?;
        membership.update_permissions(input.role.default_permissions())?;

        self.memberships.save(&membership).await?;
        publish(&self.bus, &command, membership.take_events()).await;

        log::info!(
            target: "tenantry",
            "msg=\"member role changed\", workspace_id={workspace_id}, account_id={}, from={from}, to={}, changed_by={actor_id}",
            input.account_id,
            input.role
        );

        Ok(membership)
    }
}
