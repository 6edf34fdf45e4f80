use crate::error::{Error, Result};
use crate::events::EventBus;
use crate::guards::{Denial, PermissionChecker};
use crate::membership::{Membership, MembershipRepository, Role};
use crate::messages::WorkspaceCommand;
use crate::values::AccountId;
use crate::workspace::{Workspace, WorkspaceRepository};

use super::publish;

#[derive(Debug, Clone)]
pub struct TransferOwnershipInput {
    pub new_owner_id: AccountId,
}

#[derive(Debug, Clone)]
pub struct TransferredOwnership {
    pub workspace: Workspace,
    /// Now an admin.
    pub previous_owner: Membership,
    pub new_owner: Membership,
}

/// Hands a workspace to another active member.
///
/// The new owner takes the owner role and permissions; the previous owner
/// becomes an admin.
pub struct TransferOwnershipAction<W, M, B>
where
    W: WorkspaceRepository,
    M: MembershipRepository,
    B: EventBus,
{
    workspaces: W,
    memberships: M,
    bus: B,
}

impl<W, M, B> TransferOwnershipAction<W, M, B>
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
        tracing::instrument(name = "transfer_ownership", skip_all, err)
    )]
    pub async fn execute(
        &self,
        command: WorkspaceCommand<TransferOwnershipInput>,
    ) -> Result<TransferredOwnership> {
        let workspace_id = command.workspace_id();
        let actor_id = command.actor_id();
        let new_owner_id = &command.payload().new_owner_id;

        let mut workspace = self
            .workspaces
            .find_by_id(workspace_id)
            .await?
            .ok_or_else(|| Error::not_found("workspace", workspace_id))?;

        if !workspace.is_owner(actor_id) {
            return Err(Denial::NotOwner {
                account_id: actor_id.clone(),
                workspace_id: workspace_id.clone(),
            }
            .into_error());
        }
        if new_owner_id == actor_id {
            return Err(Error::business_rule(
                "already_owner",
                "the account already owns this workspace",
            )
            .with_context("workspace_id", workspace_id));
        }

        let checker = PermissionChecker::new(&self.memberships);
        let previous_original = checker
            .active_membership(workspace_id, actor_id)
            .await?
            .map_err(Denial::into_error)?;
        let new_original = checker
            .active_membership(workspace_id, new_owner_id)
            .await?
            .map_err(Denial::into_error)?;

        workspace.transfer_ownership(new_owner_id.clone())?;

        let mut new_owner = new_original.clone();
        new_owner.update_role(Role::Owner)?;
        new_owner.update_permissions(Role::Owner.default_permissions())?;

        let mut previous_owner = previous_original.clone();
        previous_owner.update_role(Role::Admin)?;
        previous_owner.update_permissions(Role::Admin.default_permissions())?;

        if let Err(e) = self.save_all(&new_owner, &previous_owner, &workspace).await {
            for original in [&new_original, &previous_original] {
                if let Err(restore) = self.memberships.save(original).await {
                    log::error!(
                        target: "tenantry",
                        "msg=\"failed to restore membership\", membership_id={}, error=\"{restore}\"",
                        original.id()
                    );
                }
            }
            return Err(e);
        }

        publish(&self.bus, &command, workspace.take_events()).await;
        publish(&self.bus, &command, new_owner.take_events()).await;
        publish(&self.bus, &command, previous_owner.take_events()).await;

        log::info!(
            target: "tenantry",
            "msg=\"ownership transferred\", workspace_id={workspace_id}, previous_owner={actor_id}, new_owner={new_owner_id}"
        );

        Ok(TransferredOwnership {
            workspace,
            previous_owner,
            new_owner,
        })
    }

    async fn save_all(
        &self,
        new_owner: &Membership,
        previous_owner: &Membership,
        workspace: &Workspace,
    ) -> Result<()> {
        self.memberships.save(new_owner).await?;
        self.memberships.save(previous_owner).await?;
        self.workspaces.save(workspace).await?;
        Ok(())
    }
}
