use crate::error::{Error, Result};
use crate::events::EventBus;
use crate::membership::{Membership, MembershipRepository};
use crate::messages::WorkspaceCommand;
use crate::workspace::WorkspaceRepository;

use super::publish;

/// Turns the actor's pending invitation into an active membership.
pub struct AcceptInvitationAction<W, M, B>
where
    W: WorkspaceRepository,
    M: MembershipRepository,
    B: EventBus,
{
    workspaces: W,
    memberships: M,
    bus: B,
}

impl<W, M, B> AcceptInvitationAction<W, M, B>
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
        tracing::instrument(name = "accept_invitation", skip_all, err)
    )]
    pub async fn execute(&self, command: WorkspaceCommand<()>) -> Result<Membership> {
        let workspace_id = command.workspace_id();
        let actor_id = command.actor_id();

        let workspace = self
            .workspaces
            .find_by_id(workspace_id)
            .await?
            .ok_or_else(|| Error::not_found("workspace", workspace_id))?;
        if workspace.is_deleted() {
            return Err(Error::business_rule(
                "workspace_deleted",
                "the workspace has been deleted",
            )
            .with_context("workspace_id", workspace_id));
        }

        let mut membership = self
            .memberships
            .find_by_workspace_and_account(workspace_id, actor_id)
            .await?
            .filter(Membership::is_pending)
            .ok_or_else(|| {
                Error::not_found("invitation", actor_id).with_context("workspace_id", workspace_id)
            })?;

        membership.activate()?;
        self.memberships.save(&membership).await?;
        publish(&self.bus, &command, membership.take_events()).await;

        log::info!(
            target: "tenantry",
            "msg=\"invitation accepted\", workspace_id={workspace_id}, account_id={actor_id}, role={}",
            membership.role()
        );

        Ok(membership)
    }
}
