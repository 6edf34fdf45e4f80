use crate::error::{Error, Result};
use crate::events::EventBus;
use crate::guards::PermissionChecker;
use crate::lifecycle::StateMachine;
use crate::membership::{Membership, MembershipRepository};
use crate::messages::WorkspaceCommand;
use crate::permissions::Permission;
use crate::values::AccountId;
use crate::workspace::{Workspace, WorkspaceRepository};

use super::{ensure_outranks, publish};

#[derive(Debug, Clone)]
pub struct RemoveMemberInput {
    pub account_id: AccountId,
}

#[derive(Debug, Clone)]
pub struct RemovedMember {
    pub workspace: Workspace,
    pub membership: Membership,
}

/// Takes a member out of a workspace.
///
/// A member removing themself leaves (or declines a pending invitation).
/// Removing someone else needs `member:remove` and a higher role than the
/// target's. The owner can never be removed; ownership has to be transferred
/// first.
pub struct RemoveMemberAction<W, M, B>
where
    W: WorkspaceRepository,
    M: MembershipRepository,
    B: EventBus,
{
    workspaces: W,
    memberships: M,
    bus: B,
}

impl<W, M, B> RemoveMemberAction<W, M, B>
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
        tracing::instrument(name = "remove_member", skip_all, err)
    )]
    pub async fn execute(
        &self,
        command: WorkspaceCommand<RemoveMemberInput>,
    ) -> Result<RemovedMember> {
        let workspace_id = command.workspace_id();
        let actor_id = command.actor_id();
        let target_id = &command.payload().account_id;

        let mut workspace = self
            .workspaces
            .find_by_id(workspace_id)
            .await?
            .ok_or_else(|| Error::not_found("workspace", workspace_id))?;

        if workspace.is_owner(target_id) {
            return Err(Error::business_rule(
                "owner_cannot_be_removed",
                "transfer ownership before removing the owner",
            )
            .with_context("workspace_id", workspace_id));
        }

        let original = self
            .memberships
            .find_by_workspace_and_account(workspace_id, target_id)
            .await?
            .filter(|m| !m.is_terminated())
            .ok_or_else(|| {
                Error::not_found("membership", target_id).with_context("workspace_id", workspace_id)
            })?;
        let mut membership = original.clone();

        if target_id == actor_id {
            if membership.is_pending() {
                membership.remove()?;
            } else {
                membership.leave()?;
            }
        } else {
            let actor = PermissionChecker::new(&self.memberships)
                .require_permission(workspace_id, actor_id, Permission::MemberRemove)
                .await?;
            ensure_outranks(&actor, membership.role())?;
            membership.remove()?;
        }

        self.memberships.save(&membership).await?;

        let stored = match workspace.remove_member() {
            Ok(()) => self.workspaces.save(&workspace).await,
            Err(e) => Err(e),
        };
        let stored = match stored {
            Ok(stored) => stored,
            Err(e) => {
                if let Err(restore) = self.memberships.save(&original).await {
                    log::error!(
                        target: "tenantry",
                        "msg=\"failed to restore membership\", membership_id={}, error=\"{restore}\"",
                        original.id()
                    );
                }
                return Err(e);
            }
        };

        publish(&self.bus, &command, membership.take_events()).await;
        publish(&self.bus, &command, workspace.take_events()).await;

        log::info!(
            target: "tenantry",
            "msg=\"member removed\", workspace_id={workspace_id}, account_id={target_id}, status={}, removed_by={actor_id}",
            membership.status().as_str()
        );

        Ok(RemovedMember {
            workspace: stored,
            membership,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::testing::{Fixture, account};
    use crate::events::RecordingEventBus;
    use crate::membership::{MembershipStatus, MockMembershipRepository, Role};
    use crate::quota::Quota;
    use crate::workspace::MockWorkspaceRepository;

    type Action =
        RemoveMemberAction<MockWorkspaceRepository, MockMembershipRepository, RecordingEventBus>;

    fn action(fixture: &Fixture) -> Action {
        RemoveMemberAction::new(
            fixture.workspaces.clone(),
            fixture.memberships.clone(),
            fixture.bus.clone(),
        )
    }

    fn command(fixture: &Fixture, actor: &str, target: &str) -> WorkspaceCommand<RemoveMemberInput> {
        WorkspaceCommand::workspace_command(
            account(actor),
            fixture.workspace.id().clone(),
            RemoveMemberInput {
                account_id: account(target),
            },
        )
    }

    #[tokio::test]
    async fn test_admin_removes_editor() {
        let mut fixture = Fixture::new(Quota::free()).await;
        fixture.join("admin", Role::Admin).await;
        fixture.join("bob", Role::Editor).await;

        let removed = action(&fixture)
            .execute(command(&fixture, "admin", "bob"))
            .await
            .unwrap();

        assert_eq!(removed.membership.status(), MembershipStatus::Removed);
        assert_eq!(removed.workspace.member_count(), 2);
        assert_eq!(
            fixture.bus.event_types(),
            vec!["membership.removed", "workspace.member_left"]
        );
    }

    #[tokio::test]
    async fn test_member_leaves() {
        let mut fixture = Fixture::new(Quota::free()).await;
        fixture.join("bob", Role::Viewer).await;

        let removed = action(&fixture)
            .execute(command(&fixture, "bob", "bob"))
            .await
            .unwrap();

        assert_eq!(removed.membership.status(), MembershipStatus::Left);
        assert_eq!(fixture.reload().await.member_count(), 1);
    }

    #[tokio::test]
    async fn test_cannot_remove_peer() {
        let mut fixture = Fixture::new(Quota::free()).await;
        fixture.join("admin", Role::Admin).await;
        fixture.join("other", Role::Admin).await;

        let err = action(&fixture)
            .execute(command(&fixture, "admin", "other"))
            .await
            .unwrap_err();

        assert_eq!(err.code(), "authorization.insufficient_role");
        assert!(fixture.membership("other").await.unwrap().is_active());
    }

    #[tokio::test]
    async fn test_owner_cannot_be_removed() {
        let fixture = Fixture::new(Quota::free()).await;

        let err = action(&fixture)
            .execute(command(&fixture, "owner", "owner"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "business_rule_violation");
    }

    #[tokio::test]
    async fn test_failed_save_restores_membership() {
        let mut fixture = Fixture::new(Quota::free()).await;
        fixture.join("bob", Role::Viewer).await;
        fixture.workspaces.fail_saves(true);

        assert!(
            action(&fixture)
                .execute(command(&fixture, "owner", "bob"))
                .await
                .is_err()
        );
        assert!(fixture.membership("bob").await.unwrap().is_active());
    }
}
