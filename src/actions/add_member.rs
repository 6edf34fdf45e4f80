use crate::error::{Error, Result};
use crate::events::EventBus;
use crate::guards::PermissionChecker;
use crate::membership::{Membership, MembershipRepository, Role};
use crate::messages::WorkspaceCommand;
use crate::permissions::Permission;
use crate::values::AccountId;
use crate::workspace::{Workspace, WorkspaceRepository};

use super::{ensure_outranks, publish};

/// Input data for inviting an account into a workspace.
#[derive(Debug, Clone)]
pub struct AddMemberInput {
    pub account_id: AccountId,
    pub role: Role,
}

#[derive(Debug, Clone)]
pub struct AddedMember {
    pub workspace: Workspace,
    /// Pending until the invitee accepts.
    pub membership: Membership,
}

/// Invites an account into a workspace.
///
/// The actor needs `member:invite` and must outrank the role being granted.
/// The invitation counts against the member quota straight away.
pub struct AddMemberAction<W, M, B>
where
    W: WorkspaceRepository,
    M: MembershipRepository,
    B: EventBus,
{
    workspaces: W,
    memberships: M,
    bus: B,
}

impl<W, M, B> AddMemberAction<W, M, B>
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

    /// # Returns
    ///
    /// - `Ok(added)` - Membership and workspace saved
    /// - `Err(NotFound)` - Workspace does not exist
    /// - `Err(Authorization)` - Actor lacks the permission or rank
    /// - `Err(Conflict)` - The account already has a live membership
    /// - `Err(QuotaExceeded)` - The workspace is full; the membership is
    ///   deleted again
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "add_member", skip_all, err)
    )]
    pub async fn execute(&self, command: WorkspaceCommand<AddMemberInput>) -> Result<AddedMember> {
        let workspace_id = command.workspace_id();
        let actor_id = command.actor_id();
        let input = command.payload();

        let mut workspace = self
            .workspaces
            .find_by_id(workspace_id)
            .await?
            .ok_or_else(|| Error::not_found("workspace", workspace_id))?;

        let actor = PermissionChecker::new(&self.memberships)
            .require_permission(workspace_id, actor_id, Permission::MemberInvite)
            .await?;
        ensure_outranks(&actor, input.role)?;

        let existing = self
            .memberships
            .find_by_workspace_and_account(workspace_id, &input.account_id)
            .await?;
        if existing.is_some_and(|m| !m.is_terminated()) {
            return Err(Error::conflict("membership", "account_id", &input.account_id)
                .with_context("workspace_id", workspace_id));
        }

        let mut membership = Membership::invite(
            workspace_id.clone(),
            input.account_id.clone(),
            input.role,
            actor_id.clone(),
        );
        self.memberships.save(&membership).await?;

        let stored = match workspace.add_member() {
            Ok(()) => self.workspaces.save(&workspace).await,
            Err(e) => Err(e),
        };
        let stored = match stored {
            Ok(stored) => stored,
            Err(e) => {
                if let Err(cleanup) = self.memberships.delete(membership.id()).await {
                    log::error!(
                        target: "tenantry",
                        "msg=\"failed to roll back invitation\", membership_id={}, error=\"{cleanup}\"",
                        membership.id()
                    );
                }
                log::warn!(
                    target: "tenantry",
                    "msg=\"member not added\", workspace_id={workspace_id}, account_id={}, error=\"{e}\"",
                    input.account_id
                );
                return Err(e);
            }
        };

        publish(&self.bus, &command, membership.take_events()).await;
        publish(&self.bus, &command, workspace.take_events()).await;

        log::info!(
            target: "tenantry",
            "msg=\"member invited\", workspace_id={workspace_id}, account_id={}, role={}, invited_by={actor_id}",
            input.account_id,
            input.role
        );

        Ok(AddedMember {
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
    use crate::membership::{MembershipStatus, MockMembershipRepository};
    use crate::quota::Quota;
    use crate::workspace::MockWorkspaceRepository;

    type Action = AddMemberAction<MockWorkspaceRepository, MockMembershipRepository, RecordingEventBus>;

    fn command(
        fixture: &Fixture,
        actor: &str,
        invitee: &str,
        role: Role,
    ) -> WorkspaceCommand<AddMemberInput> {
        WorkspaceCommand::workspace_command(
            account(actor),
            fixture.workspace.id().clone(),
            AddMemberInput {
                account_id: account(invitee),
                role,
            },
        )
    }

    fn action(fixture: &Fixture) -> Action {
        AddMemberAction::new(
            fixture.workspaces.clone(),
            fixture.memberships.clone(),
            fixture.bus.clone(),
        )
    }

    #[tokio::test]
    async fn test_owner_invites_member() {
        let fixture = Fixture::new(Quota::free()).await;

        let added = action(&fixture)
            .execute(command(&fixture, "owner", "bob", Role::Editor))
            .await
            .unwrap();

        assert_eq!(added.membership.status(), MembershipStatus::Pending);
        assert_eq!(added.membership.invited_by(), Some(&account("owner")));
        assert_eq!(added.workspace.member_count(), 2);
        assert_eq!(fixture.reload().await.member_count(), 2);
        assert_eq!(
            fixture.bus.event_types(),
            vec!["membership.invited", "workspace.member_joined"]
        );
    }

    #[tokio::test]
    async fn test_requires_invite_permission() {
        let mut fixture = Fixture::new(Quota::free()).await;
        fixture.join("viewer", Role::Viewer).await;

        let err = action(&fixture)
            .execute(command(&fixture, "viewer", "bob", Role::Guest))
            .await
            .unwrap_err();

        assert_eq!(err.code(), "authorization.insufficient_permission");
        assert!(fixture.membership("bob").await.is_none());
    }

    #[tokio::test]
    async fn test_cannot_grant_equal_role() {
        let mut fixture = Fixture::new(Quota::free()).await;
        fixture.join("admin", Role::Admin).await;

        let err = action(&fixture)
            .execute(command(&fixture, "admin", "bob", Role::Admin))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "authorization.insufficient_role");

        action(&fixture)
            .execute(command(&fixture, "admin", "bob", Role::Editor))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_existing_member_conflicts() {
        let mut fixture = Fixture::new(Quota::free()).await;
        fixture.join("bob", Role::Viewer).await;

        let err = action(&fixture)
            .execute(command(&fixture, "owner", "bob", Role::Editor))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "conflict");
    }

    #[tokio::test]
    async fn test_quota_failure_deletes_invitation() {
        let mut fixture = Fixture::new(Quota::free()).await;
        for name in ["a", "b", "c", "d"] {
            fixture.join(name, Role::Viewer).await;
        }
        fixture.bus.clear();

        let err = action(&fixture)
            .execute(command(&fixture, "owner", "bob", Role::Viewer))
            .await
            .unwrap_err();

        assert_eq!(err.code(), "quota_exceeded");
        assert!(fixture.membership("bob").await.is_none());
        assert_eq!(fixture.reload().await.member_count(), 5);
        assert!(fixture.bus.messages().is_empty());
    }

    #[tokio::test]
    async fn test_workspace_save_failure_deletes_invitation() {
        let fixture = Fixture::new(Quota::free()).await;
        fixture.workspaces.fail_saves(true);

        let err = action(&fixture)
            .execute(command(&fixture, "owner", "bob", Role::Viewer))
            .await
            .unwrap_err();

        assert_eq!(err.code(), "repository");
        assert!(fixture.membership("bob").await.is_none());
    }
}
