use super::{Denial, GuardResult, PermissionChecker};
use crate::error::Result;
use crate::membership::{Membership, MembershipRepository};
use crate::permissions::Permission;
use crate::values::{AccountId, WorkspaceId};
use crate::workspace::{Workspace, WorkspaceRepository};

/// Workspace-level access checks: existence and lifecycle first, then the
/// caller's membership.
pub struct WorkspaceGuard<W, M>
where
    W: WorkspaceRepository,
    M: MembershipRepository,
{
    workspaces: W,
    permissions: PermissionChecker<M>,
}

impl<W, M> WorkspaceGuard<W, M>
where
    W: WorkspaceRepository,
    M: MembershipRepository,
{
    pub fn new(workspaces: W, memberships: M) -> Self {
        Self {
            workspaces,
            permissions: PermissionChecker::new(memberships),
        }
    }

    async fn live_workspace(
        &self,
        workspace_id: &WorkspaceId,
    ) -> Result<std::result::Result<Workspace, Denial>> {
        Ok(match self.workspaces.find_by_id(workspace_id).await? {
            None => Err(Denial::WorkspaceNotFound {
                workspace_id: workspace_id.clone(),
            }),
            Some(ws) if ws.is_deleted() => Err(Denial::WorkspaceDeleted {
                workspace_id: workspace_id.clone(),
            }),
            Some(ws) => Ok(ws),
        })
    }

    /// The workspace and the caller's active membership, or why not.
    pub async fn access(
        &self,
        workspace_id: &WorkspaceId,
        account_id: &AccountId,
    ) -> Result<std::result::Result<(Workspace, Membership), Denial>> {
        let workspace = match self.live_workspace(workspace_id).await? {
            Ok(ws) => ws,
            Err(denial) => return Ok(Err(denial)),
        };
        let membership = self
            .permissions
            .active_membership(workspace_id, account_id)
            .await?;
        Ok(membership.map(|m| (workspace, m)))
    }

    /// Read access: the workspace exists, is not deleted, and the caller is an
    /// active member. Archived workspaces stay readable.
    pub async fn can_access(
        &self,
        workspace_id: &WorkspaceId,
        account_id: &AccountId,
    ) -> Result<GuardResult> {
        Ok(self.access(workspace_id, account_id).await?.map(|_| ()).into())
    }

    /// Write access: additionally requires an active workspace and
    /// `WorkspaceWrite`.
    pub async fn can_modify(
        &self,
        workspace_id: &WorkspaceId,
        account_id: &AccountId,
    ) -> Result<GuardResult> {
        let outcome = self
            .access(workspace_id, account_id)
            .await?
            .and_then(|(ws, m)| {
                if !ws.is_active() {
                    return Err(Denial::WorkspaceNotActive {
                        workspace_id: workspace_id.clone(),
                        lifecycle: ws.lifecycle(),
                    });
                }
                if !m.has_permission(Permission::WorkspaceWrite) {
                    return Err(Denial::MissingPermission {
                        account_id: account_id.clone(),
                        required: Permission::WorkspaceWrite.into(),
                    });
                }
                Ok(())
            });
        Ok(outcome.into())
    }

    /// Only the workspace owner, holding `WorkspaceDelete`, may delete it.
    pub async fn can_delete(
        &self,
        workspace_id: &WorkspaceId,
        account_id: &AccountId,
    ) -> Result<GuardResult> {
        let outcome = self
            .access(workspace_id, account_id)
            .await?
            .and_then(|(ws, m)| {
                if !ws.is_owner(account_id) {
                    return Err(Denial::NotOwner {
                        account_id: account_id.clone(),
                        workspace_id: workspace_id.clone(),
                    });
                }
                if !m.has_permission(Permission::WorkspaceDelete) {
                    return Err(Denial::MissingPermission {
                        account_id: account_id.clone(),
                        required: Permission::WorkspaceDelete.into(),
                    });
                }
                Ok(())
            });
        Ok(outcome.into())
    }

    /// Inviting or removing members needs either member-management flag.
    pub async fn can_manage_members(
        &self,
        workspace_id: &WorkspaceId,
        account_id: &AccountId,
    ) -> Result<GuardResult> {
        let outcome = self
            .access(workspace_id, account_id)
            .await?
            .and_then(|(_, m)| {
                let flags = [Permission::MemberInvite, Permission::MemberRemove];
                if m.has_any_permission(&flags) {
                    Ok(())
                } else {
                    Err(Denial::MissingPermission {
                        account_id: account_id.clone(),
                        required: flags.into_iter().collect(),
                    })
                }
            });
        Ok(outcome.into())
    }

    pub fn permissions(&self) -> &PermissionChecker<M> {
        &self.permissions
    }
}
