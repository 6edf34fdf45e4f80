use super::{Denial, GuardResult};
use crate::error::{QuotaType, Result};
use crate::quota::Quota;
use crate::values::WorkspaceId;
use crate::workspace::{Workspace, WorkspaceRepository};

/// Checks proposed usage against a stored workspace's quota.
///
/// Storage and project usage live outside the aggregate, so callers pass the
/// current figures in.
pub struct QuotaEnforcer<W: WorkspaceRepository> {
    workspaces: W,
}

impl<W: WorkspaceRepository> QuotaEnforcer<W> {
    pub fn new(workspaces: W) -> Self {
        Self { workspaces }
    }

    async fn with_quota(
        &self,
        workspace_id: &WorkspaceId,
        check: impl FnOnce(&Workspace, &Quota) -> std::result::Result<(), Denial>,
    ) -> Result<GuardResult> {
        let outcome = match self.workspaces.find_by_id(workspace_id).await? {
            None => Err(Denial::WorkspaceNotFound {
                workspace_id: workspace_id.clone(),
            }),
            Some(ws) if ws.is_deleted() => Err(Denial::WorkspaceDeleted {
                workspace_id: workspace_id.clone(),
            }),
            Some(ws) => check(&ws, ws.quota()),
        };
        Ok(outcome.into())
    }

    pub async fn can_add_member(&self, workspace_id: &WorkspaceId) -> Result<GuardResult> {
        self.with_quota(workspace_id, |ws, quota| {
            if quota.can_add_member(ws.member_count()) {
                Ok(())
            } else {
                Err(Denial::QuotaExceeded {
                    quota_type: QuotaType::Members,
                    current_usage: ws.member_count(),
                    limit: quota.max_members(),
                })
            }
        })
        .await
    }

    /// `current` and `delta` are in bytes.
    pub async fn can_increase_storage(
        &self,
        workspace_id: &WorkspaceId,
        current: u64,
        delta: u64,
    ) -> Result<GuardResult> {
        self.with_quota(workspace_id, |_, quota| {
            if quota.can_increase_storage(current, delta) {
                Ok(())
            } else {
                Err(Denial::QuotaExceeded {
                    quota_type: QuotaType::Storage,
                    current_usage: current,
                    limit: quota.max_storage(),
                })
            }
        })
        .await
    }

    pub async fn can_create_project(
        &self,
        workspace_id: &WorkspaceId,
        current_projects: u64,
    ) -> Result<GuardResult> {
        self.with_quota(workspace_id, |_, quota| {
            if quota.can_create_project(current_projects) {
                Ok(())
            } else {
                Err(Denial::QuotaExceeded {
                    quota_type: QuotaType::Projects,
                    current_usage: current_projects,
                    limit: quota.max_projects(),
                })
            }
        })
        .await
    }
}
