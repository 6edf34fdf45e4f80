use async_trait::async_trait;

use super::{Membership, Role};
use crate::error::Result;
use crate::pagination::{Page, Pagination};
use crate::values::{AccountId, MembershipId, WorkspaceId};

/// Storage for [`Membership`] entities.
///
/// `save` is an upsert keyed by membership id. Lookups by workspace and
/// account return the live membership (pending, active or suspended) when one
/// exists, otherwise the most recent terminated one.
#[async_trait]
pub trait MembershipRepository: Send + Sync {
    async fn find_by_id(&self, id: &MembershipId) -> Result<Option<Membership>>;

    async fn find_by_workspace_and_account(
        &self,
        workspace_id: &WorkspaceId,
        account_id: &AccountId,
    ) -> Result<Option<Membership>>;

    /// Members of a workspace, optionally filtered by role.
    async fn find_by_workspace(
        &self,
        workspace_id: &WorkspaceId,
        pagination: Pagination,
        role: Option<Role>,
    ) -> Result<Page<Membership>>;

    async fn find_by_account(
        &self,
        account_id: &AccountId,
        pagination: Pagination,
    ) -> Result<Page<Membership>>;

    async fn save(&self, membership: &Membership) -> Result<()>;

    async fn delete(&self, id: &MembershipId) -> Result<()>;

    async fn find_owner(&self, workspace_id: &WorkspaceId) -> Result<Option<Membership>>;

    /// Only an active membership counts.
    async fn is_member(&self, workspace_id: &WorkspaceId, account_id: &AccountId) -> Result<bool> {
        Ok(self
            .find_by_workspace_and_account(workspace_id, account_id)
            .await?
            .is_some_and(|m| m.is_active()))
    }

    /// Role of the active membership, if any.
    async fn get_member_role(
        &self,
        workspace_id: &WorkspaceId,
        account_id: &AccountId,
    ) -> Result<Option<Role>> {
        Ok(self
            .find_by_workspace_and_account(workspace_id, account_id)
            .await?
            .filter(Membership::is_active)
            .map(|m| m.role()))
    }
}

#[async_trait]
impl<T: MembershipRepository + ?Sized> MembershipRepository for &T {
    async fn find_by_id(&self, id: &MembershipId) -> Result<Option<Membership>> {
        (**self).find_by_id(id).await
    }

    async fn find_by_workspace_and_account(
        &self,
        workspace_id: &WorkspaceId,
        account_id: &AccountId,
    ) -> Result<Option<Membership>> {
        (**self)
            .find_by_workspace_and_account(workspace_id, account_id)
            .await
    }

    async fn find_by_workspace(
        &self,
        workspace_id: &WorkspaceId,
        pagination: Pagination,
        role: Option<Role>,
    ) -> Result<Page<Membership>> {
        (**self)
            .find_by_workspace(workspace_id, pagination, role)
            .await
    }

    async fn find_by_account(
        &self,
        account_id: &AccountId,
        pagination: Pagination,
    ) -> Result<Page<Membership>> {
        (**self).find_by_account(account_id, pagination).await
    }

    async fn save(&self, membership: &Membership) -> Result<()> {
        (**self).save(membership).await
    }

    async fn delete(&self, id: &MembershipId) -> Result<()> {
        (**self).delete(id).await
    }

    async fn find_owner(&self, workspace_id: &WorkspaceId) -> Result<Option<Membership>> {
        (**self).find_owner(workspace_id).await
    }

    async fn is_member(&self, workspace_id: &WorkspaceId, account_id: &AccountId) -> Result<bool> {
        (**self).is_member(workspace_id, account_id).await
    }

    async fn get_member_role(
        &self,
        workspace_id: &WorkspaceId,
        account_id: &AccountId,
    ) -> Result<Option<Role>> {
        (**self).get_member_role(workspace_id, account_id).await
    }
}
