use async_trait::async_trait;

use super::Workspace;
use crate::error::Result;
use crate::pagination::{Page, Pagination};
use crate::values::{AccountId, Slug, WorkspaceId};

/// Storage for [`Workspace`] aggregates.
#[async_trait]
pub trait WorkspaceRepository: Send + Sync {
    async fn find_by_id(&self, id: &WorkspaceId) -> Result<Option<Workspace>>;

    async fn find_by_slug(&self, slug: &Slug) -> Result<Option<Workspace>>;

    /// Workspaces billed to or owned by `account_id`, deleted ones included.
    async fn find_by_account_id(
        &self,
        account_id: &AccountId,
        pagination: Pagination,
    ) -> Result<Page<Workspace>>;

    /// Upsert; returns the stored copy, without pending events.
    async fn save(&self, workspace: &Workspace) -> Result<Workspace>;

    async fn delete(&self, id: &WorkspaceId) -> Result<()>;

    async fn is_slug_exists(&self, slug: &Slug, exclude_id: Option<&WorkspaceId>) -> Result<bool>;

    async fn get_member_count(&self, id: &WorkspaceId) -> Result<u64>;
}

#[async_trait]
impl<T: WorkspaceRepository + ?Sized> WorkspaceRepository for &T {
    async fn find_by_id(&self, id: &WorkspaceId) -> Result<Option<Workspace>> {
        (**self).find_by_id(id).await
    }

    async fn find_by_slug(&self, slug: &Slug) -> Result<Option<Workspace>> {
        (**self).find_by_slug(slug).await
    }

    async fn find_by_account_id(
        &self,
        account_id: &AccountId,
        pagination: Pagination,
    ) -> Result<Page<Workspace>> {
        (**self).find_by_account_id(account_id, pagination).await
    }

    async fn save(&self, workspace: &Workspace) -> Result<Workspace> {
        (**self).save(workspace).await
    }

    async fn delete(&self, id: &WorkspaceId) -> Result<()> {
        (**self).delete(id).await
    }

    async fn is_slug_exists(&self, slug: &Slug, exclude_id: Option<&WorkspaceId>) -> Result<bool> {
        (**self).is_slug_exists(slug, exclude_id).await
    }

    async fn get_member_count(&self, id: &WorkspaceId) -> Result<u64> {
        (**self).get_member_count(id).await
    }
}
