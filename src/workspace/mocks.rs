#![allow(clippy::significant_drop_tightening)]

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use super::{Workspace, WorkspaceRepository};
use crate::error::{Error, Result};
use crate::pagination::{Page, Pagination};
use crate::values::{AccountId, Slug, WorkspaceId};

/// In-memory [`WorkspaceRepository`]. Clones share storage.
#[derive(Clone, Default)]
pub struct MockWorkspaceRepository {
    workspaces: Arc<RwLock<HashMap<WorkspaceId, Workspace>>>,
    fail_saves: Arc<RwLock<bool>>,
}

impl MockWorkspaceRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `save` fail with a repository error.
    pub fn fail_saves(&self, fail: bool) {
        if let Ok(mut flag) = self.fail_saves.write() {
            *flag = fail;
        }
    }

    pub fn len(&self) -> usize {
        self.workspaces.read().map(|w| w.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl WorkspaceRepository for MockWorkspaceRepository {
    async fn find_by_id(&self, id: &WorkspaceId) -> Result<Option<Workspace>> {
        let workspaces = self
            .workspaces
            .read()
            .map_err(|_| Error::repository("lock poisoned"))?;
        Ok(workspaces.get(id).cloned())
    }

    async fn find_by_slug(&self, slug: &Slug) -> Result<Option<Workspace>> {
        let workspaces = self
            .workspaces
            .read()
            .map_err(|_| Error::repository("lock poisoned"))?;
        Ok(workspaces.values().find(|w| w.slug() == slug).cloned())
    }

    async fn find_by_account_id(
        &self,
        account_id: &AccountId,
        pagination: Pagination,
    ) -> Result<Page<Workspace>> {
        let workspaces = self
            .workspaces
            .read()
            .map_err(|_| Error::repository("lock poisoned"))?;
        let mut found: Vec<Workspace> = workspaces
            .values()
            .filter(|w| w.account_id() == Some(account_id) || w.owner_id() == account_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| {
            a.created_at()
                .cmp(&b.created_at())
                .then_with(|| a.id().cmp(b.id()))
        });
        Ok(Page::paginate(found, pagination))
    }

    async fn save(&self, workspace: &Workspace) -> Result<Workspace> {
        let fail = *self
            .fail_saves
            .read()
            .map_err(|_| Error::repository("lock poisoned"))?;
        if fail {
            return Err(Error::repository("workspace store unavailable"));
        }

        let mut stored = workspace.clone();
        stored.take_events();

        let mut workspaces = self
            .workspaces
            .write()
            .map_err(|_| Error::repository("lock poisoned"))?;
        workspaces.insert(stored.id().clone(), stored.clone());
        Ok(stored)
    }

    async fn delete(&self, id: &WorkspaceId) -> Result<()> {
        let mut workspaces = self
            .workspaces
            .write()
            .map_err(|_| Error::repository("lock poisoned"))?;
        workspaces.remove(id);
        Ok(())
    }

    async fn is_slug_exists(&self, slug: &Slug, exclude_id: Option<&WorkspaceId>) -> Result<bool> {
        let workspaces = self
            .workspaces
            .read()
            .map_err(|_| Error::repository("lock poisoned"))?;
        Ok(workspaces
            .values()
            .any(|w| w.slug() == slug && Some(w.id()) != exclude_id))
    }

    async fn get_member_count(&self, id: &WorkspaceId) -> Result<u64> {
        let workspaces = self
            .workspaces
            .read()
            .map_err(|_| Error::repository("lock poisoned"))?;
        workspaces
            .get(id)
            .map(Workspace::member_count)
            .ok_or_else(|| Error::not_found("workspace", id))
    }
}
