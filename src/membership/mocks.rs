#![allow(clippy::significant_drop_tightening)]

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use super::{Membership, MembershipRepository, Role};
use crate::error::{Error, Result};
use crate::pagination::{Page, Pagination};
use crate::values::{AccountId, MembershipId, WorkspaceId};

/// In-memory [`MembershipRepository`].
///
/// Clones share storage. Saved memberships are stored without their pending
/// events.
#[derive(Clone, Default)]
pub struct MockMembershipRepository {
    memberships: Arc<RwLock<HashMap<MembershipId, Membership>>>,
    fail_saves: Arc<RwLock<bool>>,
}

impl MockMembershipRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `save` fail with a repository error.
    pub fn fail_saves(&self, fail: bool) {
        if let Ok(mut flag) = self.fail_saves.write() {
            *flag = fail;
        }
    }

    /// Every stored membership, in creation order.
    pub fn all(&self) -> Vec<Membership> {
        self.sorted(|_| true).unwrap_or_default()
    }

    fn sorted(&self, keep: impl Fn(&Membership) -> bool) -> Result<Vec<Membership>> {
        let memberships = self
            .memberships
            .read()
            .map_err(|_| Error::repository("lock poisoned"))?;
        let mut found: Vec<Membership> = memberships.values().filter(|m| keep(m)).cloned().collect();
        found.sort_by(|a, b| {
            a.created_at()
                .cmp(&b.created_at())
                .then_with(|| a.id().cmp(b.id()))
        });
        Ok(found)
    }
}

#[async_trait]
impl MembershipRepository for MockMembershipRepository {
    async fn find_by_id(&self, id: &MembershipId) -> Result<Option<Membership>> {
        let memberships = self
            .memberships
            .read()
            .map_err(|_| Error::repository("lock poisoned"))?;
        Ok(memberships.get(id).cloned())
    }

    async fn find_by_workspace_and_account(
        &self,
        workspace_id: &WorkspaceId,
        account_id: &AccountId,
    ) -> Result<Option<Membership>> {
        let mut found = self.sorted(|m| {
            m.workspace_id() == workspace_id && m.account_id() == account_id
        })?;
        if let Some(pos) = found.iter().rposition(|m| !m.is_terminated()) {
            return Ok(Some(found.swap_remove(pos)));
        }
        Ok(found.pop())
    }

    async fn find_by_workspace(
        &self,
        workspace_id: &WorkspaceId,
        pagination: Pagination,
        role: Option<Role>,
    ) -> Result<Page<Membership>> {
        let found = self.sorted(|m| {
            m.workspace_id() == workspace_id && role.is_none_or(|r| m.role() == r)
        })?;
        Ok(Page::paginate(found, pagination))
    }

    async fn find_by_account(
        &self,
        account_id: &AccountId,
        pagination: Pagination,
    ) -> Result<Page<Membership>> {
        let found = self.sorted(|m| m.account_id() == account_id)?;
        Ok(Page::paginate(found, pagination))
    }

    async fn save(&self, membership: &Membership) -> Result<()> {
        let fail = *self
            .fail_saves
            .read()
            .map_err(|_| Error::repository("lock poisoned"))?;
        if fail {
            return Err(Error::repository("membership store unavailable"));
        }

        let mut stored = membership.clone();
        stored.take_events();

        let mut memberships = self
            .memberships
            .write()
            .map_err(|_| Error::repository("lock poisoned"))?;
        memberships.insert(stored.id().clone(), stored);
        Ok(())
    }

    async fn delete(&self, id: &MembershipId) -> Result<()> {
        let mut memberships = self
            .memberships
            .write()
            .map_err(|_| Error::repository("lock poisoned"))?;
        memberships.remove(id);
        Ok(())
    }

    async fn find_owner(&self, workspace_id: &WorkspaceId) -> Result<Option<Membership>> {
        let found = self.sorted(|m| {
            m.workspace_id() == workspace_id && m.is_owner() && m.is_active()
        })?;
        Ok(found.into_iter().next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ws() -> WorkspaceId {
        WorkspaceId::parse("ws-1").unwrap()
    }

    fn acct(id: &str) -> AccountId {
        AccountId::parse(id).unwrap()
    }

    #[tokio::test]
    async fn test_membership_queries_consider_active_only() {
        let repo = MockMembershipRepository::new();
        let mut invited = Membership::invite(ws(), acct("a"), Role::Editor, acct("owner"));
        repo.save(&invited).await.unwrap();

        assert!(!repo.is_member(&ws(), &acct("a")).await.unwrap());
        assert_eq!(repo.get_member_role(&ws(), &acct("a")).await.unwrap(), None);

        invited.activate().unwrap();
        repo.save(&invited).await.unwrap();

        assert!(repo.is_member(&ws(), &acct("a")).await.unwrap());
        assert_eq!(
            repo.get_member_role(&ws(), &acct("a")).await.unwrap(),
            Some(Role::Editor)
        );
    }

    #[tokio::test]
    async fn test_live_membership_preferred_over_terminated() {
        let repo = MockMembershipRepository::new();
        let mut old = Membership::create(ws(), acct("a"), Role::Viewer);
        old.remove().unwrap();
        repo.save(&old).await.unwrap();

        let current = Membership::create(ws(), acct("a"), Role::Editor);
        repo.save(&current).await.unwrap();

        let found = repo
            .find_by_workspace_and_account(&ws(), &acct("a"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id(), current.id());
    }

    #[tokio::test]
    async fn test_find_by_workspace_filters_role() {
        let repo = MockMembershipRepository::new();
        repo.save(&Membership::create(ws(), acct("o"), Role::Owner))
            .await
            .unwrap();
        repo.save(&Membership::create(ws(), acct("e"), Role::Editor))
            .await
            .unwrap();

        let editors = repo
            .find_by_workspace(&ws(), Pagination::default(), Some(Role::Editor))
            .await
            .unwrap();
        assert_eq!(editors.total_count, 1);

        let owner = repo.find_owner(&ws()).await.unwrap().unwrap();
        assert_eq!(owner.account_id(), &acct("o"));
    }

    #[tokio::test]
    async fn test_saved_copy_has_no_pending_events() {
        let repo = MockMembershipRepository::new();
        let m = Membership::create(ws(), acct("a"), Role::Viewer);
        repo.save(&m).await.unwrap();

        let stored = repo.find_by_id(m.id()).await.unwrap().unwrap();
        assert!(stored.pending_events().is_empty());
        assert_eq!(m.pending_events().len(), 1);
    }

    #[tokio::test]
    async fn test_fail_saves() {
        let repo = MockMembershipRepository::new();
        repo.fail_saves(true);
        let err = repo
            .save(&Membership::create(ws(), acct("a"), Role::Viewer))
            .await
            .unwrap_err();
        assert!(err.is_retryable());
    }
}
