use super::{Denial, GuardResult};
use crate::error::Result;
use crate::membership::{Membership, MembershipRepository, Role};
use crate::permissions::{Permission, Permissions};
use crate::values::{AccountId, WorkspaceId};

/// Answers "may this account do X in this workspace?" from its membership.
///
/// Only an active membership grants anything. Repository failures propagate
/// as errors; a denial is a normal [`GuardResult`].
pub struct PermissionChecker<M: MembershipRepository> {
    memberships: M,
}

impl<M: MembershipRepository> PermissionChecker<M> {
    pub fn new(memberships: M) -> Self {
        Self { memberships }
    }

    /// The caller's active membership, or why there is none.
    pub async fn active_membership(
        &self,
        workspace_id: &WorkspaceId,
        account_id: &AccountId,
    ) -> Result<std::result::Result<Membership, Denial>> {
        let membership = self
            .memberships
            .find_by_workspace_and_account(workspace_id, account_id)
            .await?;

        Ok(match membership {
            None => Err(Denial::NotMember {
                account_id: account_id.clone(),
                workspace_id: workspace_id.clone(),
            }),
            Some(m) if !m.is_active() => Err(Denial::MembershipInactive {
                account_id: account_id.clone(),
                status: m.status(),
            }),
            Some(m) => Ok(m),
        })
    }

    async fn check(
        &self,
        workspace_id: &WorkspaceId,
        account_id: &AccountId,
        rule: impl FnOnce(&Membership) -> std::result::Result<(), Denial>,
    ) -> Result<GuardResult> {
        let outcome = self
            .active_membership(workspace_id, account_id)
            .await?
            .and_then(|m| rule(&m));
        Ok(outcome.into())
    }

    pub async fn has_permission(
        &self,
        workspace_id: &WorkspaceId,
        account_id: &AccountId,
        permission: Permission,
    ) -> Result<GuardResult> {
        self.check(workspace_id, account_id, |m| {
            if m.has_permission(permission) {
                Ok(())
            } else {
                Err(Denial::MissingPermission {
                    account_id: account_id.clone(),
                    required: Permissions::none().add(permission),
                })
            }
        })
        .await
    }

    /// Allowed when at least one of `permissions` is held.
    pub async fn has_any_permission(
        &self,
        workspace_id: &WorkspaceId,
        account_id: &AccountId,
        permissions: &[Permission],
    ) -> Result<GuardResult> {
        self.check(workspace_id, account_id, |m| {
            if m.has_any_permission(permissions) {
                Ok(())
            } else {
                Err(Denial::MissingPermission {
                    account_id: account_id.clone(),
                    required: Permissions::from_flags(permissions),
                })
            }
        })
        .await
    }

    pub async fn has_all_permissions(
        &self,
        workspace_id: &WorkspaceId,
        account_id: &AccountId,
        permissions: &[Permission],
    ) -> Result<GuardResult> {
        self.check(workspace_id, account_id, |m| {
            if m.has_all_permissions(permissions) {
                Ok(())
            } else {
                let missing: Permissions = permissions
                    .iter()
                    .copied()
                    .filter(|p| !m.has_permission(*p))
                    .collect();
                Err(Denial::MissingPermission {
                    account_id: account_id.clone(),
                    required: missing,
                })
            }
        })
        .await
    }

    /// Allowed when the member's role is `minimum` or higher.
    pub async fn has_role(
        &self,
        workspace_id: &WorkspaceId,
        account_id: &AccountId,
        minimum: Role,
    ) -> Result<GuardResult> {
        self.check(workspace_id, account_id, |m| {
            if m.role().is_at_least(minimum) {
                Ok(())
            } else {
                Err(Denial::InsufficientRole {
                    account_id: account_id.clone(),
                    required: minimum,
                    actual: m.role(),
                })
            }
        })
        .await
    }

    pub async fn is_owner(
        &self,
        workspace_id: &WorkspaceId,
        account_id: &AccountId,
    ) -> Result<GuardResult> {
        self.check(workspace_id, account_id, |m| {
            if m.is_owner() {
                Ok(())
            } else {
                Err(Denial::NotOwner {
                    account_id: account_id.clone(),
                    workspace_id: workspace_id.clone(),
                })
            }
        })
        .await
    }

    /// Admins and owners.
    pub async fn is_admin(
        &self,
        workspace_id: &WorkspaceId,
        account_id: &AccountId,
    ) -> Result<GuardResult> {
        self.has_role(workspace_id, account_id, Role::Admin).await
    }

    /// Like [`has_permission`](Self::has_permission) but returns the
    /// membership on success and the matching error on denial.
    pub async fn require_permission(
        &self,
        workspace_id: &WorkspaceId,
        account_id: &AccountId,
        permission: Permission,
    ) -> Result<Membership> {
        let membership = self
            .active_membership(workspace_id, account_id)
            .await?
            .map_err(Denial::into_error)?;

        if !membership.has_permission(permission) {
            return Err(Denial::MissingPermission {
                account_id: account_id.clone(),
                required: Permissions::none().add(permission),
            }
            .into_error()
            .with_context("workspace_id", workspace_id));
        }
        Ok(membership)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::membership::MockMembershipRepository;

    fn ws() -> WorkspaceId {
        WorkspaceId::parse("ws-1").unwrap()
    }

    fn acct(id: &str) -> AccountId {
        AccountId::parse(id).unwrap()
    }

    async fn setup() -> MockMembershipRepository {
        let repo = MockMembershipRepository::new();
        repo.save(&Membership::create(ws(), acct("owner"), Role::Owner))
            .await
            .unwrap();
        repo.save(&Membership::create(ws(), acct("editor"), Role::Editor))
            .await
            .unwrap();

        let mut suspended = Membership::create(ws(), acct("suspended"), Role::Admin);
        suspended.suspend().unwrap();
        repo.save(&suspended).await.unwrap();
        repo
    }

    #[tokio::test]
    async fn test_has_permission() {
        let checker = PermissionChecker::new(setup().await);

        let allowed = checker
            .has_permission(&ws(), &acct("editor"), Permission::DocumentWrite)
            .await
            .unwrap();
        assert!(allowed.is_allowed());

        let denied = checker
            .has_permission(&ws(), &acct("editor"), Permission::MemberInvite)
            .await
            .unwrap();
        assert_eq!(denied.reason.as_ref().map(Denial::code), Some("missing_permission"));
    }

    #[tokio::test]
    async fn test_non_member_and_inactive_are_denied() {
        let checker = PermissionChecker::new(setup().await);

        let stranger = checker
            .has_permission(&ws(), &acct("stranger"), Permission::WorkspaceRead)
            .await
            .unwrap();
        assert_eq!(stranger.reason.as_ref().map(Denial::code), Some("not_member"));

        let suspended = checker
            .has_permission(&ws(), &acct("suspended"), Permission::WorkspaceRead)
            .await
            .unwrap();
        assert_eq!(
            suspended.reason.as_ref().map(Denial::code),
            Some("membership_inactive")
        );
    }

    #[tokio::test]
    async fn test_any_and_all() {
        let checker = PermissionChecker::new(setup().await);
        let flags = [Permission::DocumentWrite, Permission::ManageBilling];

        assert!(
            checker
                .has_any_permission(&ws(), &acct("editor"), &flags)
                .await
                .unwrap()
                .is_allowed()
        );

        let all = checker
            .has_all_permissions(&ws(), &acct("editor"), &flags)
            .await
            .unwrap();
        assert_eq!(
            all.reason,
            Some(Denial::MissingPermission {
                account_id: acct("editor"),
                required: Permissions::none().add(Permission::ManageBilling),
            })
        );
    }

    #[tokio::test]
    async fn test_roles() {
        let checker = PermissionChecker::new(setup().await);

        assert!(checker.is_owner(&ws(), &acct("owner")).await.unwrap().is_allowed());
        assert!(checker.is_admin(&ws(), &acct("owner")).await.unwrap().is_allowed());
        assert!(checker.is_admin(&ws(), &acct("editor")).await.unwrap().is_denied());
        assert!(
            checker
                .has_role(&ws(), &acct("editor"), Role::Viewer)
                .await
                .unwrap()
                .is_allowed()
        );
    }

    #[tokio::test]
    async fn test_require_permission() {
        let checker = PermissionChecker::new(setup().await);

        let membership = checker
            .require_permission(&ws(), &acct("owner"), Permission::MemberRemove)
            .await
            .unwrap();
        assert!(membership.is_owner());

        let err = checker
            .require_permission(&ws(), &acct("editor"), Permission::MemberRemove)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "authorization.insufficient_permission");
    }
}
