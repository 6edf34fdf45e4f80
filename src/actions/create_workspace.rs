use crate::error::{Error, Result};
use crate::events::EventBus;
use crate::membership::{Membership, MembershipRepository, Role};
use crate::messages::Command;
use crate::quota::Quota;
use crate::values::{AccountId, Slug};
use crate::workspace::{Workspace, WorkspaceIdentity, WorkspaceRepository, WorkspaceType};

use super::publish;

/// Input data for creating a workspace.
#[derive(Debug, Clone)]
pub struct CreateWorkspaceInput {
    pub name: String,
    /// Derived from `name` when absent.
    pub slug: Option<String>,
    pub workspace_type: WorkspaceType,
    pub quota: Quota,
    pub account_id: Option<AccountId>,
    pub context_id: Option<String>,
}

impl CreateWorkspaceInput {
    /// A free-tier workspace with a slug derived from `name`.
    pub fn new(name: impl Into<String>, workspace_type: WorkspaceType) -> Self {
        Self {
            name: name.into(),
            slug: None,
            workspace_type,
            quota: Quota::free(),
            account_id: None,
            context_id: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreatedWorkspace {
    pub workspace: Workspace,
    /// The actor's owner membership.
    pub owner: Membership,
}

/// Creates a workspace owned by the acting account.
///
/// This action:
/// 1. Validates the name and slug
/// 2. Rejects a slug that is already taken
/// 3. Saves the workspace and the owner membership
/// 4. Emits `workspace.created` and `membership.joined`
pub struct CreateWorkspaceAction<W, M, B>
where
    W: WorkspaceRepository,
    M: MembershipRepository,
    B: EventBus,
{
    workspaces: W,
    memberships: M,
    bus: B,
}

impl<W, M, B> CreateWorkspaceAction<W, M, B>
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
    /// - `Ok(created)` - Workspace and owner membership saved
    /// - `Err(Validation)` - Bad name or slug
    /// - `Err(Conflict)` - Slug already taken
    /// - `Err(Repository)` - Storage failure; nothing is left behind
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "create_workspace", skip_all, err)
    )]
    pub async fn execute(&self, command: Command<CreateWorkspaceInput>) -> Result<CreatedWorkspace> {
        let input = command.payload();
        let owner_id = command.actor_id().clone();

        let slug = match &input.slug {
            Some(slug) => Slug::new(slug)?,
            None => Slug::from_text(&input.name)?,
        };
        let identity = WorkspaceIdentity::new(&input.name, slug)?;

        if self.workspaces.is_slug_exists(identity.slug(), None).await? {
            return Err(Error::conflict("workspace", "slug", identity.slug()));
        }

        let mut workspace =
            Workspace::create(identity, input.workspace_type, input.quota, owner_id.clone());
        if let Some(account_id) = &input.account_id {
            workspace = workspace.with_account(account_id.clone());
        }
        if let Some(context_id) = &input.context_id {
            workspace = workspace.with_context(context_id.clone());
        }
        let mut owner = Membership::create(workspace.id().clone(), owner_id, Role::Owner);

        let workspace_events = workspace.take_events();
        let membership_events = owner.take_events();

        let stored = self.workspaces.save(&workspace).await?;
        if let Err(e) = self.memberships.save(&owner).await {
            if let Err(cleanup) = self.workspaces.delete(stored.id()).await {
                log::error!(
                    target: "tenantry",
                    "msg=\"failed to roll back workspace\", workspace_id={}, error=\"{cleanup}\"",
                    stored.id()
                );
            }
            return Err(e);
        }

        publish(&self.bus, &command, workspace_events).await;
        publish(&self.bus, &command, membership_events).await;

        log::info!(
            target: "tenantry",
            "msg=\"workspace created\", workspace_id={}, slug={}, owner_id={}",
            stored.id(),
            stored.slug(),
            stored.owner_id()
        );

        Ok(CreatedWorkspace {
            workspace: stored,
            owner,
        })
    }
}
