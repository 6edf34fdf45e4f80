use serde::{Deserialize, Serialize};

use super::events::WorkspaceEvent;
use crate::error::{Error, FieldError, QuotaType, Result};
use crate::lifecycle::{Lifecycle, StateMachine};
use crate::messages::DomainEvent;
use crate::quota::Quota;
use crate::values::{AccountId, Slug, Timestamp, WorkspaceId};

const MAX_NAME_LEN: usize = 100;

/// Event type queued by [`Workspace`] mutators.
pub type WorkspaceDomainEvent = DomainEvent<WorkspaceEvent, WorkspaceId>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkspaceType {
    Personal,
    Team,
    Enterprise,
}

/// Display name plus URL slug.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawIdentity")]
pub struct WorkspaceIdentity {
    name: String,
    slug: Slug,
}

impl WorkspaceIdentity {
    pub fn new(name: impl AsRef<str>, slug: Slug) -> Result<Self> {
        let name = name.as_ref().trim();
        if name.is_empty() {
            return Err(Error::validation(FieldError::RequiredField { field: "name" }));
        }
        let len = name.chars().count();
        if len > MAX_NAME_LEN {
            return Err(Error::validation(FieldError::InvalidLength {
                field: "name",
                min: 1,
                max: MAX_NAME_LEN,
                actual: len,
            }));
        }

        Ok(Self {
            name: name.to_owned(),
            slug,
        })
    }

    /// Derive the slug from the name.
    pub fn from_name(name: impl AsRef<str>) -> Result<Self> {
        let slug = Slug::from_text(name.as_ref())?;
        Self::new(name, slug)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn slug(&self) -> &Slug {
        &self.slug
    }
}

#[derive(Deserialize)]
struct RawIdentity {
    name: String,
    slug: Slug,
}

impl TryFrom<RawIdentity> for WorkspaceIdentity {
    type Error = Error;

    fn try_from(raw: RawIdentity) -> Result<Self> {
        Self::new(raw.name, raw.slug)
    }
}

/// The collaboration boundary: identity, type, quota, lifecycle and member
/// count.
///
/// Always has at least one member. An archived workspace carries
/// `archived_at`; a deleted one accepts no further mutation but stays
/// readable. Mutators queue [`WorkspaceDomainEvent`]s, drained with
/// [`Workspace::take_events`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "WorkspaceRecord", into = "WorkspaceRecord")]
pub struct Workspace {
    id: WorkspaceId,
    identity: WorkspaceIdentity,
    workspace_type: WorkspaceType,
    lifecycle: Lifecycle,
    quota: Quota,
    owner_id: AccountId,
    account_id: Option<AccountId>,
    context_id: Option<String>,
    member_count: u64,
    created_at: Timestamp,
    updated_at: Timestamp,
    last_accessed_at: Option<Timestamp>,
    archived_at: Option<Timestamp>,
    pending_events: Vec<WorkspaceDomainEvent>,
}

/// Persisted shape of a [`Workspace`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceRecord {
    pub id: WorkspaceId,
    pub identity: WorkspaceIdentity,
    pub workspace_type: WorkspaceType,
    pub lifecycle: Lifecycle,
    pub quota: Quota,
    pub owner_id: AccountId,
    pub account_id: Option<AccountId>,
    pub context_id: Option<String>,
    pub member_count: u64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub last_accessed_at: Option<Timestamp>,
    pub archived_at: Option<Timestamp>,
}

impl Workspace {
    /// A new active workspace whose only member is the owner.
    pub fn create(
        identity: WorkspaceIdentity,
        workspace_type: WorkspaceType,
        quota: Quota,
        owner_id: AccountId,
    ) -> Self {
        let now = Timestamp::now();
        let mut workspace = Self {
            id: WorkspaceId::generate(),
            identity,
            workspace_type,
            lifecycle: Lifecycle::Active,
            quota,
            owner_id,
            account_id: None,
            context_id: None,
            member_count: 1,
            created_at: now,
            updated_at: now,
            last_accessed_at: None,
            archived_at: None,
            pending_events: Vec::new(),
        };

        workspace.raise(workspace.created_event());
        workspace
    }

    /// Billing account the workspace belongs to.
    ///
    /// A still-pending `Created` event is updated to carry it.
    #[must_use]
    pub fn with_account(self, account_id: AccountId) -> Self {
        Self {
            account_id: Some(account_id),
            ..self
        }
        .restate_created()
    }

    /// Organization, team or partner context that owns the workspace.
    ///
    /// A still-pending `Created` event is updated to carry it.
    #[must_use]
    pub fn with_context(self, context_id: impl Into<String>) -> Self {
        Self {
            context_id: Some(context_id.into()),
            ..self
        }
        .restate_created()
    }

    fn created_event(&self) -> WorkspaceEvent {
        WorkspaceEvent::Created {
            name: self.identity.name.clone(),
            slug: self.identity.slug.clone(),
            workspace_type: self.workspace_type,
            owner_id: self.owner_id.clone(),
            account_id: self.account_id.clone(),
            context_id: self.context_id.clone(),
        }
    }

    fn restate_created(mut self) -> Self {
        let event = DomainEvent::new(self.id.clone(), self.created_event());
        if let Some(slot) = self
            .pending_events
            .iter_mut()
            .find(|e| matches!(e.payload(), WorkspaceEvent::Created { .. }))
        {
            *slot = event;
        }
        self
    }

    /// Rebuild from storage, re-checking every invariant.
    pub fn restore(record: WorkspaceRecord) -> Result<Self> {
        if record.member_count == 0 {
            return Err(Error::validation(FieldError::OutOfRange {
                field: "member_count",
                value: record.member_count.to_string(),
                constraint: ">= 1".to_owned(),
            }));
        }
        if !matches!(
            record.lifecycle,
            Lifecycle::Active | Lifecycle::Archived | Lifecycle::Deleted
        ) {
            return Err(Error::validation(FieldError::InvalidFormat {
                field: "lifecycle",
                expected: "active, archived or deleted",
            }));
        }
        if record.lifecycle == Lifecycle::Archived && record.archived_at.is_none() {
            return Err(Error::validation(FieldError::RequiredField {
                field: "archived_at",
            }));
        }
        if record.lifecycle == Lifecycle::Active && record.archived_at.is_some() {
            return Err(Error::business_rule(
                "archived_at_without_archive",
                "an active workspace cannot carry archived_at",
            )
            .with_context("workspace_id", &record.id));
        }

        Ok(Self {
            id: record.id,
            identity: record.identity,
            workspace_type: record.workspace_type,
            lifecycle: record.lifecycle,
            quota: record.quota,
            owner_id: record.owner_id,
            account_id: record.account_id,
            context_id: record.context_id,
            member_count: record.member_count,
            created_at: record.created_at,
            updated_at: record.updated_at,
            last_accessed_at: record.last_accessed_at,
            archived_at: record.archived_at,
            pending_events: Vec::new(),
        })
    }

    pub fn to_record(&self) -> WorkspaceRecord {
        WorkspaceRecord {
            id: self.id.clone(),
            identity: self.identity.clone(),
            workspace_type: self.workspace_type,
            lifecycle: self.lifecycle,
            quota: self.quota,
            owner_id: self.owner_id.clone(),
            account_id: self.account_id.clone(),
            context_id: self.context_id.clone(),
            member_count: self.member_count,
            created_at: self.created_at,
            updated_at: self.updated_at,
            last_accessed_at: self.last_accessed_at,
            archived_at: self.archived_at,
        }
    }

    fn raise(&mut self, event: WorkspaceEvent) {
        self.pending_events
            .push(DomainEvent::new(self.id.clone(), event));
    }

    fn touch(&mut self) {
        self.updated_at = Timestamp::now();
    }

    fn ensure_not_deleted(&self, operation: &str) -> Result<()> {
        if self.lifecycle.is_deleted() {
            return Err(Error::business_rule(
                "workspace_deleted",
                format!("cannot {operation} a deleted workspace"),
            )
            .with_context("workspace_id", &self.id));
        }
        Ok(())
    }

    pub fn update_identity(&mut self, identity: WorkspaceIdentity) -> Result<()> {
        self.ensure_not_deleted("rename")?;

        let mut changes = Vec::new();
        if identity.name != self.identity.name {
            changes.push("name");
        }
        if identity.slug != self.identity.slug {
            changes.push("slug");
        }
        if changes.is_empty() {
            return Ok(());
        }

        self.identity = identity;
        self.touch();
        self.raise(WorkspaceEvent::Updated { changes });
        Ok(())
    }

    pub fn update_type(&mut self, workspace_type: WorkspaceType) -> Result<()> {
        self.ensure_not_deleted("change the type of")?;
        if self.workspace_type == workspace_type {
            return Ok(());
        }

        self.workspace_type = workspace_type;
        self.touch();
        self.raise(WorkspaceEvent::Updated {
            changes: vec!["workspace_type"],
        });
        Ok(())
    }

    pub fn archive(&mut self) -> Result<()> {
        self.ensure_not_deleted("archive")?;
        if !self.lifecycle.ensure_transition(Lifecycle::Archived)? {
            return Ok(());
        }

        self.lifecycle = Lifecycle::Archived;
        self.touch();
        self.archived_at = Some(self.updated_at);
        self.raise(WorkspaceEvent::Archived);
        Ok(())
    }

    /// Return an archived workspace to active. Not idempotent: anything other
    /// than an archived workspace is rejected.
    pub fn unarchive(&mut self) -> Result<()> {
        if !self.lifecycle.is_archived() {
            return Err(Error::business_rule(
                "workspace_not_archived",
                format!("cannot unarchive a {} workspace", self.lifecycle.as_str()),
            )
            .with_context("workspace_id", &self.id));
        }
        self.lifecycle.ensure_transition(Lifecycle::Active)?;

        self.lifecycle = Lifecycle::Active;
        self.archived_at = None;
        self.touch();
        self.raise(WorkspaceEvent::Updated {
            changes: vec!["lifecycle", "archived_at"],
        });
        Ok(())
    }

    /// Terminal. `archived_at` is kept as history.
    pub fn delete(&mut self) -> Result<()> {
        if !self.lifecycle.ensure_transition(Lifecycle::Deleted)? {
            return Ok(());
        }

        self.lifecycle = Lifecycle::Deleted;
        self.touch();
        self.raise(WorkspaceEvent::Deleted);
        Ok(())
    }

    pub fn add_member(&mut self) -> Result<()> {
        self.ensure_not_deleted("add a member to")?;
        if !self.lifecycle.is_active() {
            return Err(Error::business_rule(
                "workspace_not_active",
                format!("cannot add a member to a {} workspace", self.lifecycle.as_str()),
            )
            .with_context("workspace_id", &self.id));
        }
        if !self.quota.can_add_member(self.member_count) {
            return Err(Error::quota_exceeded(
                QuotaType::Members,
                self.member_count,
                self.quota.max_members(),
            )
            .with_context("workspace_id", &self.id));
        }

        self.member_count += 1;
        self.touch();
        self.raise(WorkspaceEvent::MemberJoined {
            member_count: self.member_count,
        });
        Ok(())
    }

    pub fn remove_member(&mut self) -> Result<()> {
        self.ensure_not_deleted("remove a member from")?;
        if self.member_count <= 1 {
            return Err(Error::business_rule(
                "last_member",
                "a workspace must keep at least one member",
            )
            .with_context("workspace_id", &self.id));
        }

        self.member_count -= 1;
        self.touch();
        self.raise(WorkspaceEvent::MemberLeft {
            member_count: self.member_count,
        });
        Ok(())
    }

    pub fn transfer_ownership(&mut self, new_owner: AccountId) -> Result<()> {
        self.ensure_not_deleted("transfer")?;
        if self.owner_id == new_owner {
            return Ok(());
        }

        let previous_owner = std::mem::replace(&mut self.owner_id, new_owner.clone());
        self.touch();
        self.raise(WorkspaceEvent::OwnershipTransferred {
            previous_owner,
            new_owner,
        });
        Ok(())
    }

    /// Swap the quota. The candidate must still fit the current members.
    pub fn update_quota(&mut self, quota: Quota) -> Result<()> {
        self.ensure_not_deleted("change the quota of")?;
        if self.quota == quota {
            return Ok(());
        }
        if !quota.can_add_member(self.member_count - 1) {
            return Err(Error::quota_exceeded(
                QuotaType::Members,
                self.member_count,
                quota.max_members(),
            )
            .with_context("workspace_id", &self.id));
        }

        self.quota = quota;
        self.touch();
        self.raise(WorkspaceEvent::Updated {
            changes: vec!["quota"],
        });
        Ok(())
    }

    /// Note a visit. Only `last_accessed_at` changes.
    pub fn record_access(&mut self) -> Result<()> {
        self.ensure_not_deleted("access")?;
        self.last_accessed_at = Some(Timestamp::now());
        Ok(())
    }

    /// Drain the events queued since the last call.
    pub fn take_events(&mut self) -> Vec<WorkspaceDomainEvent> {
        std::mem::take(&mut self.pending_events)
    }

    pub fn pending_events(&self) -> &[WorkspaceDomainEvent] {
        &self.pending_events
    }

    pub fn id(&self) -> &WorkspaceId {
        &self.id
    }

    pub fn identity(&self) -> &WorkspaceIdentity {
        &self.identity
    }

    pub fn name(&self) -> &str {
        self.identity.name()
    }

    pub fn slug(&self) -> &Slug {
        self.identity.slug()
    }

    pub fn workspace_type(&self) -> WorkspaceType {
        self.workspace_type
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn quota(&self) -> &Quota {
        &self.quota
    }

    pub fn owner_id(&self) -> &AccountId {
        &self.owner_id
    }

    pub fn account_id(&self) -> Option<&AccountId> {
        self.account_id.as_ref()
    }

    pub fn context_id(&self) -> Option<&str> {
        self.context_id.as_deref()
    }

    pub fn member_count(&self) -> u64 {
        self.member_count
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn updated_at(&self) -> Timestamp {
        self.updated_at
    }

    pub fn last_accessed_at(&self) -> Option<Timestamp> {
        self.last_accessed_at
    }

    pub fn archived_at(&self) -> Option<Timestamp> {
        self.archived_at
    }

    pub fn is_active(&self) -> bool {
        self.lifecycle.is_active()
    }

    pub fn is_archived(&self) -> bool {
        self.lifecycle.is_archived()
    }

    pub fn is_deleted(&self) -> bool {
        self.lifecycle.is_deleted()
    }

    pub fn is_owner(&self, account_id: &AccountId) -> bool {
        &self.owner_id == account_id
    }
}

impl TryFrom<WorkspaceRecord> for Workspace {
    type Error = Error;

    fn try_from(record: WorkspaceRecord) -> Result<Self> {
        Self::restore(record)
    }
}

impl From<Workspace> for WorkspaceRecord {
    fn from(workspace: Workspace) -> Self {
        workspace.to_record()
    }
}
