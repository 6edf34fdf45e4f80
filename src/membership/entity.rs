use serde::{Deserialize, Serialize};

use super::events::{MembershipChange, MembershipEvent};
use super::{MembershipStatus, Role};
use crate::error::{Error, FieldError, Result};
use crate::lifecycle::StateMachine;
use crate::messages::DomainEvent;
use crate::permissions::{Permission, Permissions};
use crate::values::{AccountId, MembershipId, Timestamp, WorkspaceId};

/// Event type queued by [`Membership`] mutators.
pub type MembershipDomainEvent = DomainEvent<MembershipEvent, WorkspaceId>;

/// Links an account to a workspace with a role and explicit permissions.
///
/// Fields are private; every change goes through a mutator that checks the
/// status table and queues a [`MembershipDomainEvent`]. Drain them with
/// [`Membership::take_events`] after the membership has been saved.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "MembershipRecord", into = "MembershipRecord")]
pub struct Membership {
    id: MembershipId,
    workspace_id: WorkspaceId,
    account_id: AccountId,
    role: Role,
    permissions: Permissions,
    status: MembershipStatus,
    invited_by: Option<AccountId>,
    invited_at: Option<Timestamp>,
    created_at: Timestamp,
    updated_at: Timestamp,
    last_accessed_at: Option<Timestamp>,
    suspended_at: Option<Timestamp>,
    removed_at: Option<Timestamp>,
    pending_events: Vec<MembershipDomainEvent>,
}

/// Persisted shape of a [`Membership`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MembershipRecord {
    pub id: MembershipId,
    pub workspace_id: WorkspaceId,
    pub account_id: AccountId,
    pub role: Role,
    pub permissions: Permissions,
    pub status: MembershipStatus,
    pub invited_by: Option<AccountId>,
    pub invited_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub last_accessed_at: Option<Timestamp>,
    pub suspended_at: Option<Timestamp>,
    pub removed_at: Option<Timestamp>,
}

impl Membership {
    fn build(
        workspace_id: WorkspaceId,
        account_id: AccountId,
        role: Role,
        status: MembershipStatus,
    ) -> Self {
        let now = Timestamp::now();
        Self {
            id: MembershipId::generate(),
            workspace_id,
            account_id,
            role,
            permissions: role.default_permissions(),
            status,
            invited_by: None,
            invited_at: None,
            created_at: now,
            updated_at: now,
            last_accessed_at: None,
            suspended_at: None,
            removed_at: None,
            pending_events: Vec::new(),
        }
    }

    /// A directly added, active member with the role's default permissions.
    pub fn create(workspace_id: WorkspaceId, account_id: AccountId, role: Role) -> Self {
        let mut membership = Self::build(workspace_id, account_id, role, MembershipStatus::Active);
        membership.raise(MembershipChange::Joined { role });
        membership
    }

    /// A pending invitation, activated once the invitee accepts.
    pub fn invite(
        workspace_id: WorkspaceId,
        account_id: AccountId,
        role: Role,
        invited_by: AccountId,
    ) -> Self {
        let mut membership = Self::build(workspace_id, account_id, role, MembershipStatus::Pending);
        membership.invited_at = Some(membership.created_at);
        membership.invited_by = Some(invited_by.clone());
        membership.raise(MembershipChange::Invited { role, invited_by });
        membership
    }

    /// Override the role defaults before the first save.
    #[must_use]
    pub fn with_permissions(self, permissions: Permissions) -> Self {
        Self {
            permissions,
            ..self
        }
    }

    /// Rebuild from storage, re-checking the status invariants.
    pub fn restore(record: MembershipRecord) -> Result<Self> {
        if record.status == MembershipStatus::Suspended && record.suspended_at.is_none() {
            return Err(Error::validation(FieldError::RequiredField {
                field: "suspended_at",
            }));
        }
        if record.status == MembershipStatus::Removed && record.removed_at.is_none() {
            return Err(Error::validation(FieldError::RequiredField {
                field: "removed_at",
            }));
        }
        if record.updated_at.is_before(&record.created_at) {
            return Err(Error::validation(FieldError::OutOfRange {
                field: "updated_at",
                value: record.updated_at.to_string(),
                constraint: format!(">= {}", record.created_at),
            }));
        }

        Ok(Self {
            id: record.id,
            workspace_id: record.workspace_id,
            account_id: record.account_id,
            role: record.role,
            permissions: record.permissions,
            status: record.status,
            invited_by: record.invited_by,
            invited_at: record.invited_at,
            created_at: record.created_at,
            updated_at: record.updated_at,
            last_accessed_at: record.last_accessed_at,
            suspended_at: record.suspended_at,
            removed_at: record.removed_at,
            pending_events: Vec::new(),
        })
    }

    pub fn to_record(&self) -> MembershipRecord {
        MembershipRecord {
            id: self.id.clone(),
            workspace_id: self.workspace_id.clone(),
            account_id: self.account_id.clone(),
            role: self.role,
            permissions: self.permissions,
            status: self.status,
            invited_by: self.invited_by.clone(),
            invited_at: self.invited_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
            last_accessed_at: self.last_accessed_at,
            suspended_at: self.suspended_at,
            removed_at: self.removed_at,
        }
    }

    fn raise(&mut self, change: MembershipChange) {
        let event = MembershipEvent {
            membership_id: self.id.clone(),
            workspace_id: self.workspace_id.clone(),
            account_id: self.account_id.clone(),
            change,
        };
        self.pending_events
            .push(DomainEvent::new(self.workspace_id.clone(), event));
    }

    fn ensure_active(&self, operation: &str) -> Result<()> {
        if self.status != MembershipStatus::Active {
            return Err(Error::business_rule(
                "membership_not_active",
                format!("cannot {operation} a {} membership", self.status.as_str()),
            )
            .with_context("membership_id", &self.id)
            .with_context("status", self.status.as_str()));
        }
        Ok(())
    }

    fn transition(&mut self, to: MembershipStatus) -> Result<bool> {
        let changed = self
            .status
            .ensure_transition(to)
            .map_err(|e| e.with_context("membership_id", &self.id))?;
        if changed {
            self.status = to;
            self.updated_at = Timestamp::now();
        }
        Ok(changed)
    }

    pub fn update_role(&mut self, role: Role) -> Result<()> {
        self.ensure_active("change the role of")?;
        if self.role == role {
            return Ok(());
        }

        let from = self.role;
        self.role = role;
        self.updated_at = Timestamp::now();
        self.raise(MembershipChange::RoleChanged { from, to: role });
        Ok(())
    }

    pub fn update_permissions(&mut self, permissions: Permissions) -> Result<()> {
        self.ensure_active("change the permissions of")?;
        if self.permissions == permissions {
            return Ok(());
        }

        let from = self.permissions;
        self.permissions = permissions;
        self.updated_at = Timestamp::now();
        self.raise(MembershipChange::PermissionsChanged {
            from,
            to: permissions,
        });
        Ok(())
    }

    /// Accept a pending invitation or lift a suspension.
    pub fn activate(&mut self) -> Result<()> {
        let from = self.status;
        if !self.transition(MembershipStatus::Active)? {
            return Ok(());
        }

        self.suspended_at = None;
        let change = if from == MembershipStatus::Pending {
            MembershipChange::Joined { role: self.role }
        } else {
            MembershipChange::Activated
        };
        self.raise(change);
        Ok(())
    }

    pub fn suspend(&mut self) -> Result<()> {
        if !self.transition(MembershipStatus::Suspended)? {
            return Ok(());
        }

        self.suspended_at = Some(self.updated_at);
        self.raise(MembershipChange::Suspended);
        Ok(())
    }

    /// The member walks away on their own.
    pub fn leave(&mut self) -> Result<()> {
        if !self.transition(MembershipStatus::Left)? {
            return Ok(());
        }

        self.raise(MembershipChange::Left);
        Ok(())
    }

    pub fn remove(&mut self) -> Result<()> {
        if !self.transition(MembershipStatus::Removed)? {
            return Ok(());
        }

        self.removed_at = Some(self.updated_at);
        self.raise(MembershipChange::Removed);
        Ok(())
    }

    /// Note a visit by an active member. Leaves `updated_at` alone, raises
    /// no event, and does nothing for any other status.
    pub fn record_access(&mut self) {
        if self.is_active() {
            self.last_accessed_at = Some(Timestamp::now());
        }
    }

    /// Drain the events queued since the last call.
    pub fn take_events(&mut self) -> Vec<MembershipDomainEvent> {
        std::mem::take(&mut self.pending_events)
    }

    pub fn pending_events(&self) -> &[MembershipDomainEvent] {
        &self.pending_events
    }

    pub fn id(&self) -> &MembershipId {
        &self.id
    }

    pub fn workspace_id(&self) -> &WorkspaceId {
        &self.workspace_id
    }

    pub fn account_id(&self) -> &AccountId {
        &self.account_id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn permissions(&self) -> Permissions {
        self.permissions
    }

    pub fn status(&self) -> MembershipStatus {
        self.status
    }

    pub fn invited_by(&self) -> Option<&AccountId> {
        self.invited_by.as_ref()
    }

    pub fn invited_at(&self) -> Option<Timestamp> {
        self.invited_at
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

    pub fn suspended_at(&self) -> Option<Timestamp> {
        self.suspended_at
    }

    pub fn removed_at(&self) -> Option<Timestamp> {
        self.removed_at
    }

    pub fn is_active(&self) -> bool {
        self.status == MembershipStatus::Active
    }

    pub fn is_pending(&self) -> bool {
        self.status == MembershipStatus::Pending
    }

    pub fn is_suspended(&self) -> bool {
        self.status == MembershipStatus::Suspended
    }

    pub fn is_removed(&self) -> bool {
        self.status == MembershipStatus::Removed
    }

    /// True for Left and Removed.
    pub fn is_terminated(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn is_owner(&self) -> bool {
        self.role == Role::Owner
    }

    /// Admins and owners.
    pub fn is_admin(&self) -> bool {
        self.role.is_at_least(Role::Admin)
    }

    pub fn has_permission(&self, permission: Permission) -> bool {
        self.permissions.has(permission)
    }

    pub fn has_all_permissions(&self, permissions: &[Permission]) -> bool {
        self.permissions.has_all(permissions)
    }

    pub fn has_any_permission(&self, permissions: &[Permission]) -> bool {
        self.permissions.has_any(permissions)
    }
}

impl TryFrom<MembershipRecord> for Membership {
    type Error = Error;

    fn try_from(record: MembershipRecord) -> Result<Self> {
        Self::restore(record)
    }
}

impl From<Membership> for MembershipRecord {
    fn from(membership: Membership) -> Self {
        membership.to_record()
    }
}
