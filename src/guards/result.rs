use std::fmt;

use serde::Serialize;

use crate::error::{AuthorizationError, Error, QuotaType, Result};
use crate::lifecycle::{Lifecycle, StateMachine};
use crate::membership::{MembershipStatus, Role};
use crate::permissions::Permissions;
use crate::values::{AccountId, WorkspaceId};

/// Why a guard said no.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Denial {
    WorkspaceNotFound {
        workspace_id: WorkspaceId,
    },
    WorkspaceDeleted {
        workspace_id: WorkspaceId,
    },
    WorkspaceNotActive {
        workspace_id: WorkspaceId,
        lifecycle: Lifecycle,
    },
    NotMember {
        account_id: AccountId,
        workspace_id: WorkspaceId,
    },
    MembershipInactive {
        account_id: AccountId,
        status: MembershipStatus,
    },
    MissingPermission {
        account_id: AccountId,
        required: Permissions,
    },
    InsufficientRole {
        account_id: AccountId,
        required: Role,
        actual: Role,
    },
    NotOwner {
        account_id: AccountId,
        workspace_id: WorkspaceId,
    },
    QuotaExceeded {
        quota_type: QuotaType,
        current_usage: u64,
        limit: u64,
    },
}

impl Denial {
    pub fn code(&self) -> &'static str {
        match self {
            Self::WorkspaceNotFound { .. } => "workspace_not_found",
            Self::WorkspaceDeleted { .. } => "workspace_deleted",
            Self::WorkspaceNotActive { .. } => "workspace_not_active",
            Self::NotMember { .. } => "not_member",
            Self::MembershipInactive { .. } => "membership_inactive",
            Self::MissingPermission { .. } => "missing_permission",
            Self::InsufficientRole { .. } => "insufficient_role",
            Self::NotOwner { .. } => "not_owner",
            Self::QuotaExceeded { .. } => "quota_exceeded",
        }
    }

    /// The error a caller should raise for this denial.
    pub fn into_error(self) -> Error {
        match self {
            Self::WorkspaceNotFound { workspace_id } => Error::not_found("workspace", workspace_id),
            Self::WorkspaceDeleted { workspace_id } => {
                Error::business_rule("workspace_deleted", "the workspace has been deleted")
                    .with_context("workspace_id", workspace_id)
            }
            Self::WorkspaceNotActive {
                workspace_id,
                lifecycle,
            } => Error::business_rule(
                "workspace_not_active",
                format!("the workspace is {}", lifecycle.as_str()),
            )
            .with_context("workspace_id", workspace_id),
            Self::NotMember {
                account_id,
                workspace_id,
            } => Error::from(AuthorizationError::InsufficientRole {
                actor: account_id.into(),
                required: Role::Guest,
                actual: None,
            })
            .with_context("workspace_id", workspace_id),
            Self::MembershipInactive { account_id, status } => Error::business_rule(
                "membership_not_active",
                format!("the membership is {}", status.as_str()),
            )
            .with_context("account_id", account_id),
            Self::MissingPermission {
                account_id,
                required,
            } => Error::from(AuthorizationError::InsufficientPermission {
                actor: account_id.into(),
                required,
            }),
            Self::InsufficientRole {
                account_id,
                required,
                actual,
            } => Error::from(AuthorizationError::InsufficientRole {
                actor: account_id.into(),
                required,
                actual: Some(actual),
            }),
            Self::NotOwner {
                account_id,
                workspace_id,
            } => Error::from(AuthorizationError::NotResourceOwner {
                actor: account_id.into(),
                resource: format!("workspace:{workspace_id}"),
            }),
            Self::QuotaExceeded {
                quota_type,
                current_usage,
                limit,
            } => Error::quota_exceeded(quota_type, current_usage, limit),
        }
    }
}

impl fmt::Display for Denial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WorkspaceNotFound { workspace_id } => {
                write!(f, "workspace {workspace_id} does not exist")
            }
            Self::WorkspaceDeleted { workspace_id } => {
                write!(f, "workspace {workspace_id} has been deleted")
            }
            Self::WorkspaceNotActive {
                workspace_id,
                lifecycle,
            } => write!(f, "workspace {workspace_id} is {}", lifecycle.as_str()),
            Self::NotMember {
                account_id,
                workspace_id,
            } => write!(f, "{account_id} is not a member of {workspace_id}"),
            Self::MembershipInactive { account_id, status } => {
                write!(f, "membership of {account_id} is {}", status.as_str())
            }
            Self::MissingPermission {
                account_id,
                required,
            } => write!(f, "{account_id} lacks {required}"),
            Self::InsufficientRole {
                account_id,
                required,
                actual,
            } => write!(f, "{account_id} is {actual}, needs {required}"),
            Self::NotOwner {
                account_id,
                workspace_id,
            } => write!(f, "{account_id} does not own {workspace_id}"),
            Self::QuotaExceeded {
                quota_type,
                current_usage,
                limit,
            } => write!(f, "{quota_type} quota reached ({current_usage} of {limit})"),
        }
    }
}

/// Outcome of a guard check: allowed, or denied with a reason the caller can
/// render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GuardResult {
    pub allowed: bool,
    pub reason: Option<Denial>,
}

impl GuardResult {
    pub fn allow() -> Self {
        Self {
            allowed: true,
            reason: None,
        }
    }

    pub fn deny(reason: Denial) -> Self {
        Self {
            allowed: false,
            reason: Some(reason),
        }
    }

    pub fn is_allowed(&self) -> bool {
        self.allowed
    }

    pub fn is_denied(&self) -> bool {
        !self.allowed
    }

    /// `Ok(())` when allowed, otherwise the error matching the denial.
    pub fn into_result(self) -> Result<()> {
        match self.reason {
            None if self.allowed => Ok(()),
            Some(reason) => Err(reason.into_error()),
            None => Err(Error::business_rule("denied", "access denied")),
        }
    }
}

impl From<std::result::Result<(), Denial>> for GuardResult {
    fn from(outcome: std::result::Result<(), Denial>) -> Self {
        match outcome {
            Ok(()) => Self::allow(),
            Err(reason) => Self::deny(reason),
        }
    }
}
