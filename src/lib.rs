//! Multi-tenant workspace domain model.
//!
//! Workspaces are owned by an account acting as itself or as an
//! organization, team or partner. Members join a workspace with a [`Role`]
//! and a [`Permissions`] mask; a [`Quota`] caps how large a workspace can
//! grow. The [`context::ContextCoordinator`] tracks which identity a session
//! is acting as.
//!
//! Storage, directories and event delivery are traits. In-memory versions
//! are available behind the `mocks` feature.

pub mod actions;
pub mod config;
pub mod context;
pub mod error;
pub mod events;
pub mod guards;
pub mod lifecycle;
pub mod membership;
pub mod messages;
pub mod pagination;
pub mod permissions;
pub mod quota;
pub mod values;
pub mod workspace;

pub use config::TenantryConfig;
pub use error::{AuthorizationError, Error, ErrorKind, FieldError, Locale, QuotaType, Result};
pub use lifecycle::{Lifecycle, StateMachine};
pub use membership::{Membership, MembershipRepository, MembershipStatus, Role};
pub use pagination::{Page, Pagination};
pub use permissions::{Permission, Permissions};
pub use quota::{Quota, QuotaTier};
pub use values::{
    AccountId, CorrelationId, Email, EventId, MembershipId, MessageId, OrganizationId, PartnerId,
    Slug, TeamId, Timestamp, WorkspaceId,
};
pub use workspace::{Workspace, WorkspaceRepository};

#[cfg(any(test, feature = "mocks"))]
pub use membership::MockMembershipRepository;
#[cfg(any(test, feature = "mocks"))]
pub use workspace::MockWorkspaceRepository;
