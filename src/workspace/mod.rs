//! The workspace aggregate and its storage seam.

mod aggregate;
mod events;
mod repository;

pub use aggregate::{
    Workspace, WorkspaceDomainEvent, WorkspaceIdentity, WorkspaceRecord, WorkspaceType,
};
pub use events::WorkspaceEvent;
pub use repository::WorkspaceRepository;

#[cfg(any(test, feature = "mocks"))]
mod mocks;

#[cfg(any(test, feature = "mocks"))]
pub use mocks::MockWorkspaceRepository;
