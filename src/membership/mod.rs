//! Workspace membership: who belongs to a workspace, with which role and
//! permissions.

mod entity;
mod events;
mod repository;
mod role;
mod status;

pub use entity::{Membership, MembershipDomainEvent, MembershipRecord};
pub use events::{MembershipChange, MembershipEvent};
pub use repository::MembershipRepository;
pub use role::Role;
pub use status::MembershipStatus;

#[cfg(any(test, feature = "mocks"))]
mod mocks;

#[cfg(any(test, feature = "mocks"))]
pub use mocks::MockMembershipRepository;
