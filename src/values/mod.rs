//! Immutable identity value objects.
//!
//! Every type here validates on construction, so holding one is proof that the
//! value is well formed.

mod email;
mod id;
mod slug;
mod timestamp;

pub use email::Email;
pub use id::{
    AccountId, CorrelationId, EventId, MembershipId, MessageId, OrganizationId, PartnerId, TeamId,
    WorkspaceId,
};
pub use slug::Slug;
pub use timestamp::Timestamp;
