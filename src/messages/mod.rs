//! Immutable command, query and event envelopes.
//!
//! An envelope wraps a typed payload with audit metadata. Fields are private
//! and only readable; the `with_*` methods consume the envelope and return an
//! updated copy.
//!
//! The scope parameter `S` decides whether a workspace id is optional
//! (`Option<WorkspaceId>`, the default) or required (`WorkspaceId`). A
//! workspace-scoped envelope cannot be built without a valid id.

mod event;
mod message;

pub use event::{DomainEvent, EventPayload};
pub use message::{
    Command, Message, MessageKind, Query, WorkspaceCommand, WorkspaceQuery, WorkspaceScope,
};
