//! Application actions over the workspace and membership repositories.
//!
//! Each action takes a command or query envelope from the acting account,
//! checks it with the guards, applies the change to the aggregates, saves
//! them and then hands the aggregates' pending events to an
//! [`EventBus`]. Events are stamped with the command that caused them.

mod accept_invitation;
mod add_member;
mod change_member_role;
mod create_workspace;
mod list_workspaces;
mod remove_member;
mod transfer_ownership;

pub use accept_invitation::AcceptInvitationAction;
pub use add_member::{AddMemberAction, AddMemberInput, AddedMember};
pub use change_member_role::{ChangeMemberRoleAction, ChangeMemberRoleInput};
pub use create_workspace::{CreateWorkspaceAction, CreateWorkspaceInput, CreatedWorkspace};
pub use list_workspaces::{ListWorkspacesAction, ListWorkspacesInput};
pub use remove_member::{RemoveMemberAction, RemoveMemberInput, RemovedMember};
pub use transfer_ownership::{
    TransferOwnershipAction, TransferOwnershipInput, TransferredOwnership,
};

use crate::error::Result;
use crate::events::EventBus;
use crate::guards::Denial;
use crate::membership::{Membership, Role};
use crate::messages::{DomainEvent, EventPayload, Message, WorkspaceScope};
use crate::values::WorkspaceId;

const PRODUCER: &str = "tenantry";

/// Emit `events` in order, each stamped with the causing `message`.
async fn publish<B, P, Q, S>(
    bus: &B,
    message: &Message<Q, S>,
    events: Vec<DomainEvent<P, WorkspaceId>>,
) where
    B: EventBus,
    P: EventPayload,
    S: WorkspaceScope,
{
    for event in events {
        bus.emit(event.caused_by(message).to_bus_message(PRODUCER))
            .await;
    }
}

/// The actor must rank strictly above `target`.
fn ensure_outranks(actor: &Membership, target: Role) -> Result<()> {
    if Role::can_modify(actor.role(), target) {
        return Ok(());
    }
    Err(Denial::InsufficientRole {
        account_id: actor.account_id().clone(),
        required: target,
        actual: actor.role(),
    }
    .into_error()
    .with_context("workspace_id", actor.workspace_id())
    .with_context("rule", "must_outrank"))
}
