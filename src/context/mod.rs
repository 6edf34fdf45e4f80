//! Acting-as context for a signed-in account.
//!
//! An account can act as itself or as one of the organizations, teams and
//! partner relationships the directories list for it.
//! [`ContextCoordinator`] tracks which one is current, validates switches,
//! keeps a bounded switch history and creates new organizations, teams and
//! partners.

mod coordinator;
mod directory;
#[cfg(any(test, feature = "mocks"))]
mod mocks;
mod types;

pub use coordinator::ContextCoordinator;
pub use directory::{OrganizationDirectory, PartnerDirectory, TeamDirectory};
#[cfg(any(test, feature = "mocks"))]
pub use mocks::{MockDirectory, MockOrganizationDirectory, MockPartnerDirectory, MockTeamDirectory};
pub use types::{
    AccessLevel, Account, AppContext, AvailableContexts, ContextKind, ContextState,
    ContextSwitchEvent, CreationOutcome, NewOrganization, NewPartner, NewTeam,
    OrganizationSummary, PartnerSummary, RefreshOutcome, TeamSummary,
};
