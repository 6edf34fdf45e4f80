use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::membership::Role;
use crate::values::{AccountId, Email, OrganizationId, PartnerId, TeamId, Timestamp};

/// The authenticated account a session acts for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub email: Email,
    pub display_name: String,
}

/// How much a partner organization may do on behalf of its host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessLevel {
    Read,
    Write,
    Full,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationSummary {
    pub id: OrganizationId,
    pub name: String,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamSummary {
    pub id: TeamId,
    pub organization_id: OrganizationId,
    pub name: String,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartnerSummary {
    pub id: PartnerId,
    pub organization_id: OrganizationId,
    pub name: String,
    pub access_level: AccessLevel,
}

/// Which identity a session is acting as.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AppContext {
    User {
        account_id: AccountId,
        display_name: String,
    },
    Organization {
        organization_id: OrganizationId,
        name: String,
        role: Role,
    },
    Team {
        team_id: TeamId,
        organization_id: OrganizationId,
        name: String,
        role: Role,
    },
    Partner {
        partner_id: PartnerId,
        organization_id: OrganizationId,
        name: String,
        access_level: AccessLevel,
    },
}

impl AppContext {
    pub fn user(account: &Account) -> Self {
        Self::User {
            account_id: account.id.clone(),
            display_name: account.display_name.clone(),
        }
    }

    pub fn kind(&self) -> ContextKind {
        match self {
            Self::User { .. } => ContextKind::User,
            Self::Organization { .. } => ContextKind::Organization,
            Self::Team { .. } => ContextKind::Team,
            Self::Partner { .. } => ContextKind::Partner,
        }
    }

    /// Id of the underlying account, organization, team or partner.
    pub fn id(&self) -> &str {
        match self {
            Self::User { account_id, .. } => account_id.as_str(),
            Self::Organization {
                organization_id, ..
            } => organization_id.as_str(),
            Self::Team { team_id, .. } => team_id.as_str(),
            Self::Partner { partner_id, .. } => partner_id.as_str(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::User { display_name, .. } => display_name,
            Self::Organization { name, .. }
            | Self::Team { name, .. }
            | Self::Partner { name, .. } => name,
        }
    }

    /// The organization this context acts within, if any.
    pub fn organization_id(&self) -> Option<&OrganizationId> {
        match self {
            Self::User { .. } => None,
            Self::Organization {
                organization_id, ..
            }
            | Self::Team {
                organization_id, ..
            }
            | Self::Partner {
                organization_id, ..
            } => Some(organization_id),
        }
    }

    /// Same kind and id, regardless of display fields.
    pub fn same_target(&self, other: &Self) -> bool {
        self.kind() == other.kind() && self.id() == other.id()
    }
}

impl From<&OrganizationSummary> for AppContext {
    fn from(org: &OrganizationSummary) -> Self {
        Self::Organization {
            organization_id: org.id.clone(),
            name: org.name.clone(),
            role: org.role,
        }
    }
}

impl From<&TeamSummary> for AppContext {
    fn from(team: &TeamSummary) -> Self {
        Self::Team {
            team_id: team.id.clone(),
            organization_id: team.organization_id.clone(),
            name: team.name.clone(),
            role: team.role,
        }
    }
}

impl From<&PartnerSummary> for AppContext {
    fn from(partner: &PartnerSummary) -> Self {
        Self::Partner {
            partner_id: partner.id.clone(),
            organization_id: partner.organization_id.clone(),
            name: partner.name.clone(),
            access_level: partner.access_level,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextKind {
    User,
    Organization,
    Team,
    Partner,
}

impl ContextKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Organization => "organization",
            Self::Team => "team",
            Self::Partner => "partner",
        }
    }
}

impl fmt::Display for ContextKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry in the switch history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextSwitchEvent {
    pub kind: ContextKind,
    pub id: String,
    pub timestamp: Timestamp,
}

/// Everything an account may act as.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailableContexts {
    pub organizations: Vec<OrganizationSummary>,
    pub teams: Vec<TeamSummary>,
    pub partners: Vec<PartnerSummary>,
}

impl AvailableContexts {
    pub fn is_empty(&self) -> bool {
        self.organizations.is_empty() && self.teams.is_empty() && self.partners.is_empty()
    }

    /// Whether a non-user context is on offer. User contexts are never listed
    /// here.
    pub fn contains(&self, context: &AppContext) -> bool {
        match context {
            AppContext::User { .. } => false,
            AppContext::Organization {
                organization_id, ..
            } => self.organizations.iter().any(|o| &o.id == organization_id),
            AppContext::Team { team_id, .. } => self.teams.iter().any(|t| &t.id == team_id),
            AppContext::Partner { partner_id, .. } => {
                self.partners.iter().any(|p| &p.id == partner_id)
            }
        }
    }
}

/// Snapshot of a session's context state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContextState {
    pub account: Option<Account>,
    pub current: Option<AppContext>,
    pub available: AvailableContexts,
    pub history: VecDeque<ContextSwitchEvent>,
}

/// How a context refresh ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Applied,
    /// A newer refresh started before this one finished; its result was
    /// discarded.
    Superseded,
}

/// How a create call ended. Write failures land here (and on the event bus)
/// rather than in `Err`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreationOutcome<T> {
    Created(T),
    Failed { reason: String },
    /// A newer create of the same kind started, or the session's account
    /// changed, before this one resolved; nothing was applied.
    Superseded,
}

impl<T> CreationOutcome<T> {
    pub fn created(self) -> Option<T> {
        match self {
            Self::Created(value) => Some(value),
            Self::Failed { .. } | Self::Superseded => None,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }
}

/// Input for [`OrganizationDirectory::create`](super::OrganizationDirectory::create).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrganization {
    pub name: String,
    pub owner_id: AccountId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTeam {
    pub name: String,
    pub organization_id: OrganizationId,
    pub created_by: AccountId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPartner {
    pub name: String,
    pub organization_id: OrganizationId,
    pub access_level: AccessLevel,
    pub created_by: AccountId,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn org(id: &str) -> OrganizationSummary {
        OrganizationSummary {
            id: OrganizationId::parse(id).unwrap(),
            name: format!("Org {id}"),
            role: Role::Admin,
        }
    }

    #[test]
    fn test_contains_matches_by_id() {
        let available = AvailableContexts {
            organizations: vec![org("o1")],
            ..Default::default()
        };

        assert!(available.contains(&AppContext::from(&org("o1"))));
        assert!(!available.contains(&AppContext::from(&org("o2"))));

        let renamed = AppContext::Organization {
            organization_id: OrganizationId::parse("o1").unwrap(),
            name: "Renamed".to_owned(),
            role: Role::Viewer,
        };
        assert!(available.contains(&renamed));
    }

    #[test]
    fn test_context_accessors() {
        let team = AppContext::Team {
            team_id: TeamId::parse("t1").unwrap(),
            organization_id: OrganizationId::parse("o1").unwrap(),
            name: "Platform".to_owned(),
            role: Role::Editor,
        };

        assert_eq!(team.kind(), ContextKind::Team);
        assert_eq!(team.id(), "t1");
        assert_eq!(team.name(), "Platform");
        assert_eq!(team.organization_id().map(OrganizationId::as_str), Some("o1"));
    }

    #[test]
    fn test_serde_tag() {
        let ctx = AppContext::from(&org("o1"));
        let json = serde_json::to_value(&ctx).unwrap();
        assert_eq!(json["kind"], "organization");
    }
}
