use async_trait::async_trait;

use super::types::{
    NewOrganization, NewPartner, NewTeam, OrganizationSummary, PartnerSummary, TeamSummary,
};
use crate::error::Result;
use crate::values::AccountId;

/// Organizations an account owns or belongs to.
#[async_trait]
pub trait OrganizationDirectory: Send + Sync {
    async fn list_for_account(&self, account_id: &AccountId) -> Result<Vec<OrganizationSummary>>;

    /// Returns the generated id, or `None` when the backend did not produce one.
    async fn create(&self, organization: NewOrganization) -> Result<Option<String>>;
}

/// Teams an account belongs to, across organizations.
#[async_trait]
pub trait TeamDirectory: Send + Sync {
    async fn list_for_account(&self, account_id: &AccountId) -> Result<Vec<TeamSummary>>;

    async fn create(&self, team: NewTeam) -> Result<Option<String>>;
}

/// Partner relationships an account may act within.
#[async_trait]
pub trait PartnerDirectory: Send + Sync {
    async fn list_for_account(&self, account_id: &AccountId) -> Result<Vec<PartnerSummary>>;

    async fn create(&self, partner: NewPartner) -> Result<Option<String>>;
}
