//! Resource limits for a workspace.

use serde::{Deserialize, Serialize};

use crate::error::{Error, FieldError, QuotaType, Result};

const GIB: u64 = 1024 * 1024 * 1024;

/// Named quota plans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuotaTier {
    Free,
    Pro,
    Enterprise,
    Custom,
}

/// Upper bounds on members, storage (bytes) and projects.
///
/// The predicates compare proposed usage against the limits and never change
/// anything; applying the change is the caller's job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawQuota")]
pub struct Quota {
    tier: QuotaTier,
    max_members: u64,
    max_storage: u64,
    max_projects: u64,
}

impl Quota {
    /// Sentinel meaning "no limit".
    pub const UNLIMITED: u64 = u64::MAX;

    /// A custom quota. A workspace always has at least one member, so
    /// `max_members` must be positive.
    pub fn new(max_members: u64, max_storage: u64, max_projects: u64) -> Result<Self> {
        if max_members == 0 {
            return Err(Error::validation(FieldError::OutOfRange {
                field: "max_members",
                value: max_members.to_string(),
                constraint: ">= 1".to_owned(),
            }));
        }

        Ok(Self {
            tier: QuotaTier::Custom,
            max_members,
            max_storage,
            max_projects,
        })
    }

    pub const fn free() -> Self {
        Self {
            tier: QuotaTier::Free,
            max_members: 5,
            max_storage: GIB,
            max_projects: 3,
        }
    }

    pub const fn pro() -> Self {
        Self {
            tier: QuotaTier::Pro,
            max_members: 50,
            max_storage: 100 * GIB,
            max_projects: 100,
        }
    }

    pub const fn enterprise() -> Self {
        Self {
            tier: QuotaTier::Enterprise,
            max_members: Self::UNLIMITED,
            max_storage: Self::UNLIMITED,
            max_projects: Self::UNLIMITED,
        }
    }

    pub fn for_tier(tier: QuotaTier) -> Option<Self> {
        match tier {
            QuotaTier::Free => Some(Self::free()),
            QuotaTier::Pro => Some(Self::pro()),
            QuotaTier::Enterprise => Some(Self::enterprise()),
            QuotaTier::Custom => None,
        }
    }

    pub fn tier(&self) -> QuotaTier {
        self.tier
    }

    pub fn max_members(&self) -> u64 {
        self.max_members
    }

    pub fn max_storage(&self) -> u64 {
        self.max_storage
    }

    pub fn max_projects(&self) -> u64 {
        self.max_projects
    }

    pub fn limit(&self, quota_type: QuotaType) -> u64 {
        match quota_type {
            QuotaType::Members => self.max_members,
            QuotaType::Storage => self.max_storage,
            QuotaType::Projects => self.max_projects,
        }
    }

    /// `current` is the member count before the addition.
    pub fn can_add_member(&self, current: u64) -> bool {
        self.max_members == Self::UNLIMITED || current < self.max_members
    }

    pub fn can_increase_storage(&self, current: u64, delta: u64) -> bool {
        if self.max_storage == Self::UNLIMITED {
            return true;
        }
        current
            .checked_add(delta)
            .is_some_and(|total| total <= self.max_storage)
    }

    pub fn can_create_project(&self, current: u64) -> bool {
        self.max_projects == Self::UNLIMITED || current < self.max_projects
    }

    pub fn is_unlimited(&self) -> bool {
        self.max_members == Self::UNLIMITED
            && self.max_storage == Self::UNLIMITED
            && self.max_projects == Self::UNLIMITED
    }
}

#[derive(Deserialize)]
struct RawQuota {
    tier: QuotaTier,
    max_members: u64,
    max_storage: u64,
    max_projects: u64,
}

impl TryFrom<RawQuota> for Quota {
    type Error = Error;

    fn try_from(raw: RawQuota) -> Result<Self> {
        let quota = Self::new(raw.max_members, raw.max_storage, raw.max_projects)?;
        Ok(Self {
            tier: raw.tier,
            ..quota
        })
    }
}

impl Default for Quota {
    fn default() -> Self {
        Self::free()
    }
}
