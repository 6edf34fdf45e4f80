//! State machines for entity existence.
//!
//! [`StateMachine`] is the seam shared by [`Lifecycle`] (workspaces) and
//! [`MembershipStatus`](crate::membership::MembershipStatus): each implementor
//! supplies a static transition table and gets the guard logic for free.

use std::fmt::Debug;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A status enum with a fixed transition table.
pub trait StateMachine: Copy + Eq + Debug + Send + Sync + 'static {
    /// States reachable from `self` in one step.
    fn allowed_transitions(self) -> &'static [Self];

    /// Lowercase name used in messages and storage.
    fn as_str(self) -> &'static str;

    fn can_transition_to(self, to: Self) -> bool {
        self.allowed_transitions().contains(&to)
    }

    fn is_terminal(self) -> bool {
        self.allowed_transitions().is_empty()
    }

    /// Check a requested transition against the table.
    ///
    /// Returns `Ok(false)` when already in `to` (nothing to do), `Ok(true)`
    /// when the transition is legal, and a business-rule violation otherwise.
    fn ensure_transition(self, to: Self) -> Result<bool> {
        if self == to {
            return Ok(false);
        }
        if self.can_transition_to(to) {
            return Ok(true);
        }
        Err(Error::business_rule(
            "invalid_transition",
            format!("cannot transition from {} to {}", self.as_str(), to.as_str()),
        )
        .with_context("from", self.as_str())
        .with_context("to", to.as_str()))
    }
}

/// Existence state shared by workspace-like entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifecycle {
    Draft,
    Active,
    Suspended,
    Archived,
    Deleted,
}

impl Lifecycle {
    pub fn is_active(self) -> bool {
        self == Self::Active
    }

    pub fn is_archived(self) -> bool {
        self == Self::Archived
    }

    pub fn is_deleted(self) -> bool {
        self == Self::Deleted
    }
}

impl StateMachine for Lifecycle {
    fn allowed_transitions(self) -> &'static [Self] {
        match self {
            Self::Draft => &[Self::Active, Self::Deleted],
            Self::Active => &[Self::Suspended, Self::Archived, Self::Deleted],
            Self::Suspended => &[Self::Active, Self::Deleted],
            Self::Archived => &[Self::Active, Self::Deleted],
            Self::Deleted => &[],
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Active => "active",
            Self::Suspended => "suspended",
            Self::Archived => "archived",
            Self::Deleted => "deleted",
        }
    }
}
