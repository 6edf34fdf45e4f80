use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, FieldError, Result};
use crate::permissions::{Permission, Permissions};

/// A member's standing within a workspace, ordered by privilege.
///
/// `Guest < Viewer < Editor < Admin < Owner`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Guest = 1,
    Viewer = 2,
    Editor = 3,
    Admin = 4,
    Owner = 5,
}

impl Role {
    pub const ALL: [Self; 5] = [
        Self::Guest,
        Self::Viewer,
        Self::Editor,
        Self::Admin,
        Self::Owner,
    ];

    /// Numeric privilege level, 1 (guest) through 5 (owner).
    pub const fn level(self) -> u8 {
        self as u8
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Guest => "guest",
            Self::Viewer => "viewer",
            Self::Editor => "editor",
            Self::Admin => "admin",
            Self::Owner => "owner",
        }
    }

    pub fn compare(a: Self, b: Self) -> Ordering {
        a.level().cmp(&b.level())
    }

    /// An actor may only change members ranked strictly below them.
    pub fn can_modify(actor: Self, target: Self) -> bool {
        actor > target
    }

    pub fn is_at_least(self, required: Self) -> bool {
        self >= required
    }

    /// Permissions granted to a new member with this role.
    pub fn default_permissions(self) -> Permissions {
        match self {
            Self::Owner => Permissions::owner(),
            Self::Admin => Permissions::admin(),
            Self::Editor => Permissions::editor(),
            Self::Viewer => Permissions::read_only(),
            Self::Guest => {
                Permissions::from_flags(&[Permission::WorkspaceRead, Permission::DocumentRead])
            }
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                Error::validation(FieldError::InvalidFormat {
                    field: "role",
                    expected: "one of owner, admin, editor, viewer, guest",
                })
            })
    }
}
