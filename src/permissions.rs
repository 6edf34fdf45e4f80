//! Compact permission storage for workspace members.
//!
//! A [`Permissions`] value is a 32-bit mask where each bit is one
//! [`Permission`]. Every operation returns a new value, so a `Permissions` can
//! be copied and shared freely.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, FieldError, Result};

/// A single capability that can be granted to a member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    WorkspaceRead,
    WorkspaceWrite,
    WorkspaceDelete,
    ProjectRead,
    ProjectWrite,
    ProjectDelete,
    DocumentRead,
    DocumentWrite,
    DocumentDelete,
    MemberRead,
    MemberInvite,
    MemberRemove,
    SettingsRead,
    SettingsWrite,
    ManagePermissions,
    ManageBilling,
}

impl Permission {
    /// Every flag, in bit order.
    pub const ALL: [Self; 16] = [
        Self::WorkspaceRead,
        Self::WorkspaceWrite,
        Self::WorkspaceDelete,
        Self::ProjectRead,
        Self::ProjectWrite,
        Self::ProjectDelete,
        Self::DocumentRead,
        Self::DocumentWrite,
        Self::DocumentDelete,
        Self::MemberRead,
        Self::MemberInvite,
        Self::MemberRemove,
        Self::SettingsRead,
        Self::SettingsWrite,
        Self::ManagePermissions,
        Self::ManageBilling,
    ];

    /// The bit this flag occupies.
    pub const fn bit(self) -> u32 {
        1 << (self as u32)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::WorkspaceRead => "workspace:read",
            Self::WorkspaceWrite => "workspace:write",
            Self::WorkspaceDelete => "workspace:delete",
            Self::ProjectRead => "project:read",
            Self::ProjectWrite => "project:write",
            Self::ProjectDelete => "project:delete",
            Self::DocumentRead => "document:read",
            Self::DocumentWrite => "document:write",
            Self::DocumentDelete => "document:delete",
            Self::MemberRead => "member:read",
            Self::MemberInvite => "member:invite",
            Self::MemberRemove => "member:remove",
            Self::SettingsRead => "settings:read",
            Self::SettingsWrite => "settings:write",
            Self::ManagePermissions => "permissions:manage",
            Self::ManageBilling => "billing:manage",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const ALL_BITS: u32 = (1 << Permission::ALL.len()) - 1;

const fn mask(flags: &[Permission]) -> u32 {
    let mut bits = 0;
    let mut i = 0;
    while i < flags.len() {
        bits |= flags[i].bit();
        i += 1;
    }
    bits
}

const READ_ONLY_BITS: u32 = mask(&[
    Permission::WorkspaceRead,
    Permission::ProjectRead,
    Permission::DocumentRead,
    Permission::MemberRead,
    Permission::SettingsRead,
]);

const EDITOR_BITS: u32 = READ_ONLY_BITS
    | mask(&[
        Permission::ProjectWrite,
        Permission::DocumentWrite,
    ]);

const ADMIN_BITS: u32 =
    ALL_BITS & !mask(&[Permission::WorkspaceDelete, Permission::ManageBilling]);

/// A set of permissions held as a bitmask.
///
/// # Example
///
/// ```rust
/// use tenantry::{Permission, Permissions};
///
/// let perms = Permissions::read_only().add(Permission::DocumentWrite);
///
/// assert!(perms.has(Permission::DocumentWrite));
/// assert!(!perms.has(Permission::DocumentDelete));
/// assert!(Permissions::owner().has_all(&Permission::ALL));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u32")]
pub struct Permissions(u32);

impl Permissions {
    /// Build from a raw integer, rejecting negatives and undefined bits.
    pub fn from_bits(bits: i64) -> Result<Self> {
        if bits < 0 || bits > i64::from(ALL_BITS) || (bits as u32) & !ALL_BITS != 0 {
            return Err(Error::validation(FieldError::OutOfRange {
                field: "permissions",
                value: bits.to_string(),
                constraint: format!("0..={ALL_BITS} with defined flags only"),
            }));
        }
        Ok(Self(bits as u32))
    }

    pub fn from_flags(flags: &[Permission]) -> Self {
        Self(mask(flags))
    }

    pub const fn none() -> Self {
        Self(0)
    }

    pub const fn read_only() -> Self {
        Self(READ_ONLY_BITS)
    }

    pub const fn editor() -> Self {
        Self(EDITOR_BITS)
    }

    /// Everything except deleting the workspace and managing billing.
    pub const fn admin() -> Self {
        Self(ADMIN_BITS)
    }

    pub const fn owner() -> Self {
        Self(ALL_BITS)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn has(self, permission: Permission) -> bool {
        self.0 & permission.bit() != 0
    }

    /// True when at least one of `permissions` is set. An empty slice never matches.
    pub fn has_any(self, permissions: &[Permission]) -> bool {
        permissions.iter().any(|p| self.has(*p))
    }

    /// True when every one of `permissions` is set.
    pub fn has_all(self, permissions: &[Permission]) -> bool {
        permissions.iter().all(|p| self.has(*p))
    }

    #[must_use]
    pub const fn add(self, permission: Permission) -> Self {
        Self(self.0 | permission.bit())
    }

    #[must_use]
    pub const fn remove(self, permission: Permission) -> Self {
        Self(self.0 & !permission.bit())
    }

    #[must_use]
    pub const fn merge(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    #[must_use]
    pub const fn intersect(self, other: Self) -> Self {
        Self(self.0 & other.0)
    }

    /// Decompose into individual flags, in bit order.
    pub fn to_vec(self) -> Vec<Permission> {
        Permission::ALL
            .into_iter()
            .filter(|p| self.has(*p))
            .collect()
    }
}

impl TryFrom<i64> for Permissions {
    type Error = Error;

    fn try_from(bits: i64) -> Result<Self> {
        Self::from_bits(bits)
    }
}

impl From<Permissions> for u32 {
    fn from(permissions: Permissions) -> Self {
        permissions.0
    }
}

impl From<Permission> for Permissions {
    fn from(permission: Permission) -> Self {
        Self(permission.bit())
    }
}

impl FromIterator<Permission> for Permissions {
    fn from_iter<I: IntoIterator<Item = Permission>>(iter: I) -> Self {
        iter.into_iter().fold(Self::none(), Self::add)
    }
}

impl fmt::Display for Permissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.to_vec().into_iter().map(Permission::as_str).collect();
        write!(f, "[{}]", names.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_has() {
        let perms = Permissions::none()
            .add(Permission::ProjectRead)
            .add(Permission::ProjectWrite);

        assert!(perms.has(Permission::ProjectRead));
        assert!(perms.has(Permission::ProjectWrite));
        assert!(!perms.has(Permission::ProjectDelete));
    }

    #[test]
    fn test_operations_return_new_values() {
        let base = Permissions::read_only();
        let extended = base.add(Permission::DocumentWrite);

        assert!(!base.has(Permission::DocumentWrite));
        assert!(extended.has(Permission::DocumentWrite));
    }

    #[test]
    fn test_remove() {
        for flag in Permission::ALL {
            assert!(!Permissions::owner().remove(flag).has(flag));
        }
    }

    #[test]
    fn test_merge_is_union() {
        let a = Permissions::from_flags(&[Permission::MemberRead, Permission::DocumentRead]);
        let b = Permissions::from_flags(&[Permission::DocumentRead, Permission::ManageBilling]);
        let merged = a.merge(b);

        for flag in Permission::ALL {
            assert_eq!(merged.has(flag), a.has(flag) || b.has(flag), "{flag}");
        }
    }

    #[test]
    fn test_intersect_is_conjunction() {
        let a = Permissions::editor();
        let b = Permissions::from_flags(&[Permission::DocumentWrite, Permission::ManageBilling]);

        assert_eq!(
            a.intersect(b),
            Permissions::from_flags(&[Permission::DocumentWrite])
        );
    }

    #[test]
    fn test_presets() {
        assert!(Permissions::owner().has_all(&Permission::ALL));
        assert!(!Permissions::none().has_any(&Permission::ALL));

        let admin = Permissions::admin();
        assert!(!admin.has(Permission::WorkspaceDelete));
        assert!(!admin.has(Permission::ManageBilling));
        assert!(admin.has(Permission::ManagePermissions));
        assert!(admin.has(Permission::MemberRemove));

        assert!(Permissions::editor().has(Permission::DocumentWrite));
        assert!(!Permissions::editor().has(Permission::MemberInvite));
        assert!(!Permissions::read_only().has(Permission::DocumentWrite));
    }

    #[test]
    fn test_has_any_with_empty_slice() {
        assert!(!Permissions::owner().has_any(&[]));
        assert!(Permissions::none().has_all(&[]));
    }

    #[test]
    fn test_to_vec() {
        let perms = Permissions::from_flags(&[Permission::ManageBilling, Permission::WorkspaceRead]);
        assert_eq!(
            perms.to_vec(),
            vec![Permission::WorkspaceRead, Permission::ManageBilling]
        );
        assert_eq!(Permissions::owner().to_vec().len(), Permission::ALL.len());
    }

    #[test]
    fn test_from_bits_rejects_negative_and_undefined() {
        assert!(Permissions::from_bits(-1).unwrap_err().is_validation());
        assert!(Permissions::from_bits(1 << 20).is_err());
        assert!(Permissions::from_bits(i64::MAX).is_err());
        assert_eq!(
            Permissions::from_bits(i64::from(Permissions::owner().bits())).unwrap(),
            Permissions::owner()
        );
    }

    #[test]
    fn test_serde_validates() {
        let json = serde_json::to_string(&Permissions::editor()).unwrap();
        assert_eq!(json, Permissions::editor().bits().to_string());

        let parsed: Permissions = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, Permissions::editor());

        assert!(serde_json::from_str::<Permissions>("-4").is_err());
    }

    #[test]
    fn test_collect() {
        let perms: Permissions = [Permission::MemberInvite, Permission::MemberRemove]
            .into_iter()
            .collect();
        assert!(perms.has_all(&[Permission::MemberInvite, Permission::MemberRemove]));
    }
}
