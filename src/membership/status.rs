use serde::{Deserialize, Serialize};

use crate::lifecycle::StateMachine;

/// Where a membership stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipStatus {
    /// Invited, not yet accepted.
    Pending,
    Active,
    Suspended,
    /// The member left on their own.
    Left,
    Removed,
}

impl StateMachine for MembershipStatus {
    fn allowed_transitions(self) -> &'static [Self] {
        match self {
            Self::Pending => &[Self::Active, Self::Removed],
            Self::Active => &[Self::Suspended, Self::Left, Self::Removed],
            Self::Suspended => &[Self::Active, Self::Removed],
            Self::Left | Self::Removed => &[],
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Suspended => "suspended",
            Self::Left => "left",
            Self::Removed => "removed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(MembershipStatus::Left.is_terminal());
        assert!(MembershipStatus::Removed.is_terminal());
        assert!(!MembershipStatus::Pending.is_terminal());
    }

    #[test]
    fn test_pending_cannot_be_suspended() {
        assert!(!MembershipStatus::Pending.can_transition_to(MembershipStatus::Suspended));
        assert!(
            MembershipStatus::Pending
                .ensure_transition(MembershipStatus::Suspended)
                .is_err()
        );
    }

    #[test]
    fn test_suspended_cannot_leave() {
        assert!(!MembershipStatus::Suspended.can_transition_to(MembershipStatus::Left));
        assert!(MembershipStatus::Suspended.can_transition_to(MembershipStatus::Active));
    }
}
