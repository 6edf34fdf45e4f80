use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, FieldError, Result};

const MAX_ID_LEN: usize = 128;

fn validate_id(field: &'static str, raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(Error::validation(FieldError::RequiredField { field }));
    }
    if trimmed.len() > MAX_ID_LEN {
        return Err(Error::validation(FieldError::InvalidLength {
            field,
            min: 1,
            max: MAX_ID_LEN,
            actual: trimmed.len(),
        }));
    }
    Ok(trimmed.to_owned())
}

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $field:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// A fresh random (UUID v4) identifier.
            pub fn generate() -> Self {
                Self(Uuid::new_v4().to_string())
            }

            /// Parse an identifier, trimming surrounding whitespace.
            pub fn parse(raw: impl AsRef<str>) -> Result<Self> {
                validate_id($field, raw.as_ref()).map(Self)
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                Self::parse(s)
            }
        }

        impl TryFrom<String> for $name {
            type Error = Error;

            fn try_from(value: String) -> Result<Self> {
                Self::parse(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id!(
    /// Identifies a workspace aggregate.
    WorkspaceId,
    "workspace_id"
);
define_id!(
    /// Identifies a membership record.
    MembershipId,
    "membership_id"
);
define_id!(
    /// Identifies an authenticated account.
    AccountId,
    "account_id"
);
define_id!(OrganizationId, "organization_id");
define_id!(TeamId, "team_id");
define_id!(PartnerId, "partner_id");
define_id!(
    /// Identifies a command or query envelope.
    MessageId,
    "message_id"
);
define_id!(EventId, "event_id");
define_id!(
    /// Ties together every message and event produced by one user request.
    CorrelationId,
    "correlation_id"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trims() {
        let id = WorkspaceId::parse("  ws-1 ").unwrap();
        assert_eq!(id.as_str(), "ws-1");
        assert_eq!(id, WorkspaceId::parse("ws-1").unwrap());
    }

    #[test]
    fn test_empty_rejected() {
        let err = AccountId::parse("   ").unwrap_err();
        assert_eq!(err.code(), "validation.required_field");
        assert_eq!(err.context().get("field").map(String::as_str), Some("account_id"));
    }

    #[test]
    fn test_too_long_rejected() {
        let err = MembershipId::parse("x".repeat(129)).unwrap_err();
        assert_eq!(err.code(), "validation.invalid_length");
    }

    #[test]
    fn test_generate_is_unique() {
        assert_ne!(TeamId::generate(), TeamId::generate());
        assert!(Uuid::parse_str(EventId::generate().as_str()).is_ok());
    }

    #[test]
    fn test_serde_validates() {
        let id: OrganizationId = serde_json::from_str("\"org-1\"").unwrap();
        assert_eq!(id.to_string(), "org-1");
        assert!(serde_json::from_str::<OrganizationId>("\"\"").is_err());
    }
}
