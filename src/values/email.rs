use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, FieldError, Result};

static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9._%+-]+@[a-z0-9.-]+\.[a-z]{2,}$").expect("email pattern compiles")
});

const MAX_EMAIL_LEN: usize = 254;

/// A normalized (trimmed, lowercase) email address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    pub fn parse(raw: impl AsRef<str>) -> Result<Self> {
        let normalized = raw.as_ref().trim().to_lowercase();

        if normalized.is_empty() {
            return Err(Error::validation(FieldError::RequiredField { field: "email" }));
        }

        if normalized.len() > MAX_EMAIL_LEN {
            return Err(Error::validation(FieldError::InvalidLength {
                field: "email",
                min: 3,
                max: MAX_EMAIL_LEN,
                actual: normalized.len(),
            }));
        }

        if !EMAIL_REGEX.is_match(&normalized) {
            return Err(Error::validation(FieldError::InvalidFormat {
                field: "email",
                expected: "an address like name@example.com",
            }));
        }

        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn local_part(&self) -> &str {
        self.0.split_once('@').map_or(&self.0, |(local, _)| local)
    }

    pub fn domain(&self) -> &str {
        self.0.split_once('@').map_or("", |(_, domain)| domain)
    }

    /// Display form that hides most of the local part: `j***@example.com`.
    pub fn mask(&self) -> String {
        let first = self.local_part().chars().next().unwrap_or('*');
        format!("{first}***@{}", self.domain())
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Email {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(value)
    }
}

impl From<Email> for String {
    fn from(email: Email) -> Self {
        email.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_emails() {
        assert!(Email::parse("user@example.com").is_ok());
        assert!(Email::parse("user.name@example.com").is_ok());
        assert!(Email::parse("user+tag@example.com").is_ok());
        assert!(Email::parse("user@subdomain.example.com").is_ok());
    }

    #[test]
    fn test_normalizes() {
        let email = Email::parse("  Jane.Doe@Example.COM ").unwrap();
        assert_eq!(email.as_str(), "jane.doe@example.com");
        assert_eq!(email, Email::parse("jane.doe@example.com").unwrap());
    }

    #[test]
    fn test_invalid_emails() {
        assert_eq!(Email::parse("").unwrap_err().code(), "validation.required_field");
        for bad in ["notanemail", "missing@domain", "@nodomain.com", "spaces in@email.com"] {
            assert_eq!(
                Email::parse(bad).unwrap_err().code(),
                "validation.invalid_format",
                "{bad}"
            );
        }
    }

    #[test]
    fn test_too_long() {
        let long = format!("{}@example.com", "a".repeat(250));
        assert_eq!(Email::parse(long).unwrap_err().code(), "validation.invalid_length");
    }

    #[test]
    fn test_parts_and_mask() {
        let email = Email::parse("jane@example.com").unwrap();
        assert_eq!(email.local_part(), "jane");
        assert_eq!(email.domain(), "example.com");
        assert_eq!(email.mask(), "j***@example.com");
    }
}
