use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, FieldError, Result};

static SLUG_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").expect("slug pattern compiles"));

const MIN_SLUG_LEN: usize = 3;
const MAX_SLUG_LEN: usize = 63;

/// URL-safe identifier: lowercase alphanumeric runs joined by single hyphens.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Slug(String);

impl Slug {
    /// Validate an existing slug as-is.
    pub fn new(raw: impl AsRef<str>) -> Result<Self> {
        let raw = raw.as_ref();
        let len = raw.chars().count();

        if len < MIN_SLUG_LEN || len > MAX_SLUG_LEN {
            return Err(Error::validation(FieldError::InvalidLength {
                field: "slug",
                min: MIN_SLUG_LEN,
                max: MAX_SLUG_LEN,
                actual: len,
            }));
        }

        if !SLUG_REGEX.is_match(raw) {
            return Err(Error::validation(FieldError::InvalidFormat {
                field: "slug",
                expected: "lowercase letters and digits separated by single hyphens",
            }));
        }

        Ok(Self(raw.to_owned()))
    }

    /// Derive a slug from free text such as a display name.
    ///
    /// `"Hello  World!"` becomes `"hello-world"`.
    pub fn from_text(text: impl AsRef<str>) -> Result<Self> {
        let mut slug = String::with_capacity(text.as_ref().len());
        let mut pending_hyphen = false;

        for c in text.as_ref().chars().flat_map(char::to_lowercase) {
            if c.is_ascii_lowercase() || c.is_ascii_digit() {
                if pending_hyphen && !slug.is_empty() {
                    slug.push('-');
                }
                pending_hyphen = false;
                slug.push(c);
            } else {
                pending_hyphen = true;
            }
        }

        if slug.len() > MAX_SLUG_LEN {
            slug.truncate(MAX_SLUG_LEN);
            while slug.ends_with('-') {
                slug.pop();
            }
        }

        Self::new(slug)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Slug {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Slug> for String {
    fn from(slug: Slug) -> Self {
        slug.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_text() {
        assert_eq!(Slug::from_text("Hello  World!").unwrap().as_str(), "hello-world");
        assert_eq!(Slug::from_text("  --Acme, Inc.-- ").unwrap().as_str(), "acme-inc");
        assert_eq!(Slug::from_text("Team 42").unwrap().as_str(), "team-42");
    }

    #[test]
    fn test_from_text_truncates() {
        let slug = Slug::from_text(format!("{} tail", "a".repeat(62))).unwrap();
        assert_eq!(slug.as_str(), "a".repeat(62));

        let slug = Slug::from_text("b".repeat(80)).unwrap();
        assert_eq!(slug.as_str().len(), 63);
    }

    #[test]
    fn test_too_short() {
        assert_eq!(Slug::new("ab").unwrap_err().code(), "validation.invalid_length");
        assert!(Slug::from_text("!!").is_err());
    }

    #[test]
    fn test_invalid_format() {
        for bad in ["-abc", "abc-", "ab--cd", "Abc", "ab_cd", "ab cd"] {
            assert!(Slug::new(bad).is_err(), "{bad}");
        }
        assert!(Slug::new("abc-123").is_ok());
    }
}
