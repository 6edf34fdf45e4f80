//! Configuration types for the tenantry domain library.
//!
//! # Example
//!
//! ```rust
//! use tenantry::config::{ContextConfig, TenantryConfig};
//!
//! // Use defaults
//! let config = TenantryConfig::default();
//!
//! // Or customize
//! let config = TenantryConfig {
//!     context: ContextConfig {
//!         history_limit: Some(10),
//!     },
//!     ..Default::default()
//! };
//! ```

use serde::Deserialize;

use crate::error::{Error, FieldError, Locale, Result};
use crate::pagination::Pagination;

/// Main configuration struct.
///
/// Deserializable so hosts can load it from their own config files; missing
/// fields fall back to [`TenantryConfig::default`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TenantryConfig {
    /// Context-switch coordinator settings.
    pub context: ContextConfig,

    /// Page sizes for list queries.
    pub pagination: PaginationConfig,

    /// Language for [`Error::user_message`](crate::Error::user_message).
    pub locale: Locale,
}

impl Default for TenantryConfig {
    fn default() -> Self {
        Self {
            context: ContextConfig::default(),
            pagination: PaginationConfig::default(),
            locale: Locale::En,
        }
    }
}

impl TenantryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps the full switch history.
    pub fn development() -> Self {
        Self {
            context: ContextConfig {
                history_limit: None,
            },
            ..Self::default()
        }
    }

    /// Short history and small pages.
    pub fn strict() -> Self {
        Self {
            context: ContextConfig {
                history_limit: Some(20),
            },
            pagination: PaginationConfig {
                default_page_size: 10,
                max_page_size: 10,
            },
            ..Self::default()
        }
    }
}

/// Settings for [`ContextCoordinator`](crate::context::ContextCoordinator).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    /// Maximum retained context-switch entries; oldest are dropped first.
    /// `None` keeps everything.
    ///
    /// Default: 100
    pub history_limit: Option<usize>,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            history_limit: Some(100),
        }
    }
}

/// Page sizes applied when a caller does not ask for one.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    /// Default: 20
    pub default_page_size: u32,

    /// Requests above this are rejected. Never more than
    /// [`Pagination::MAX_PAGE_SIZE`].
    ///
    /// Default: 100
    pub max_page_size: u32,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page_size: Pagination::DEFAULT_PAGE_SIZE,
            max_page_size: Pagination::MAX_PAGE_SIZE,
        }
    }
}

impl PaginationConfig {
    /// Build a page request, using the default size when none is given.
    pub fn request(&self, page: u32, page_size: Option<u32>) -> Result<Pagination> {
        let max = self.max_page_size.min(Pagination::MAX_PAGE_SIZE);
        let size = page_size.unwrap_or_else(|| self.default_page_size.min(max));
        if size > max {
            return Err(Error::validation(FieldError::OutOfRange {
                field: "page_size",
                value: size.to_string(),
                constraint: format!("1..={max}"),
            }));
        }
        Pagination::new(page, size)
    }
}
