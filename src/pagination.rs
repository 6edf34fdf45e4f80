//! Page requests and results for list queries.

use serde::{Deserialize, Serialize};

use crate::error::{Error, FieldError, Result};

/// A validated page request. Pages are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawPagination")]
pub struct Pagination {
    page: u32,
    page_size: u32,
}

impl Pagination {
    pub const DEFAULT_PAGE_SIZE: u32 = 20;
    pub const MAX_PAGE_SIZE: u32 = 100;

    pub fn new(page: u32, page_size: u32) -> Result<Self> {
        if page == 0 {
            return Err(Error::validation(FieldError::OutOfRange {
                field: "page",
                value: page.to_string(),
                constraint: ">= 1".to_owned(),
            }));
        }
        if page_size == 0 || page_size > Self::MAX_PAGE_SIZE {
            return Err(Error::validation(FieldError::OutOfRange {
                field: "page_size",
                value: page_size.to_string(),
                constraint: format!("1..={}", Self::MAX_PAGE_SIZE),
            }));
        }
        Ok(Self { page, page_size })
    }

    /// The first page with the default size.
    pub fn first() -> Self {
        Self {
            page: 1,
            page_size: Self::DEFAULT_PAGE_SIZE,
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Number of items to skip.
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.page_size)
    }

    #[must_use]
    pub fn next(&self) -> Self {
        Self {
            page: self.page.saturating_add(1),
            ..*self
        }
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::first()
    }
}

#[derive(Deserialize)]
struct RawPagination {
    page: u32,
    page_size: u32,
}

impl TryFrom<RawPagination> for Pagination {
    type Error = Error;

    fn try_from(raw: RawPagination) -> Result<Self> {
        Self::new(raw.page, raw.page_size)
    }
}

/// One page of results plus the numbers needed to render pagination controls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub page_size: u32,
    pub total_count: u64,
    pub total_pages: u64,
    pub has_previous: bool,
    pub has_next: bool,
}

impl<T> Page<T> {
    /// Wrap an already-sliced page of `items` out of `total_count`.
    pub fn new(items: Vec<T>, pagination: Pagination, total_count: u64) -> Self {
        let total_pages = total_count.div_ceil(u64::from(pagination.page_size));
        let page = u64::from(pagination.page);

        Self {
            items,
            page: pagination.page,
            page_size: pagination.page_size,
            total_count,
            total_pages,
            has_previous: pagination.page > 1,
            has_next: page < total_pages,
        }
    }

    /// Slice the requested page out of a complete, already-ordered result.
    pub fn paginate(all: Vec<T>, pagination: Pagination) -> Self {
        let total_count = all.len() as u64;
        let offset = usize::try_from(pagination.offset()).unwrap_or(usize::MAX);
        let items = all
            .into_iter()
            .skip(offset)
            .take(pagination.page_size as usize)
            .collect();
        Self::new(items, pagination, total_count)
    }

    pub fn empty(pagination: Pagination) -> Self {
        Self::new(Vec::new(), pagination, 0)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            page_size: self.page_size,
            total_count: self.total_count,
            total_pages: self.total_pages,
            has_previous: self.has_previous,
            has_next: self.has_next,
        }
    }
}
