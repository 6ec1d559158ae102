//! Offset pagination primitives shared by the feed and listing reads.

use std::fmt;

/// Largest permitted page size.
pub const MAX_PAGE_SIZE: u32 = 100;
/// Page size used when the caller does not specify one.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Validation errors returned by [`PageRequest::new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaginationError {
    PageOutOfRange,
    PageSizeOutOfRange { max: u32 },
}

impl fmt::Display for PaginationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PageOutOfRange => write!(f, "page must be at least 1"),
            Self::PageSizeOutOfRange { max } => {
                write!(f, "page size must be between 1 and {max}")
            }
        }
    }
}

impl std::error::Error for PaginationError {}

/// A validated page selector: `page >= 1`, `page_size` in `[1, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    page_size: u32,
}

impl PageRequest {
    /// Validate and construct a page request.
    pub fn new(page: u32, page_size: u32) -> Result<Self, PaginationError> {
        if page < 1 {
            return Err(PaginationError::PageOutOfRange);
        }
        if page_size < 1 || page_size > MAX_PAGE_SIZE {
            return Err(PaginationError::PageSizeOutOfRange {
                max: MAX_PAGE_SIZE,
            });
        }
        Ok(Self { page, page_size })
    }

    /// 1-based page number.
    pub fn page(&self) -> u32 {
        self.page
    }

    /// Number of records per page.
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Row offset for the backing store query.
    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.page_size)
    }

    /// Row limit for the backing store query.
    pub fn limit(&self) -> i64 {
        i64::from(self.page_size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}
