use serde::Serialize;

use crate::error::{LibraryError, LibraryResult};

/// A validated zero-based page index and page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageRequest {
    page: usize,
    size: usize,
}

impl PageRequest {
    pub const DEFAULT_SIZE: i64 = 20;

    /// Validate raw paging input; negative values and a zero size are rejected.
    pub fn new(page: i64, size: i64) -> LibraryResult<Self> {
        if page < 0 {
            return Err(LibraryError::InvalidPage(format!(
                "page index must not be negative, got {page}"
            )));
        }
        if size <= 0 {
            return Err(LibraryError::InvalidPage(format!(
                "page size must be positive, got {size}"
            )));
        }
        let invalid = |_| LibraryError::InvalidPage("page parameters out of range".to_string());
        Ok(Self {
            page: usize::try_from(page).map_err(invalid)?,
            size: usize::try_from(size).map_err(invalid)?,
        })
    }

    /// Paging from optional query parameters, defaulting to the first page of 20.
    pub fn from_query(page: Option<i64>, size: Option<i64>) -> LibraryResult<Self> {
        Self::new(page.unwrap_or(0), size.unwrap_or(Self::DEFAULT_SIZE))
    }

    /// First page with the given size.
    pub fn first(size: i64) -> LibraryResult<Self> {
        Self::new(0, size)
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of elements preceding this page.
    pub fn offset(&self) -> usize {
        self.page.saturating_mul(self.size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 0,
            size: Self::DEFAULT_SIZE as usize,
        }
    }
}

/// One page of results with the echoed paging parameters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub content: Vec<T>,
    pub total_elements: usize,
    pub total_pages: usize,
    pub page: usize,
    pub size: usize,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, total_elements: usize, request: PageRequest) -> Self {
        Self {
            content,
            total_elements,
            total_pages: total_elements.div_ceil(request.size()),
            page: request.page(),
            size: request.size(),
        }
    }

    /// Slice an already materialized, ordered collection.
    pub fn from_vec(all: Vec<T>, request: PageRequest) -> Self {
        let total = all.len();
        let content = all
            .into_iter()
            .skip(request.offset())
            .take(request.size())
            .collect();
        Self::new(content, total, request)
    }

    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            content: self.content.into_iter().map(f).collect(),
            total_elements: self.total_elements,
            total_pages: self.total_pages,
            page: self.page,
            size: self.size,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}
