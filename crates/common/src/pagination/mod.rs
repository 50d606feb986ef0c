//! Page-number pagination for list endpoints

use crate::config::PaginationConfig;
use crate::errors::{AppError, Result};
use serde::Serialize;

/// A resolved `page` / `page_size` pair (pages are 1-based)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub page_size: u64,
}

impl PageRequest {
    /// Resolve from raw query-string pairs.
    ///
    /// A missing `page` means the first page; a `page` that is not a
    /// positive integer is an invalid page. `page_size` falls back to the
    /// configured default when absent or unusable, and is clamped to the
    /// configured maximum.
    pub fn from_pairs<'a, I>(pairs: I, config: &PaginationConfig) -> Result<Self>
    where
        I: IntoIterator<Item = &'a (String, String)>,
    {
        let mut page = 1;
        let mut page_size = config.default_page_size;

        for (key, value) in pairs {
            match key.as_str() {
                "page" => {
                    page = match value.trim().parse::<u64>() {
                        Ok(n) if n > 0 => n,
                        _ => return Err(AppError::InvalidPage),
                    };
                }
                "page_size" => {
                    page_size = match value.trim().parse::<u64>() {
                        Ok(n) if n > 0 => n.min(config.max_page_size),
                        _ => config.default_page_size,
                    };
                }
                _ => {}
            }
        }

        Ok(Self {
            page,
            page_size: page_size.max(1),
        })
    }

    /// Zero-based page index, as SeaORM paginators expect
    pub fn index(&self) -> u64 {
        self.page - 1
    }

    /// Number of pages for `count` items; an empty collection still has one
    pub fn num_pages(&self, count: u64) -> u64 {
        count.div_ceil(self.page_size).max(1)
    }

    /// Fail with `InvalidPage` when this page lies past the end
    pub fn ensure_within(&self, count: u64) -> Result<()> {
        if self.page > self.num_pages(count) {
            return Err(AppError::InvalidPage);
        }
        Ok(())
    }
}

/// Paginated response envelope
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub count: u64,
    pub page: u64,
    pub page_size: u64,
    pub next: Option<u64>,
    pub previous: Option<u64>,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    pub fn new(results: Vec<T>, count: u64, request: PageRequest) -> Self {
        let next = (request.page < request.num_pages(count)).then(|| request.page + 1);
        let previous = (request.page > 1).then(|| request.page - 1);

        Self {
            count,
            page: request.page,
            page_size: request.page_size,
            next,
            previous,
            results,
        }
    }

    /// Convert the results while keeping the page metadata
    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            count: self.count,
            page: self.page,
            page_size: self.page_size,
            next: self.next,
            previous: self.previous,
            results: self.results.into_iter().map(f).collect(),
        }
    }
}
