use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

pub const DEFAULT_PAGE_SIZE: u32 = 5;
pub const MAX_PAGE_SIZE: u32 = 10;
/// Pages shown on each side of the current one in the page-number control.
pub const WINDOW_RADIUS: usize = 5;

/// Raw `?page=&page_size=` query, parsed by the pagination rules below.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageParams {
    #[serde(default)]
    pub page: Option<String>,
    #[serde(default)]
    pub page_size: Option<String>,
}

impl PageParams {
    /// Unparseable, zero or negative sizes fall back to the default.
    pub fn page_size(&self) -> u32 {
        match self.page_size.as_deref().map(|s| s.trim().parse::<u32>()) {
            Some(Ok(n)) if n > 0 => n.min(MAX_PAGE_SIZE),
            _ => DEFAULT_PAGE_SIZE,
        }
    }

    /// Requested 1-based page number; `last` names the final page.
    /// `None` when the value is not a positive integer.
    pub fn number(&self, num_pages: i64) -> Option<u32> {
        let Some(raw) = self.page.as_deref().map(str::trim) else {
            return Some(1);
        };
        if raw == "last" {
            return u32::try_from(num_pages.max(1)).ok();
        }
        match raw.parse::<i64>() {
            Ok(n) if n >= 1 => u32::try_from(n).ok(),
            _ => None,
        }
    }

    /// Checks the requested page against the row count and returns
    /// `(limit, offset)` for the query.
    pub fn resolve(&self, count: i64) -> AppResult<(i64, i64)> {
        let size = self.page_size() as i64;
        let pages = num_pages(count, size);
        let page = self.number(pages).ok_or(AppError::NotFound("Page"))? as i64;
        // page 1 of an empty list is still a valid page
        if page > pages.max(1) {
            return Err(AppError::NotFound("Page"));
        }
        Ok((size, (page - 1) * size))
    }
}

pub fn num_pages(count: i64, page_size: i64) -> i64 {
    if count <= 0 || page_size <= 0 {
        0
    } else {
        (count + page_size - 1) / page_size
    }
}

/// 0-based page indices to render around `index`, clamped to `0..num_pages`.
pub fn page_window(index: usize, num_pages: usize) -> Range<usize> {
    let start = index.saturating_sub(WINDOW_RADIUS).min(num_pages);
    let end = index.saturating_add(WINDOW_RADIUS).min(num_pages);
    start..end
}

#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub results: Vec<T>,
    pub count: i64,
    pub page: u32,
    pub page_size: u32,
    pub num_pages: i64,
    pub has_next: bool,
    pub has_previous: bool,
    /// 1-based page numbers for the page-number control.
    pub page_range: Vec<usize>,
}

impl<T> Page<T> {
    pub fn new(results: Vec<T>, count: i64, params: &PageParams) -> Self {
        let page_size = params.page_size();
        let num_pages = num_pages(count, page_size as i64);
        let page = params.number(num_pages).unwrap_or(1);
        let index = page.saturating_sub(1) as usize;
        let page_range = page_window(index, num_pages as usize).map(|i| i + 1).collect();
        Self {
            results,
            count,
            page,
            page_size,
            num_pages,
            has_next: (page as i64) < num_pages,
            has_previous: page > 1,
            page_range,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            results: self.results.into_iter().map(f).collect(),
            count: self.count,
            page: self.page,
            page_size: self.page_size,
            num_pages: self.num_pages,
            has_next: self.has_next,
            has_previous: self.has_previous,
            page_range: self.page_range,
        }
    }
}
