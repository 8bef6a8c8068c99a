use serde::{Deserialize, Serialize};

const DEFAULT_PAGE_SIZE: u32 = 20;
const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Serialize, Clone)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub pagination: PaginationInfo,
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct PaginationInfo {
    pub current_page: u32, // (1-based)
    pub total_pages: u32,
    pub total_items: u64,
    pub page_size: u32,
    pub has_next_page: bool,
    pub has_previous_page: bool,
}

impl PaginationInfo {
    pub fn new(page: Page, total_items: u64) -> Self {
        let total_pages = total_items.div_ceil(page.size as u64) as u32;
        Self {
            current_page: page.number,
            total_pages,
            total_items,
            page_size: page.size,
            has_next_page: page.number < total_pages,
            has_previous_page: page.number > 1,
        }
    }
}

/// A resolved page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub number: u32,
    pub size: u32,
}

impl Page {
    /// Missing or zero values fall back to page 1 of 20; size is capped at 100.
    pub fn resolve(page: Option<u32>, page_size: Option<u32>) -> Self {
        Self {
            number: page.filter(|p| *p > 0).unwrap_or(1),
            size: page_size
                .filter(|s| *s > 0)
                .unwrap_or(DEFAULT_PAGE_SIZE)
                .min(MAX_PAGE_SIZE),
        }
    }

    pub fn offset(&self) -> u64 {
        (self.number as u64 - 1) * self.size as u64
    }
}

#[derive(Debug, Default, Deserialize, Clone)]
pub struct PaginationQuery {
    pub page: Option<u32>, // 1-based
    pub page_size: Option<u32>,
}
