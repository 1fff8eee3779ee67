//! Pagination query parameters and paged response envelope.

use serde::{Deserialize, Serialize};

use super::validation::ValidationErrors;

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

/// `?page=&limit=` query parameters
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl Default for PageParams {
    fn default() -> Self {
        Self {
            page: Some(1),
            limit: Some(DEFAULT_PAGE_SIZE),
        }
    }
}

impl PageParams {
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1)
    }

    pub fn limit(&self) -> u32 {
        self.limit.unwrap_or(DEFAULT_PAGE_SIZE)
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page().saturating_sub(1)) * i64::from(self.limit())
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.page() == 0 {
            errors.add("page", "must be at least 1");
        }
        if self.limit() == 0 || self.limit() > MAX_PAGE_SIZE {
            errors.add(
                "limit",
                format!("must be between 1 and {}", MAX_PAGE_SIZE),
            );
        }
        errors.into_result()
    }
}

/// One page of results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub limit: u32,
    pub total: i64,
    pub total_pages: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, params: &PageParams, total: i64) -> Self {
        let limit = i64::from(params.limit().max(1));
        Self {
            items,
            page: params.page(),
            limit: params.limit(),
            total,
            total_pages: (total + limit - 1) / limit,
        }
    }
}
