//! Listing, pagination and statistics types

use serde::{Deserialize, Serialize};

/// Default page number (1-indexed).
pub const DEFAULT_PAGE: u32 = 1;
/// Default number of items per page.
pub const DEFAULT_PAGE_SIZE: u32 = 50;
/// Upper bound for `page_size`.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Pagination parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationParams {
    /// Page number (1-indexed).
    pub page: u32,
    /// Number of items per page.
    pub page_size: u32,
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PaginationParams {
    /// Clamp pagination values to valid ranges.
    ///
    /// - `page` is clamped to `>= 1`
    /// - `page_size` is clamped to `1..=MAX_PAGE_SIZE`
    #[must_use]
    pub fn validated(&self) -> Self {
        Self {
            page: self.page.max(1),
            page_size: self.page_size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// Row offset for this page.
    #[must_use]
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.page_size)
    }
}

/// Validated list request handed to a repository.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    /// Case-insensitive substring matched against service or username.
    pub search: Option<String>,
    pub pagination: PaginationParams,
}

impl ListQuery {
    #[must_use]
    pub fn page(page: u32, page_size: u32) -> Self {
        Self {
            search: None,
            pagination: PaginationParams { page, page_size },
        }
    }

    #[must_use]
    pub fn with_search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }
}

/// A paginated response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedResponse<T> {
    /// Items in the current page.
    pub items: Vec<T>,
    /// Total number of matching items across all pages.
    pub total: u64,
    /// Current page number.
    pub page: u32,
    /// Page size used for this request.
    pub page_size: u32,
    /// Whether there are more pages after this one.
    pub has_more: bool,
}

impl<T> PaginatedResponse<T> {
    /// Create a new paginated response, automatically computing [`has_more`](Self::has_more).
    pub fn new(items: Vec<T>, pagination: PaginationParams, total: u64) -> Self {
        let has_more = pagination.offset() + (items.len() as u64) < total;
        Self {
            items,
            total,
            page: pagination.page,
            page_size: pagination.page_size,
            has_more,
        }
    }
}

/// Number of records stored for one service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ServiceCount {
    pub service: String,
    pub count: u64,
}

/// Aggregate numbers over the whole store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CredentialStats {
    pub total: u64,
    /// Records created within the last `window_days` days.
    pub recent_count: u64,
    pub window_days: u32,
    /// Ordered by count desc, then service asc.
    pub per_service: Vec<ServiceCount>,
}

/// Sort a per-service breakdown into its canonical order.
pub fn sort_service_counts(counts: &mut [ServiceCount]) {
    counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.service.cmp(&b.service)));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validated_clamps_out_of_range_values() {
        let params = PaginationParams {
            page: 0,
            page_size: 500,
        }
        .validated();
        assert_eq!(params.page, 1);
        assert_eq!(params.page_size, MAX_PAGE_SIZE);

        let params = PaginationParams {
            page: 3,
            page_size: 0,
        }
        .validated();
        assert_eq!(params.page, 3);
        assert_eq!(params.page_size, 1);
    }

    #[test]
    fn offset_is_zero_based() {
        assert_eq!(ListQuery::page(1, 2).pagination.offset(), 0);
        assert_eq!(ListQuery::page(3, 2).pagination.offset(), 4);
    }

    #[test]
    fn has_more_accounts_for_partial_last_page() {
        let last = PaginatedResponse::new(vec![5], PaginationParams { page: 3, page_size: 2 }, 5);
        assert!(!last.has_more);

        let middle =
            PaginatedResponse::new(vec![3, 4], PaginationParams { page: 2, page_size: 2 }, 5);
        assert!(middle.has_more);
    }

    #[test]
    fn service_counts_sort_by_count_then_name() {
        let mut counts = vec![
            ServiceCount { service: "b".into(), count: 1 },
            ServiceCount { service: "a".into(), count: 1 },
            ServiceCount { service: "c".into(), count: 4 },
        ];
        sort_service_counts(&mut counts);
        let order: Vec<_> = counts.iter().map(|c| c.service.as_str()).collect();
        assert_eq!(order, ["c", "a", "b"]);
    }
}
