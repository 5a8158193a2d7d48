//! Pagination utilities.
//!
//! Admission listings are page-based: `page` is 1-indexed and `limit` is the
//! page size. Query parameters arrive through [`PaginationParams`], which
//! fills in defaults; [`PageRequest`] is the validated form the repository
//! accepts. Non-positive values are rejected rather than clamped so callers
//! learn about the mistake.
//!
//! # Example
//!
//! ```ignore
//! use admitdesk_core::pagination::{PageRequest, paginate};
//!
//! let request = PageRequest::new(2, 10)?;
//! let page = paginate(sorted_records, request);
//! assert_eq!(page.page, 2);
//! ```

use serde::{Deserialize, Deserializer, Serialize};

use crate::errors::RepoError;

/// Largest page size accepted from query parameters.
pub const MAX_LIMIT: i64 = 100;

/// Page size used when the caller does not specify one.
pub const DEFAULT_LIMIT: i64 = 10;

/// Deserializes an optional string into an optional i64.
///
/// Query parameters may arrive as empty strings, which are treated as `None`.
fn deserialize_optional_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        Some(s) if s.is_empty() => Ok(None),
        Some(s) => s.parse::<i64>().map(Some).map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

/// Query parameters for page-based listing.
///
/// Missing values default to page 1 and a limit of 10; limits above
/// [`MAX_LIMIT`] are capped. Zero or negative values pass through untouched
/// and are rejected by [`PageRequest::new`].
#[derive(Debug, Clone, Default, Hash, Deserialize)]
pub struct PaginationParams {
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub page: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub limit: Option<i64>,
}

impl PaginationParams {
    #[must_use]
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1)
    }

    #[must_use]
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT)
    }

    pub fn to_request(&self) -> Result<PageRequest, RepoError> {
        PageRequest::new(self.page(), self.limit())
    }
}

/// A validated, 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: usize,
    limit: usize,
}

impl PageRequest {
    /// Validates `page >= 1` and `limit >= 1`.
    pub fn new(page: i64, limit: i64) -> Result<Self, RepoError> {
        if page < 1 {
            return Err(RepoError::invalid(format!("page must be >= 1, got {page}")));
        }
        if limit < 1 {
            return Err(RepoError::invalid(format!("limit must be >= 1, got {limit}")));
        }
        let page = usize::try_from(page)
            .map_err(|_| RepoError::invalid(format!("page {page} is out of range")))?;
        let limit = usize::try_from(limit)
            .map_err(|_| RepoError::invalid(format!("limit {limit} is out of range")))?;

        Ok(Self { page, limit })
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Index of the first item on this page.
    pub fn offset(&self) -> usize {
        (self.page - 1).saturating_mul(self.limit)
    }

    /// `ceil(total / limit)`; zero when there are no items.
    pub fn total_pages(&self, total: usize) -> usize {
        total.div_ceil(self.limit)
    }
}

/// One page of results plus the totals needed to render a pager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub data: Vec<T>,
    pub total: usize,
    pub page: usize,
    pub limit: usize,
    pub total_pages: usize,
}

/// Slices an already-sorted collection into the requested page.
///
/// Pages past the end come back empty with the totals still filled in.
pub fn paginate<T>(items: Vec<T>, request: PageRequest) -> Page<T> {
    let total = items.len();
    let data = items
        .into_iter()
        .skip(request.offset())
        .take(request.limit())
        .collect();

    Page {
        data,
        total,
        page: request.page(),
        limit: request.limit(),
        total_pages: request.total_pages(total),
    }
}
