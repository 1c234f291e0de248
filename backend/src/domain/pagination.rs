//! Page requests and result pages for list queries.

use std::collections::BTreeMap;

use serde::Serialize;

/// Page number used when the caller supplies none or an invalid one.
pub const DEFAULT_PAGE: u32 = 1;

/// Page size used when the caller supplies none or an invalid one.
pub const DEFAULT_LIMIT: u32 = 10;

/// Validated one-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    limit: u32,
}

impl PageRequest {
    /// Clamp raw caller input, replacing values below one with the defaults.
    ///
    /// # Examples
    /// ```
    /// use adoption_backend::domain::PageRequest;
    ///
    /// let request = PageRequest::clamped(Some(0), Some(-3));
    /// assert_eq!((request.page(), request.limit()), (1, 10));
    /// ```
    pub fn clamped(page: Option<i64>, limit: Option<i64>) -> Self {
        Self {
            page: clamp_or(page, DEFAULT_PAGE),
            limit: clamp_or(limit, DEFAULT_LIMIT),
        }
    }

    /// One-based page number.
    pub fn page(self) -> u32 {
        self.page
    }

    /// Maximum number of items per page.
    pub fn limit(self) -> u32 {
        self.limit
    }

    /// Number of items to skip before this page starts.
    pub fn offset(self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

fn clamp_or(value: Option<i64>, default: u32) -> u32 {
    value
        .filter(|raw| *raw >= 1)
        .and_then(|raw| u32::try_from(raw).ok())
        .unwrap_or(default)
}

/// Equality-only conjunction over top-level field names.
pub type FieldFilter = BTreeMap<String, String>;

/// Store-level list query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    /// Page window.
    pub page: PageRequest,
    /// Field equality constraints, all of which must hold.
    pub filter: FieldFilter,
}

impl ListQuery {
    /// Start a query for the given page with no filters.
    pub fn new(page: PageRequest) -> Self {
        Self {
            page,
            filter: FieldFilter::new(),
        }
    }

    /// Add an equality constraint.
    #[must_use]
    pub fn with_field(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.filter.insert(field.into(), value.into());
        self
    }
}

/// One page of results together with the total match count.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    /// Items on this page, newest first.
    pub items: Vec<T>,
    /// Total number of matches across all pages.
    pub total: u64,
    /// One-based page number served.
    pub page: u32,
    /// Page size served.
    pub limit: u32,
}

impl<T> Page<T> {
    /// Build a page for the given request.
    pub fn new(items: Vec<T>, total: u64, request: PageRequest) -> Self {
        Self {
            items,
            total,
            page: request.page(),
            limit: request.limit(),
        }
    }
}
