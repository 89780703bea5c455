//! This modules defines the common functionality for paging lists of resources.

use serde::Serialize;

/// The config for pagination
#[derive(Debug, Clone)]
pub struct PaginationConfig {
    /// The maximum number of items to return when the request does not specify a limit.
    ///
    /// A negative value means no limit.
    pub default_limit: i64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self { default_limit: 50 }
    }
}

/// The window of a list query after applying defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    /// How many items to skip.
    pub offset: u64,
    /// The maximum number of items to return, `None` for all of them.
    pub limit: Option<u64>,
}

impl Page {
    /// Resolve the `offset` and `limit` query parameters of a request.
    ///
    /// A missing limit falls back to the configured default, a negative limit disables the limit.
    pub fn new(offset: Option<u64>, limit: Option<i64>, config: &PaginationConfig) -> Self {
        let limit = limit.unwrap_or(config.default_limit);

        Self {
            // SQLite integers are signed 64 bit.
            offset: offset.unwrap_or(0).min(i64::MAX as u64),
            limit: u64::try_from(limit).ok(),
        }
    }

    /// A page containing every item.
    #[cfg(test)]
    pub fn all() -> Self {
        Self {
            offset: 0,
            limit: None,
        }
    }

    /// The SQL `LIMIT ... OFFSET ...` clause for this page.
    pub fn sql_clause(&self) -> String {
        // SQLite requires a LIMIT for OFFSET to be valid, -1 means no limit.
        let limit = self.limit.map_or(-1, |limit| limit as i64);
        format!(" LIMIT {limit} OFFSET {}", self.offset)
    }
}

/// The pagination metadata returned with every list response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pagination {
    /// The number of items in this response.
    pub count: u64,
    /// The number of items matching the filter across all pages.
    pub total: u64,
    /// The offset that was applied.
    pub offset: u64,
    /// The limit that was applied, -1 when unlimited.
    pub limit: i64,
}

impl Pagination {
    pub fn new(page: Page, count: usize, total: u64) -> Self {
        Self {
            count: count as u64,
            total,
            offset: page.offset,
            limit: page.limit.map_or(-1, |limit| limit as i64),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Page, PaginationConfig, Pagination};

    #[test]
    fn uses_configured_default_limit() {
        let config = PaginationConfig { default_limit: 20 };

        let page = Page::new(None, None, &config);

        assert_eq!(
            page,
            Page {
                offset: 0,
                limit: Some(20)
            }
        );
        assert_eq!(page.sql_clause(), " LIMIT 20 OFFSET 0");
    }

    #[test]
    fn negative_limit_means_unlimited() {
        let page = Page::new(Some(5), Some(-1), &PaginationConfig::default());

        assert_eq!(page.limit, None);
        assert_eq!(page.sql_clause(), " LIMIT -1 OFFSET 5");
        assert_eq!(Pagination::new(page, 3, 8).limit, -1);
    }

    #[test]
    fn offset_is_clamped_to_sqlite_integer_range() {
        let page = Page::new(Some(u64::MAX), None, &PaginationConfig::default());

        assert_eq!(page.offset, i64::MAX as u64);
        assert_eq!(page.sql_clause(), format!(" LIMIT 50 OFFSET {}", i64::MAX));
    }

    #[test]
    fn explicit_limit_overrides_default() {
        let page = Page::new(Some(10), Some(3), &PaginationConfig::default());

        assert_eq!(
            Pagination::new(page, 3, 42),
            Pagination {
                count: 3,
                total: 42,
                offset: 10,
                limit: 3
            }
        );
    }
}
