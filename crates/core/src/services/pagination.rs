//! Page/limit pagination.

/// Upper bound on page size.
pub const MAX_LIMIT: u64 = 100;

/// Default page size for follower and following lists.
pub const DEFAULT_LIST_LIMIT: u64 = 3;

/// Default page size for the user directory.
pub const DEFAULT_DIRECTORY_LIMIT: u64 = 6;

/// Largest offset the database driver binds as a signed 64-bit integer.
pub const MAX_OFFSET: u64 = i64::MAX as u64;

/// A 1-based page of a listing.
///
/// No total count is ever computed; a short page is the only end marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u64,
    pub limit: u64,
}

impl Pagination {
    /// Build a page, clamping `page` to at least 1 and `limit` to `1..=MAX_LIMIT`.
    #[must_use]
    pub fn new(page: u64, limit: u64) -> Self {
        Self {
            page: page.max(1),
            limit: limit.clamp(1, MAX_LIMIT),
        }
    }

    /// Build a page from raw query parameters.
    ///
    /// Missing, non-numeric and non-positive values fall back to page 1 and
    /// `default_limit`.
    #[must_use]
    pub fn from_params(page: Option<&str>, limit: Option<&str>, default_limit: u64) -> Self {
        Self::new(
            parse_positive(page).unwrap_or(1),
            parse_positive(limit).unwrap_or(default_limit),
        )
    }

    /// Rows to skip, never more than `MAX_OFFSET`.
    ///
    /// A page past the end of any table simply comes back empty.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        match (self.page - 1).checked_mul(self.limit) {
            Some(offset) if offset <= MAX_OFFSET => offset,
            _ => MAX_OFFSET,
        }
    }
}

fn parse_positive(value: Option<&str>) -> Option<u64> {
    value
        .and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|n| *n >= 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_absent() {
        let page = Pagination::from_params(None, None, 3);
        assert_eq!(page, Pagination { page: 1, limit: 3 });
        assert_eq!(page.offset(), 0);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let page = Pagination::from_params(Some("abc"), Some("-4"), 6);
        assert_eq!(page, Pagination { page: 1, limit: 6 });

        let page = Pagination::from_params(Some("0"), Some("0"), 6);
        assert_eq!(page, Pagination { page: 1, limit: 6 });
    }

    #[test]
    fn test_offset() {
        let page = Pagination::from_params(Some("2"), Some("3"), 10);
        assert_eq!(page.offset(), 3);
    }

    #[test]
    fn test_huge_page_offset_fits_signed_range() {
        let page = Pagination::from_params(Some("100000000000000000"), Some("100"), 3);
        assert_eq!(page.offset(), MAX_OFFSET);
        assert!(i64::try_from(page.offset()).is_ok());

        let page = Pagination::new(u64::MAX, MAX_LIMIT);
        assert_eq!(page.offset(), MAX_OFFSET);

        let page = Pagination::new(MAX_OFFSET / 2 + 1, 2);
        assert_eq!(page.offset(), MAX_OFFSET - 1);
    }

    #[test]
    fn test_limit_is_clamped() {
        let page = Pagination::from_params(Some("1"), Some("5000"), 3);
        assert_eq!(page.limit, MAX_LIMIT);
    }
}
