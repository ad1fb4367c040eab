/// Documents to skip for a 1-based `page` of `limit` items.
///
/// Page 0 counts as page 1. The result saturates at `i64::MAX`, the largest
/// skip the server accepts.
pub fn page_skip(page: u64, limit: u64) -> u64 {
    page.saturating_sub(1)
        .saturating_mul(limit)
        .min(i64::MAX as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_pages() {
        assert_eq!(page_skip(0, 10), 0);
        assert_eq!(page_skip(1, 10), 0);
        assert_eq!(page_skip(3, 10), 20);
    }

    #[test]
    fn test_huge_page_saturates() {
        assert_eq!(page_skip(u64::MAX, 100), i64::MAX as u64);
        assert_eq!(page_skip(u64::MAX / 2, 3), i64::MAX as u64);
    }
}
