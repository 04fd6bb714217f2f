//! One bounded slice of an ordered result set plus its position metadata.

use serde::Serialize;

/// A page of results as reported by the repository gateway.
///
/// `total` is the match count across all pages *as known at filter time*.
/// Under a geo post-filter the item list shrinks while `total`,
/// `current_page` and `per_page` keep the gateway's values; see
/// [`crate::geo::GeoFilter`] for why.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub current_page: u32,
    pub per_page: u32,
    pub total: u64,
}

impl<T> Page<T> {
    /// Index of the final page. An empty result set still has one page.
    #[must_use]
    pub fn last_page(&self) -> u64 {
        if self.total == 0 {
            return 1;
        }
        self.total.div_ceil(u64::from(self.per_page.max(1)))
    }

    /// 1-based position of the first item on this page, `None` when empty.
    #[must_use]
    pub fn from_index(&self) -> Option<u64> {
        if self.items.is_empty() {
            return None;
        }
        Some(u64::from(self.current_page - 1) * u64::from(self.per_page) + 1)
    }

    /// 1-based position of the last item on this page, `None` when empty.
    #[must_use]
    pub fn to_index(&self) -> Option<u64> {
        self.from_index().map(|from| from + self.items.len() as u64 - 1)
    }
}
