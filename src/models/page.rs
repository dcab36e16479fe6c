use serde::{Deserialize, Serialize};

/// One page of an ordered listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based page number actually served (clamped into range).
    pub page: u32,
    pub total_pages: u32,
    pub total_count: u64,
}

impl<T> Page<T> {
    /// Builds the page envelope for a fixed page size. An out-of-range
    /// request clamps to the nearest valid page; an empty listing serves
    /// page 1 of 1 with no items.
    pub fn envelope(total_count: u64, requested: u32, page_size: u32) -> (Self, u32) {
        let total_pages = ((total_count + page_size as u64 - 1) / page_size as u64).max(1) as u32;
        let page = requested.clamp(1, total_pages);
        (
            Self {
                items: Vec::new(),
                page,
                total_pages,
                total_count,
            },
            (page - 1) * page_size,
        )
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }
}
