//! Pagination types and traits
//!
//! Defines the page shape, the cursor and the fetcher seam shared by every
//! paged source.

use crate::error::Result;
use crate::http::Session;
use crate::record::Review;
use crate::types::LocationId;
use async_trait::async_trait;
use serde_json::Value;

/// Items of one fetch plus paging metadata
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    /// Items in upstream order (newest-first for review sources)
    pub items: Vec<T>,
    /// Total number of items the upstream reports for the whole sequence
    pub total_count: u64,
    /// Whether the upstream reports a further page
    pub has_next: bool,
}

impl<T> Page<T> {
    /// Create a page
    pub fn new(items: Vec<T>, total_count: u64, has_next: bool) -> Self {
        Self {
            items,
            total_count,
            has_next,
        }
    }

    /// A page with no items and nothing after it
    pub fn empty() -> Self {
        Self::new(Vec::new(), 0, false)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Offset/limit position within a paged sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationCursor {
    pub offset: u64,
    pub limit: u32,
}

impl PaginationCursor {
    /// Cursor at the start of the sequence
    pub fn first(limit: u32) -> Self {
        Self { offset: 0, limit }
    }

    /// Move to the next page
    pub fn advance(&mut self) {
        self.offset += u64::from(self.limit);
    }

    /// Number of pages still to fetch after the first one, given the total
    /// count reported by the first page
    pub fn remaining_pages(total_count: u64, limit: u32) -> u64 {
        let limit = u64::from(limit.max(1));
        total_count.saturating_sub(limit).div_ceil(limit)
    }
}

/// One HTTP call returning a page of raw items
#[async_trait]
pub trait PagedFetcher: Send + Sync {
    /// Source name used in logs
    fn name(&self) -> &str;

    /// Page size used by this source
    fn page_size(&self) -> u32;

    /// Fetch the page at `cursor` for a location
    async fn fetch(
        &self,
        location_id: LocationId,
        cursor: PaginationCursor,
        session: &Session,
    ) -> Result<Page<Value>>;
}

/// A paged source of reviews ordered newest-first
pub trait ReviewSource: PagedFetcher {
    /// Field carrying the publication date on raw items
    fn date_field(&self) -> &str;

    /// Normalize a raw item
    fn to_review(&self, raw: &Value) -> Review;
}
