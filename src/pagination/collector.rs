//! Page loops
//!
//! [`ReviewCollector`] walks a newest-first review source and stops at the
//! cutoff date. [`PageAccumulator`] walks sources with no date order until
//! the upstream reports no more pages.

use super::boundary::BoundaryScanner;
use super::types::{PagedFetcher, PaginationCursor, ReviewSource};
use crate::error::Result;
use crate::http::Session;
use crate::record::Review;
use crate::types::LocationId;
use chrono::NaiveDate;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Incremental review collection for one entity
#[derive(Debug, Clone)]
pub struct ReviewCollector {
    page_delay: Duration,
}

impl ReviewCollector {
    pub fn new(page_delay: Duration) -> Self {
        Self { page_delay }
    }

    /// Collect reviews newer than `cutoff`.
    ///
    /// A failed first page is returned as an error. A failed later page ends
    /// the loop and the reviews gathered so far are returned.
    pub async fn collect(
        &self,
        location_id: LocationId,
        source: &dyn ReviewSource,
        session: &Session,
        cutoff: Option<NaiveDate>,
    ) -> Result<Vec<Review>> {
        let scanner = BoundaryScanner::new(source.date_field(), cutoff);
        let mut cursor = PaginationCursor::first(source.page_size());

        let first = source.fetch(location_id, cursor, session).await?;
        let total_count = first.total_count;
        let mut reviews = Vec::with_capacity(first.len());

        let crossed = append_until_boundary(
            source,
            &scanner,
            location_id,
            cursor,
            &first.items,
            &mut reviews,
        );
        if crossed || !first.has_next {
            return Ok(cap(reviews, total_count));
        }

        let remaining = PaginationCursor::remaining_pages(total_count, cursor.limit);
        info!(
            source = source.name(),
            location_id, total_count, remaining, "Collecting reviews"
        );

        for _ in 0..remaining {
            tokio::time::sleep(self.page_delay).await;
            cursor.advance();

            let page = match source.fetch(location_id, cursor, session).await {
                Ok(page) => page,
                Err(e) => {
                    warn!(
                        source = source.name(),
                        location_id,
                        offset = cursor.offset,
                        collected = reviews.len(),
                        "Stopping review collection early: {e}"
                    );
                    break;
                }
            };

            if page.is_empty() {
                debug!(source = source.name(), location_id, offset = cursor.offset, "Empty page");
                break;
            }

            if append_until_boundary(
                source,
                &scanner,
                location_id,
                cursor,
                &page.items,
                &mut reviews,
            ) {
                debug!(source = source.name(), location_id, offset = cursor.offset, "Reached cutoff");
                break;
            }
        }

        Ok(cap(reviews, total_count))
    }
}

/// Append a page's reviews up to the boundary; true when the boundary was hit
fn append_until_boundary(
    source: &dyn ReviewSource,
    scanner: &BoundaryScanner,
    location_id: LocationId,
    cursor: PaginationCursor,
    items: &[Value],
    reviews: &mut Vec<Review>,
) -> bool {
    if !scanner.is_newest_first(items) {
        warn!(
            source = source.name(),
            location_id,
            offset = cursor.offset,
            "Page is not ordered newest-first, cutoff may be inexact"
        );
    }

    let boundary = scanner.scan(items);
    let keep = boundary.unwrap_or(items.len());
    reviews.extend(items[..keep].iter().map(|raw| source.to_review(raw)));

    boundary.is_some()
}

fn cap(mut reviews: Vec<Review>, total_count: u64) -> Vec<Review> {
    let limit = usize::try_from(total_count).unwrap_or(usize::MAX);
    reviews.truncate(limit);
    reviews
}

/// Accumulates every page of a source that has no date order
#[derive(Debug, Clone)]
pub struct PageAccumulator {
    page_delay: Duration,
    max_pages: u32,
}

impl PageAccumulator {
    pub fn new(page_delay: Duration, max_pages: u32) -> Self {
        Self {
            page_delay,
            max_pages: max_pages.max(1),
        }
    }

    /// Fetch pages until the upstream reports none left.
    ///
    /// A failed first page is returned as an error; a failed later page ends
    /// the loop with what was gathered.
    pub async fn accumulate<F>(
        &self,
        location_id: LocationId,
        fetcher: &F,
        session: &Session,
    ) -> Result<Vec<Value>>
    where
        F: PagedFetcher + ?Sized,
    {
        let mut cursor = PaginationCursor::first(fetcher.page_size());
        let mut page = fetcher.fetch(location_id, cursor, session).await?;
        let mut items = Vec::new();
        let mut pages = 1;

        loop {
            let has_next = page.has_next && !page.is_empty();
            items.append(&mut page.items);

            if !has_next {
                break;
            }
            if pages >= self.max_pages {
                warn!(source = fetcher.name(), location_id, pages, "Page limit reached");
                break;
            }

            tokio::time::sleep(self.page_delay).await;
            cursor.advance();
            page = match fetcher.fetch(location_id, cursor, session).await {
                Ok(page) => page,
                Err(e) => {
                    warn!(
                        source = fetcher.name(),
                        location_id,
                        offset = cursor.offset,
                        "Stopping early: {e}"
                    );
                    break;
                }
            };
            pages += 1;
        }

        Ok(items)
    }
}
