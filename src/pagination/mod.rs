//! Pagination module
//!
//! # Overview
//!
//! Every paged upstream source implements [`PagedFetcher`]. Review sources
//! additionally implement [`ReviewSource`] and are driven by
//! [`ReviewCollector`], which stops at the first review older than the
//! cutoff date. Sources with no date order (keywords, location lists) are
//! drained with [`PageAccumulator`].

mod boundary;
mod collector;
mod types;

pub use boundary::{parse_date, scan, BoundaryScanner};
pub use collector::{PageAccumulator, ReviewCollector};
pub use types::{Page, PagedFetcher, PaginationCursor, ReviewSource};

#[cfg(test)]
mod tests;
