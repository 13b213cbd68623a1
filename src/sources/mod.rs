//! Upstream sources
//!
//! Every paged endpoint the scraper talks to, each behind
//! [`PagedFetcher`](crate::pagination::PagedFetcher):
//!
//! - [`GraphQlReviewFetcher`]: hotel, restaurant and vacation-rental reviews
//! - [`AttractionReviewFetcher`]: attraction reviews from the REST API
//! - [`KeywordFetcher`]: review keyword frequencies
//! - [`LocationClient`]: location detail, search and per-type listings

mod graphql;
mod keywords;
mod locations;
mod reviews;

pub use graphql::GraphQlReviewFetcher;
pub use keywords::KeywordFetcher;
pub use locations::LocationClient;
pub use reviews::AttractionReviewFetcher;

use crate::error::Result;
use crate::pagination::{Page, PaginationCursor};
use crate::record::lenient_u64;
use crate::template::{render, TemplateContext};
use crate::types::LocationId;
use serde_json::Value;

/// Join the API base with a `{{ location_id }}` path template
pub(crate) fn api_url(api_base: &str, path: &str, location_id: LocationId) -> Result<String> {
    let ctx = TemplateContext::new().with_var("location_id", location_id);
    Ok(format!(
        "{}{}",
        api_base.trim_end_matches('/'),
        render(path, &ctx)?
    ))
}

/// Read a REST page: `data[]` items plus `paging.{total_results, next}`
pub(crate) fn parse_rest_page(body: &Value, cursor: PaginationCursor) -> Page<Value> {
    let items = body
        .get("data")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    let paging = body.get("paging");
    let total_count = paging
        .and_then(|p| p.get("total_results"))
        .and_then(lenient_u64)
        .unwrap_or(cursor.offset + items.len() as u64);
    let has_next = paging
        .and_then(|p| p.get("next"))
        .is_some_and(|next| match next {
            Value::Null | Value::Bool(false) => false,
            Value::String(s) => !s.is_empty(),
            _ => true,
        });

    Page::new(items, total_count, has_next)
}
