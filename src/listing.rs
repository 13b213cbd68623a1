//! Vacation-rental listing pages
//!
//! Rental listings are only reachable through the site's paged list pages.
//! [`ListPager`] builds the URLs of the pages after the first one; the
//! helpers read ids out of site URLs.

use crate::error::Result;
use crate::template::{render, TemplateContext};
use crate::types::LocationId;
use regex::Regex;
use std::sync::LazyLock;

/// Listings per list page
pub const LIST_PAGE_STRIDE: u64 = 50;

const FIRST_PAGE_TEMPLATE: &str = "{{ site }}/VacationRentals-g{{ geo }}.html";
const PAGE_TEMPLATE: &str = "{{ site }}/VacationRentals-g{{ geo }}-oa{{ offset }}.html";

static GEO_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-g(\d+)").unwrap());
static DETAIL_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-d(\d+)-").unwrap());

/// Builds rental list page URLs for a geo
#[derive(Debug, Clone)]
pub struct ListPager {
    site_base: String,
}

impl ListPager {
    pub fn new(site_base: &str) -> Self {
        Self {
            site_base: site_base.trim_end_matches('/').to_string(),
        }
    }

    /// URL of the first list page
    pub fn first_page(&self, location_id: LocationId) -> Result<String> {
        let ctx = TemplateContext::new()
            .with_var("site", self.site_base.as_str())
            .with_var("geo", location_id);
        render(FIRST_PAGE_TEMPLATE, &ctx)
    }

    /// URLs of pages 2..=`total_page_count`, given the page count shown on
    /// the first page
    pub fn discover_pages(&self, location_id: LocationId, total_page_count: u32) -> Result<Vec<String>> {
        (1..u64::from(total_page_count))
            .map(|page| {
                let ctx = TemplateContext::new()
                    .with_var("site", self.site_base.as_str())
                    .with_var("geo", location_id)
                    .with_var("offset", page * LIST_PAGE_STRIDE);
                render(PAGE_TEMPLATE, &ctx)
            })
            .collect()
    }
}

/// Geo id from a list page URL (`-g<digits>`)
pub fn geo_id(url: &str) -> Option<LocationId> {
    GEO_ID.captures(url).and_then(|c| c[1].parse().ok())
}

/// Listing id from a detail page URL (`-d<digits>-`)
pub fn detail_id(url: &str) -> Option<LocationId> {
    DETAIL_ID.captures(url).and_then(|c| c[1].parse().ok())
}

/// Whether a URL points at a rental list page rather than a single listing
pub fn is_rental_list_url(url: &str) -> bool {
    url.contains("/VacationRentals-g")
}
